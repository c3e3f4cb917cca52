//! Applies a gateway transaction to its booking.

use crate::error::PaymentsError;
use crate::paystack::{Transaction, TransactionStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use wayfare_booking::{BookingRecord, BookingStatus, PaymentStatus};

/// What a settlement did to the booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Settlement {
    /// Payment recorded and the booking confirmed.
    Paid,
    /// The booking was paid before; nothing changed.
    AlreadyPaid,
    /// Payment recorded on a booking that was closed meanwhile; it stays closed.
    RefundDue,
    /// The attempt failed; the customer may start another one.
    Failed,
    /// The gateway has no final answer yet.
    Pending,
    /// A failed attempt on a closed booking, or on a superseded attempt; nothing changed.
    Ignored,
}

impl Settlement {
    /// Whether the booking was modified and must be saved.
    #[must_use]
    pub const fn changed(self) -> bool {
        matches!(self, Self::Paid | Self::RefundDue | Self::Failed)
    }
}

/// Settles `booking` with `transaction`.
///
/// Settling is idempotent: a paid booking never changes again. A successful charge from any
/// attempt issued for the booking settles it, provided it carries the booking's currency and at
/// least its fare. A failure only counts for the latest attempt; older attempts that fail are
/// ignored.
///
/// # Errors
/// Returns [`PaymentsError::Conflict`], leaving the booking untouched, if the transaction was
/// not issued for this booking or its amount or currency do not match.
pub fn settle(
    booking: &mut BookingRecord,
    transaction: &Transaction,
    now: DateTime<Utc>,
) -> Result<Settlement, PaymentsError> {
    if !booking.has_payment_attempt(&transaction.reference) {
        return Err(PaymentsError::conflict(format!(
            "Transaction '{}' does not belong to booking '{}'",
            transaction.reference, booking.reference
        )));
    }
    if booking.payment_status == PaymentStatus::Paid {
        return Ok(Settlement::AlreadyPaid);
    }

    match transaction.status {
        TransactionStatus::Success => {
            if !transaction.currency.eq_ignore_ascii_case(&booking.fare.currency) {
                return Err(PaymentsError::conflict(format!(
                    "Paid in {} but the fare is in {}",
                    transaction.currency, booking.fare.currency
                )));
            }
            if transaction.amount < booking.amount_kobo() {
                return Err(PaymentsError::conflict(format!(
                    "Paid {} kobo but the fare is {} kobo",
                    transaction.amount,
                    booking.amount_kobo()
                )));
            }

            booking.payment_reference = Some(transaction.reference.clone());
            booking.payment_status = PaymentStatus::Paid;
            booking.paid_at = Some(now);
            booking.updated_at = now;
            if booking.status.is_terminal() {
                return Ok(Settlement::RefundDue);
            }
            booking.status = BookingStatus::Confirmed;
            Ok(Settlement::Paid)
        },
        TransactionStatus::Failed | TransactionStatus::Abandoned | TransactionStatus::Reversed => {
            let superseded =
                booking.payment_reference.as_deref() != Some(transaction.reference.as_str());
            if booking.status.is_terminal() || superseded {
                return Ok(Settlement::Ignored);
            }
            booking.payment_status = PaymentStatus::Failed;
            booking.updated_at = now;
            Ok(Settlement::Failed)
        },
        TransactionStatus::Pending => Ok(Settlement::Pending),
    }
}
