use crate::error::BookingError;
use crate::fare::FareQuote;
use crate::policy::BookingPolicy;
use crate::vehicle::VehicleClass;
use crate::wizard::ConfirmedDraft;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use wayfare_derive::api_model;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Paid online through the payment gateway
    Card,
    BankTransfer,
    /// Paid to the driver
    Cash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    PendingPayment,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PendingPayment => "pending_payment",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    /// A gateway transaction was started
    Pending,
    Paid,
    Failed,
}

/// Who asked for a booking; copied from the caller's token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Customer {
    pub uid: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
}

/// A `booking` document, keyed by its reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub reference: String,
    pub owner_uid: String,
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub pickup: String,
    pub dropoff: String,
    pub distance_km: f64,
    pub vehicle_class: VehicleClass,
    pub passengers: u8,
    pub notes: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub pickup_at: DateTime<Utc>,
    pub pickup_local: String,
    pub fare: FareQuote,
    pub payment_method: PaymentMethod,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    /// Latest gateway attempt; the one a failed charge is reported against.
    pub payment_reference: Option<String>,
    /// Every attempt reference issued for this booking, oldest first.
    #[serde(default)]
    pub payment_attempts: Vec<String>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub cancelled_at: Option<DateTime<Utc>>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
    /// Bumped by every save; a write based on an older revision is rejected.
    #[serde(default)]
    pub revision: u64,
}

impl BookingRecord {
    /// Builds the booking for a completed wizard.
    ///
    /// Card bookings wait for payment; bank transfer and cash bookings are confirmed right away
    /// and settled outside the gateway.
    #[must_use]
    pub fn from_draft(
        reference: String,
        draft: ConfirmedDraft,
        customer: Customer,
        now: DateTime<Utc>,
    ) -> Self {
        let status = match draft.payment_method {
            PaymentMethod::Card => BookingStatus::PendingPayment,
            PaymentMethod::BankTransfer | PaymentMethod::Cash => BookingStatus::Confirmed,
        };

        Self {
            reference,
            owner_uid: draft.owner,
            customer_email: customer.email,
            customer_name: customer.name,
            customer_phone: customer.phone,
            pickup: draft.route.pickup,
            dropoff: draft.route.dropoff,
            distance_km: draft.route.distance_km,
            vehicle_class: draft.route.vehicle_class,
            passengers: draft.schedule.passengers,
            notes: draft.schedule.notes,
            pickup_at: draft.schedule.pickup_at,
            pickup_local: draft.schedule.pickup_local,
            fare: draft.quote,
            payment_method: draft.payment_method,
            status,
            payment_status: PaymentStatus::Unpaid,
            payment_reference: None,
            payment_attempts: Vec::new(),
            paid_at: None,
            cancelled_at: None,
            created_at: now,
            updated_at: now,
            revision: 0,
        }
    }

    #[must_use]
    pub const fn amount_kobo(&self) -> u64 {
        self.fare.total_kobo
    }

    /// Records a new gateway attempt; earlier attempts stay payable.
    pub fn start_payment_attempt(&mut self, reference: String, now: DateTime<Utc>) {
        self.payment_attempts.push(reference.clone());
        self.payment_reference = Some(reference);
        self.payment_status = PaymentStatus::Pending;
        self.updated_at = now;
    }

    /// Whether `reference` was issued for this booking by [`start_payment_attempt`](Self::start_payment_attempt).
    #[must_use]
    pub fn has_payment_attempt(&self, reference: &str) -> bool {
        self.payment_attempts.iter().any(|attempt| attempt == reference)
            || self.payment_reference.as_deref() == Some(reference)
    }

    /// Customer cancellation: only open bookings, and only before the cut-off.
    ///
    /// # Errors
    /// Returns [`BookingError::Conflict`] otherwise.
    pub fn cancel_by_customer(
        &mut self,
        policy: &BookingPolicy,
        now: DateTime<Utc>,
    ) -> Result<(), BookingError> {
        if !matches!(self.status, BookingStatus::PendingPayment | BookingStatus::Confirmed) {
            return Err(BookingError::conflict(format!(
                "A {} booking cannot be cancelled",
                self.status.as_str()
            )));
        }
        if !policy.customer_can_cancel(self.pickup_at, now) {
            return Err(BookingError::conflict(format!(
                "Bookings can only be cancelled up to {} minutes before pickup",
                policy.cancellation_cutoff().num_minutes()
            )));
        }
        self.mark_cancelled(now);
        Ok(())
    }

    /// Administrative status change: `confirmed → completed`, or any open state to
    /// `cancelled` regardless of the cut-off.
    ///
    /// # Errors
    /// * [`BookingError::Conflict`] for terminal bookings or completing an unconfirmed one.
    /// * A validation error when asking for `pending_payment` or `confirmed`.
    pub fn set_status_by_admin(
        &mut self,
        target: BookingStatus,
        now: DateTime<Utc>,
    ) -> Result<(), BookingError> {
        if self.status.is_terminal() {
            return Err(BookingError::conflict(format!(
                "Booking is already {}",
                self.status.as_str()
            )));
        }

        match target {
            BookingStatus::Completed if self.status == BookingStatus::Confirmed => {
                self.status = BookingStatus::Completed;
                self.updated_at = now;
            },
            BookingStatus::Completed => {
                return Err(BookingError::conflict("Only confirmed bookings can be completed"));
            },
            BookingStatus::Cancelled => self.mark_cancelled(now),
            BookingStatus::PendingPayment | BookingStatus::Confirmed => {
                return Err(BookingError::invalid(
                    "status",
                    "must be completed or cancelled; payments move bookings to confirmed",
                ));
            },
        }
        Ok(())
    }

    fn mark_cancelled(&mut self, now: DateTime<Utc>) {
        self.status = BookingStatus::Cancelled;
        self.cancelled_at = Some(now);
        self.updated_at = now;
    }
}

#[api_model]
/// A booking as shown to its owner and to admins
#[derive(Clone, PartialEq)]
pub struct BookingView {
    /// Public reference, e.g. `WF-7KQ2MZ9X`
    pub reference: String,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub pickup: String,
    pub dropoff: String,
    pub distance_km: f64,
    pub vehicle_class: VehicleClass,
    pub passengers: u8,
    pub notes: Option<String>,
    pub pickup_at: DateTime<Utc>,
    /// `YYYY-MM-DD HH:MM` in the company's time zone
    pub pickup_local: String,
    pub fare: FareQuote,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub payment_reference: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<BookingRecord> for BookingView {
    fn from(record: BookingRecord) -> Self {
        Self {
            reference: record.reference,
            status: record.status,
            payment_status: record.payment_status,
            payment_method: record.payment_method,
            pickup: record.pickup,
            dropoff: record.dropoff,
            distance_km: record.distance_km,
            vehicle_class: record.vehicle_class,
            passengers: record.passengers,
            notes: record.notes,
            pickup_at: record.pickup_at,
            pickup_local: record.pickup_local,
            fare: record.fare,
            customer_name: record.customer_name,
            customer_email: record.customer_email,
            customer_phone: record.customer_phone,
            payment_reference: record.payment_reference,
            paid_at: record.paid_at,
            cancelled_at: record.cancelled_at,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::fare::FareCalculator;
    use crate::wizard::{Route, Schedule};
    use chrono::TimeDelta;
    use wayfare_domain::config::{BookingPolicyConfig, PricingConfig};

    pub(crate) fn record(method: PaymentMethod, pickup_in: TimeDelta) -> BookingRecord {
        let now = Utc::now();
        let quote = FareCalculator::new(&PricingConfig::default())
            .unwrap()
            .quote(18.0, VehicleClass::Sedan)
            .unwrap();
        let draft = ConfirmedDraft {
            owner: "uid-1".to_owned(),
            route: Route {
                pickup: "Ikeja".to_owned(),
                dropoff: "Lekki Phase 1".to_owned(),
                distance_km: 18.0,
                vehicle_class: VehicleClass::Sedan,
            },
            quote,
            schedule: Schedule {
                pickup_at: now + pickup_in,
                pickup_local: "2026-01-01 10:00".to_owned(),
                passengers: 2,
                notes: None,
            },
            payment_method: method,
        };
        BookingRecord::from_draft("WF-TESTREF1".to_owned(), draft, Customer::default(), now)
    }

    fn policy() -> BookingPolicy {
        BookingPolicy::new(&BookingPolicyConfig::default()).unwrap()
    }

    #[test]
    fn card_bookings_wait_for_payment() {
        let card = record(PaymentMethod::Card, TimeDelta::days(1));
        assert_eq!(card.status, BookingStatus::PendingPayment);
        assert_eq!(card.payment_status, PaymentStatus::Unpaid);

        let cash = record(PaymentMethod::Cash, TimeDelta::days(1));
        assert_eq!(cash.status, BookingStatus::Confirmed);
        assert_eq!(cash.payment_status, PaymentStatus::Unpaid);
    }

    #[test]
    fn customers_cancel_open_bookings_before_the_cutoff() {
        let now = Utc::now();
        let mut booking = record(PaymentMethod::Cash, TimeDelta::days(1));
        booking.cancel_by_customer(&policy(), now).unwrap();
        assert_eq!(booking.status, BookingStatus::Cancelled);
        assert_eq!(booking.cancelled_at, Some(now));

        let err = booking.cancel_by_customer(&policy(), now).unwrap_err();
        assert!(matches!(err, BookingError::Conflict { .. }));

        let mut soon = record(PaymentMethod::Card, TimeDelta::minutes(90));
        assert!(soon.cancel_by_customer(&policy(), Utc::now()).is_err());
        assert_eq!(soon.status, BookingStatus::PendingPayment);
    }

    #[test]
    fn admin_transitions() {
        let now = Utc::now();

        let mut pending = record(PaymentMethod::Card, TimeDelta::minutes(30));
        assert!(pending.set_status_by_admin(BookingStatus::Completed, now).is_err());
        pending.set_status_by_admin(BookingStatus::Cancelled, now).unwrap();
        assert!(pending.set_status_by_admin(BookingStatus::Cancelled, now).is_err());

        let mut confirmed = record(PaymentMethod::BankTransfer, TimeDelta::days(1));
        assert!(matches!(
            confirmed.set_status_by_admin(BookingStatus::PendingPayment, now),
            Err(BookingError::Validation { .. })
        ));
        confirmed.set_status_by_admin(BookingStatus::Completed, now).unwrap();
        assert_eq!(confirmed.status, BookingStatus::Completed);
        assert!(confirmed.set_status_by_admin(BookingStatus::Cancelled, now).is_err());
    }

    #[test]
    fn every_payment_attempt_stays_known() {
        let now = Utc::now();
        let mut booking = record(PaymentMethod::Card, TimeDelta::days(1));
        assert!(!booking.has_payment_attempt("WF-TESTREF1-first1"));

        booking.start_payment_attempt("WF-TESTREF1-first1".to_owned(), now);
        booking.start_payment_attempt("WF-TESTREF1-second".to_owned(), now);

        assert_eq!(booking.payment_reference.as_deref(), Some("WF-TESTREF1-second"));
        assert_eq!(booking.payment_status, PaymentStatus::Pending);
        assert!(booking.has_payment_attempt("WF-TESTREF1-first1"));
        assert!(booking.has_payment_attempt("WF-TESTREF1-second"));
        assert!(!booking.has_payment_attempt("WF-OTHERREF-first1"));
    }
}
