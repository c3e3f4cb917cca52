use crate::Payments;
use crate::error::PaymentsError;
use crate::paystack::{InitializeTransaction, Transaction};
use crate::settlement::{self, Settlement};
use crate::webhook::{self, SIGNATURE_HEADER, WebhookEvent};
use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use chrono::Utc;
use serde_json::json;
use wayfare_booking::{
    Booking, BookingError, BookingRecord, BookingStatus, BookingStore, BookingView, PaymentMethod,
    PaymentStatus,
};
use wayfare_derive::{api_handler, api_model};
use wayfare_domain::constants::PAYMENTS_TAG;
use wayfare_identity::AuthUser;
use wayfare_kernel::safe_nanoid;
use wayfare_kernel::server::{ApiError, ApiState, ErrorBody};
use wayfare_kernel::validation::ValidationError;

const ATTEMPT_SUFFIX_CHARS: usize = 6;

#[api_model]
pub struct InitializePaymentRequest {
    pub booking_reference: String,
}

#[api_model]
/// Where to send the customer to pay
pub struct PaymentSession {
    pub authorization_url: String,
    pub access_code: String,
    /// Payment reference, `<booking reference>-<6 chars>`
    pub reference: String,
}

#[api_model]
/// Result of checking a payment with the gateway
pub struct PaymentResult {
    pub reference: String,
    pub outcome: Settlement,
    pub booking: BookingView,
}

#[api_model]
pub struct WebhookAck {
    pub received: bool,
}

fn slices(state: &ApiState) -> Result<(&Payments, &Booking), ApiError> {
    Ok((state.try_get_slice::<Payments>()?, state.try_get_slice::<Booking>()?))
}

/// Settles `record` and saves it. If another request saved the booking in between, the
/// booking is reloaded and settled once more.
async fn settle_and_save(
    bookings: &BookingStore,
    mut record: BookingRecord,
    transaction: &Transaction,
) -> Result<(BookingRecord, Settlement), PaymentsError> {
    let outcome = settlement::settle(&mut record, transaction, Utc::now())?;
    if !outcome.changed() {
        return Ok((record, outcome));
    }

    let reference = record.reference.clone();
    match bookings.save(record).await {
        Ok(saved) => Ok((saved, outcome)),
        Err(BookingError::Conflict { .. }) => {
            tracing::debug!(booking = %reference, "Booking changed during settlement, retrying");
            let mut fresh = bookings
                .get(&reference)
                .await?
                .ok_or_else(|| BookingError::not_found(format!("Booking '{reference}' not found")))?;
            let outcome = settlement::settle(&mut fresh, transaction, Utc::now())?;
            let fresh = if outcome.changed() { bookings.save(fresh).await? } else { fresh };
            Ok((fresh, outcome))
        },
        Err(err) => Err(err.into()),
    }
}

#[api_handler(
    post,
    path = "/api/payments/initialize",
    request_body = InitializePaymentRequest,
    responses(
        (status = OK, description = "Checkout started", body = PaymentSession),
        (status = UNAUTHORIZED, body = ErrorBody),
        (status = NOT_FOUND, body = ErrorBody),
        (status = CONFLICT, description = "Not a card booking awaiting payment", body = ErrorBody),
        (status = BAD_GATEWAY, description = "Gateway refused or unreachable", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = PAYMENTS_TAG,
)]
pub(crate) async fn initialize_payment(
    State(state): State<ApiState>,
    user: AuthUser,
    Json(request): Json<InitializePaymentRequest>,
) -> Result<Json<PaymentSession>, ApiError> {
    let (payments, booking) = slices(&state)?;
    let mut record =
        booking.bookings().get_visible(&request.booking_reference, &user.uid, false).await?;

    if record.payment_method != PaymentMethod::Card {
        return Err(ApiError::conflict("Only card bookings are paid online"));
    }
    if record.payment_status == PaymentStatus::Paid {
        return Err(ApiError::conflict("Booking is already paid"));
    }
    if record.status != BookingStatus::PendingPayment {
        return Err(ApiError::conflict(format!("A {} booking cannot be paid", record.status.as_str())));
    }
    let email = record
        .customer_email
        .clone()
        .or_else(|| user.email.clone())
        .ok_or_else(|| ValidationError::invalid("email", "an e-mail address is required to pay by card"))?;

    let reference = format!("{}-{}", record.reference, safe_nanoid!(ATTEMPT_SUFFIX_CHARS));
    let initialized = payments
        .gateway
        .initialize(&InitializeTransaction {
            email,
            amount: record.amount_kobo(),
            reference: reference.clone(),
            currency: record.fare.currency.clone(),
            callback_url: payments.gateway.callback_url().map(ToOwned::to_owned),
            metadata: json!({ "bookingReference": record.reference }),
        })
        .await?;

    record.start_payment_attempt(reference.clone(), Utc::now());
    let record = booking.bookings().save(record).await?;
    tracing::info!(booking = %record.reference, %reference, "Payment initialized");

    Ok(Json(PaymentSession {
        authorization_url: initialized.authorization_url,
        access_code: initialized.access_code,
        reference,
    }))
}

#[api_handler(
    get,
    path = "/api/payments/verify/{reference}",
    params(("reference" = String, Path, description = "Payment reference")),
    responses(
        (status = OK, description = "Payment checked and booking settled", body = PaymentResult),
        (status = UNAUTHORIZED, body = ErrorBody),
        (status = NOT_FOUND, body = ErrorBody),
        (status = CONFLICT, description = "Amount or currency mismatch", body = ErrorBody),
        (status = BAD_GATEWAY, body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = PAYMENTS_TAG,
)]
pub(crate) async fn verify_payment(
    State(state): State<ApiState>,
    user: AuthUser,
    Path(reference): Path<String>,
) -> Result<Json<PaymentResult>, ApiError> {
    let (payments, booking) = slices(&state)?;
    let record = booking
        .bookings()
        .find_by_payment_reference(&reference)
        .await?
        .filter(|record| record.owner_uid == user.uid || user.is_admin())
        .ok_or_else(|| ApiError::not_found(format!("Payment '{reference}' not found")))?;

    let transaction = payments.gateway.verify(&reference).await?;
    let (record, outcome) = settle_and_save(booking.bookings(), record, &transaction).await?;
    tracing::info!(booking = %record.reference, %reference, ?outcome, "Payment verified");

    Ok(Json(PaymentResult { reference, outcome, booking: record.into() }))
}

#[api_handler(
    post,
    path = "/api/payments/webhook",
    request_body(content = String, description = "Paystack event, signed with x-paystack-signature"),
    responses(
        (status = OK, description = "Event accepted", body = WebhookAck),
        (status = UNAUTHORIZED, description = "Missing or wrong signature", body = ErrorBody),
        (status = BAD_REQUEST, description = "Unreadable event", body = ErrorBody),
    ),
    tag = PAYMENTS_TAG,
)]
pub(crate) async fn paystack_webhook(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
    let (payments, booking) = slices(&state)?;
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(PaymentsError::Signature { context: Some("header missing".into()) })?;
    webhook::verify_signature(payments.gateway.secret_key(), &body, signature)?;

    let event: WebhookEvent = serde_json::from_slice(&body).map_err(|e| {
        PaymentsError::MalformedEvent { message: e.to_string().into(), context: None }
    })?;
    let event_type = event.event.clone();
    let Some(transaction) = event.successful_charge()? else {
        tracing::debug!(event = %event_type, "Webhook event ignored");
        return Ok(Json(WebhookAck { received: true }));
    };

    let Some(record) = booking.bookings().find_by_payment_reference(&transaction.reference).await?
    else {
        tracing::warn!(reference = %transaction.reference, "Webhook for an unknown payment reference");
        return Ok(Json(WebhookAck { received: true }));
    };

    // Paystack retries every non-200 answer; mismatches are only logged.
    match settle_and_save(booking.bookings(), record, &transaction).await {
        Ok((_, outcome)) => {
            if outcome == Settlement::RefundDue {
                tracing::warn!(reference = %transaction.reference, "Payment received for a closed booking");
            }
            tracing::info!(reference = %transaction.reference, ?outcome, "Webhook settled payment");
        },
        Err(err) => {
            tracing::warn!(reference = %transaction.reference, error = %err, "Webhook payment not settled");
        },
    }
    Ok(Json(WebhookAck { received: true }))
}
