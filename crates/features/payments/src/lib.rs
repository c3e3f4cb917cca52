//! # Payments
//!
//! Online card payments for bookings through Paystack.
//!
//! A customer starts a checkout for a `pending_payment` booking and is sent to Paystack. The
//! outcome reaches the booking through whichever arrives first: the customer's verify call
//! after checkout, or the signed `charge.success` webhook. Both settle the booking the same
//! idempotent way.

mod error;
mod handlers;
pub mod paystack;
pub mod settlement;
pub mod webhook;

pub use crate::error::{PaymentsError, PaymentsErrorExt};
pub use crate::handlers::{InitializePaymentRequest, PaymentResult, PaymentSession, WebhookAck};
pub use crate::paystack::{PaystackClient, Transaction, TransactionStatus};
pub use crate::settlement::Settlement;

use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;
use wayfare_domain::config::ApiConfig;
use wayfare_kernel::domain::registry::InitializedSlice;
use wayfare_kernel::server::ApiState;

/// Payments feature state
#[wayfare_derive::wayfare_slice]
pub struct Payments {
    gateway: PaystackClient,
}

impl PaymentsInner {
    #[must_use]
    pub const fn gateway(&self) -> &PaystackClient {
        &self.gateway
    }
}

/// Initialize the payments feature.
///
/// Without a secret key the slice still starts; checkout and verification then answer with a
/// gateway error and every webhook is rejected.
///
/// # Errors
/// Returns [`PaymentsError::Config`] for an unusable gateway configuration.
pub fn init(config: &ApiConfig) -> Result<InitializedSlice, PaymentsError> {
    let gateway = PaystackClient::new(&config.payments.paystack)?;
    if gateway.is_configured() {
        tracing::info!(?gateway, "Payments slice initialized");
    } else {
        tracing::warn!("Paystack secret key is not set; online payments are disabled");
    }

    Ok(InitializedSlice::new(Payments::new(PaymentsInner { gateway })))
}

/// Checkout, verification and webhook routes.
pub fn router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::initialize_payment))
        .routes(routes!(handlers::verify_payment))
        .routes(routes!(handlers::paystack_webhook))
}
