use std::borrow::Cow;
use wayfare_booking::BookingError;
use wayfare_kernel::server::ApiError;

/// A specialized [`PaymentsError`] enum of this crate.
#[wayfare_derive::wayfare_error]
pub enum PaymentsError {
    #[error("Payments config error{}: {message}", format_context(.context))]
    Config { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The gateway answered with `status: false`, a non-2xx code or an unusable body.
    #[error("Payment gateway error{}: {message}", format_context(.context))]
    Gateway { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The gateway could not be reached or timed out.
    #[error("Payment gateway request failed{}: {source}", format_context(.context))]
    Http { source: reqwest::Error, context: Option<Cow<'static, str>> },

    /// A webhook without a valid `x-paystack-signature`.
    #[error("Invalid webhook signature{}", format_context(.context))]
    Signature { context: Option<Cow<'static, str>> },

    /// A signed webhook whose event or payload cannot be read.
    #[error("Malformed webhook event{}: {message}", format_context(.context))]
    MalformedEvent { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The payment does not fit the booking (state, amount or currency).
    #[error("Payment conflict{}: {message}", format_context(.context))]
    Conflict { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Not found{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Booking error{}: {source}", format_context(.context))]
    Booking { source: BookingError, context: Option<Cow<'static, str>> },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal payments error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl PaymentsError {
    pub fn conflict(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Conflict { message: message.into(), context: None }
    }

    pub fn gateway(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Gateway { message: message.into(), context: None }
    }
}

impl From<PaymentsError> for ApiError {
    fn from(err: PaymentsError) -> Self {
        match err {
            PaymentsError::Gateway { .. } | PaymentsError::Http { .. } => {
                Self::upstream(err.to_string())
            },
            PaymentsError::Signature { .. } => Self::unauthorized("Invalid webhook signature"),
            PaymentsError::MalformedEvent { .. } => Self::bad_request(err.to_string()),
            PaymentsError::Conflict { message, .. } => Self::conflict(message),
            PaymentsError::NotFound { message, .. } => Self::not_found(message),
            PaymentsError::Booking { source, .. } => source.into(),
            PaymentsError::Config { .. } | PaymentsError::Internal { .. } => {
                Self::Internal { message: err.to_string().into(), context: None }
            },
        }
    }
}
