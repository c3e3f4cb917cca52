use std::borrow::Cow;
use wayfare_database::DatabaseError;
use wayfare_kernel::server::ApiError;
use wayfare_kernel::validation::ValidationError;

/// A specialized [`BookingError`] enum of this crate.
#[wayfare_derive::wayfare_error]
pub enum BookingError {
    /// Unusable pricing or booking policy settings.
    #[error("Booking config error{}: {message}", format_context(.context))]
    Config { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Invalid booking input{}: {source}", format_context(.context))]
    Validation { source: ValidationError, context: Option<Cow<'static, str>> },

    /// The wizard or booking is not in a state that allows the action.
    #[error("Booking state conflict{}: {message}", format_context(.context))]
    Conflict { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Not found{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Booking storage error{}: {source}", format_context(.context))]
    Database { source: DatabaseError, context: Option<Cow<'static, str>> },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal booking error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl BookingError {
    pub fn invalid(field: &'static str, message: impl Into<Cow<'static, str>>) -> Self {
        ValidationError::invalid(field, message).into()
    }

    pub fn conflict(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Conflict { message: message.into(), context: None }
    }

    pub fn not_found(message: impl Into<Cow<'static, str>>) -> Self {
        Self::NotFound { message: message.into(), context: None }
    }
}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::Validation { source, .. } => source.into(),
            BookingError::Conflict { message, .. } => Self::conflict(message),
            BookingError::NotFound { message, .. } => Self::not_found(message),
            BookingError::Database { source, context } => {
                Self::Internal { message: source.to_string().into(), context }
            },
            BookingError::Config { .. } | BookingError::Internal { .. } => {
                Self::Internal { message: err.to_string().into(), context: None }
            },
        }
    }
}
