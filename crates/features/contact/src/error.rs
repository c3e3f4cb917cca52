use std::borrow::Cow;
use wayfare_database::DatabaseError;
use wayfare_kernel::server::ApiError;
use wayfare_kernel::validation::ValidationError;

/// A specialized [`ContactError`] enum of this crate.
#[wayfare_derive::wayfare_error]
pub enum ContactError {
    #[error("Invalid inquiry{}: {source}", format_context(.context))]
    Validation { source: ValidationError, context: Option<Cow<'static, str>> },

    #[error("Inquiry storage error{}: {source}", format_context(.context))]
    Database { source: DatabaseError, context: Option<Cow<'static, str>> },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal contact error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl From<ContactError> for ApiError {
    fn from(err: ContactError) -> Self {
        match err {
            ContactError::Validation { source, .. } => source.into(),
            ContactError::Database { source, context } => {
                Self::Internal { message: source.to_string().into(), context }
            },
            ContactError::Internal { .. } => {
                Self::Internal { message: err.to_string().into(), context: None }
            },
        }
    }
}
