use std::borrow::Cow;
use wayfare_database::DatabaseError;
use wayfare_kernel::server::ApiError;
use wayfare_kernel::validation::ValidationError;

/// A specialized [`IdentityError`] enum of this crate.
#[wayfare_derive::wayfare_error]
pub enum IdentityError {
    /// Configuration errors for identity/authentication.
    #[error("Identity config error{}: {message}", format_context(.context))]
    Config { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The bearer token is missing, malformed, expired or signed with another key.
    #[error("Identity auth error{}: {message}", format_context(.context))]
    Auth { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Token error{}: {source}", format_context(.context))]
    Token { source: jsonwebtoken::errors::Error, context: Option<Cow<'static, str>> },

    #[error("Access denied{}: {message}", format_context(.context))]
    Forbidden { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Profile not found{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Invalid profile{}: {source}", format_context(.context))]
    Validation { source: ValidationError, context: Option<Cow<'static, str>> },

    #[error("Identity storage error{}: {source}", format_context(.context))]
    Database { source: DatabaseError, context: Option<Cow<'static, str>> },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal identity error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Auth { .. } | IdentityError::Token { .. } => {
                tracing::debug!(error = %err, "Bearer token rejected");
                Self::unauthorized("Invalid or expired bearer token")
            },
            IdentityError::Forbidden { message, .. } => Self::forbidden(message),
            IdentityError::NotFound { message, .. } => Self::not_found(message),
            IdentityError::Validation { source, .. } => source.into(),
            IdentityError::Database { source, context } => {
                Self::Internal { message: source.to_string().into(), context }
            },
            IdentityError::Config { .. } | IdentityError::Internal { .. } => {
                Self::Internal { message: err.to_string().into(), context: None }
            },
        }
    }
}
