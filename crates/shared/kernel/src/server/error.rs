//! HTTP-facing error type.
//!
//! Feature errors convert into [`ApiError`]; its [`IntoResponse`] implementation picks the status
//! code and writes `{ "error": "<code>", "message": "<text>" }`. Internal details are logged and
//! replaced with a generic message.

use crate::security::resource::ResourceGuardError;
use crate::server::state::ApiStateError;
use crate::validation::ValidationError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::borrow::Cow;
use wayfare_database::DatabaseError;
use wayfare_derive::api_model;

#[wayfare_derive::wayfare_error]
pub enum ApiError {
    #[error("Bad request{}: {message}", format_context(.context))]
    BadRequest { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Unauthorized{}: {message}", format_context(.context))]
    Unauthorized { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Forbidden{}: {message}", format_context(.context))]
    Forbidden { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Not found{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Conflict{}: {message}", format_context(.context))]
    Conflict { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Unprocessable{}: {message}", format_context(.context))]
    Unprocessable { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A third-party service (payment gateway) failed or answered unexpectedly.
    #[error("Upstream error{}: {message}", format_context(.context))]
    Upstream { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

#[api_model]
/// Error response body
pub struct ErrorBody {
    /// Machine readable code, e.g. `not_found`
    pub error: String,
    /// Human readable description
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<Cow<'static, str>>) -> Self {
        Self::BadRequest { message: message.into(), context: None }
    }

    pub fn unauthorized(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Unauthorized { message: message.into(), context: None }
    }

    pub fn forbidden(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Forbidden { message: message.into(), context: None }
    }

    pub fn not_found(message: impl Into<Cow<'static, str>>) -> Self {
        Self::NotFound { message: message.into(), context: None }
    }

    pub fn conflict(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Conflict { message: message.into(), context: None }
    }

    pub fn unprocessable(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Unprocessable { message: message.into(), context: None }
    }

    pub fn upstream(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Upstream { message: message.into(), context: None }
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Unprocessable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Upstream { .. } => StatusCode::BAD_GATEWAY,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => "bad_request",
            Self::Unauthorized { .. } => "unauthorized",
            Self::Forbidden { .. } => "forbidden",
            Self::NotFound { .. } => "not_found",
            Self::Conflict { .. } => "conflict",
            Self::Unprocessable { .. } => "unprocessable",
            Self::Upstream { .. } => "upstream_error",
            Self::Internal { .. } => "internal_error",
        }
    }

    const fn message(&self) -> &Cow<'static, str> {
        match self {
            Self::BadRequest { message, .. }
            | Self::Unauthorized { message, .. }
            | Self::Forbidden { message, .. }
            | Self::NotFound { message, .. }
            | Self::Conflict { message, .. }
            | Self::Unprocessable { message, .. }
            | Self::Upstream { message, .. }
            | Self::Internal { message, .. } => message,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            Self::Internal { .. } => {
                tracing::error!(error = %self, "Request failed");
                "Internal server error".to_owned()
            },
            Self::Upstream { .. } => {
                tracing::warn!(error = %self, "Upstream service failed");
                self.message().to_string()
            },
            _ => {
                tracing::debug!(error = %self, "Request rejected");
                self.message().to_string()
            },
        };

        let body = ErrorBody { error: self.code().to_owned(), message };
        (self.status(), Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::Unprocessable { message: err.to_string().into(), context: None }
    }
}

impl From<ResourceGuardError> for ApiError {
    fn from(err: ResourceGuardError) -> Self {
        Self::BadRequest { message: err.to_string().into(), context: None }
    }
}

impl From<ApiStateError> for ApiError {
    fn from(err: ApiStateError) -> Self {
        Self::Internal { message: err.to_string().into(), context: None }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        Self::Internal { message: err.to_string().into(), context: Some("database".into()) }
    }
}
