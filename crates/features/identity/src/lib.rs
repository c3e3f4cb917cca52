//! # Identity
//!
//! Bearer-token authentication for the booking API.
//!
//! The authentication provider signs HS256 tokens for signed-in visitors. `POST /api/auth/session`
//! verifies such a token, upserts the `user` document and answers with a session token that adds
//! the caller's `role` as a custom claim. [`AuthUser`] and [`AdminUser`] extract and check these
//! tokens in other slices' handlers.

pub mod claims;
mod error;
pub mod extract;
mod handlers;
pub mod store;
pub mod token;

pub use crate::claims::{Claims, Role};
pub use crate::error::{IdentityError, IdentityErrorExt};
pub use crate::extract::{AdminUser, AuthUser};
pub use crate::handlers::{ProfileView, SessionResponse, UpdateProfileRequest};
pub use crate::token::{IssuedToken, TokenService};

use crate::store::UserStore;
use std::sync::Arc;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;
use wayfare_database::{Database, Migration};
use wayfare_domain::config::ApiConfig;
use wayfare_kernel::domain::registry::InitializedSlice;
use wayfare_kernel::server::ApiState;

pub const MIGRATIONS: &[Migration] = &[Migration::new(
    "identity",
    "001",
    "DEFINE TABLE IF NOT EXISTS user SCHEMALESS;
     DEFINE INDEX IF NOT EXISTS user_email ON TABLE user FIELDS email;",
)];

/// Identity feature state
#[wayfare_derive::wayfare_slice]
pub struct Identity {
    tokens: TokenService,
    users: UserStore,
    /// Lowercased.
    admin_emails: Arc<[String]>,
}

impl IdentityInner {
    #[must_use]
    pub const fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    #[must_use]
    pub const fn users(&self) -> &UserStore {
        &self.users
    }
}

/// Initialize the identity feature.
///
/// # Errors
/// Returns [`IdentityError::Config`] if the JWT settings are unusable.
pub fn init(config: &ApiConfig, db: &Database) -> Result<InitializedSlice, IdentityError> {
    let identity = &config.security.identity;
    let tokens = TokenService::new(&identity.jwt)?;
    let admin_emails: Arc<[String]> = identity
        .admin_emails
        .iter()
        .map(|email| email.trim().to_lowercase())
        .filter(|email| !email.is_empty())
        .collect();

    tracing::info!(issuer = tokens.issuer(), admins = admin_emails.len(), "Identity slice initialized");

    let slice = Identity::new(IdentityInner { tokens, users: UserStore::new(db.clone()), admin_emails });
    Ok(InitializedSlice::new(slice))
}

/// Session and profile routes.
pub fn router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::open_session))
        .routes(routes!(handlers::get_me, handlers::update_me))
}
