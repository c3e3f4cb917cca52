use crate::Identity;
use crate::claims::{Claims, Role};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use wayfare_kernel::security::bearer::bearer_token;
use wayfare_kernel::server::{ApiError, ApiState};

/// A caller with a valid bearer token. Rejects with 401 otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub uid: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    /// `customer` unless the token carries the role claim of a session token.
    pub role: Role,
}

impl AuthUser {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            uid: claims.sub,
            email: claims.email,
            name: claims.name,
            phone: claims.phone_number,
            role: claims.role.unwrap_or_default(),
        }
    }
}

impl FromRequestParts<ApiState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &ApiState) -> Result<Self, Self::Rejection> {
        let token =
            bearer_token(&parts.headers).ok_or_else(|| ApiError::unauthorized("Missing bearer token"))?;
        let identity = state.try_get_slice::<Identity>()?;

        Ok(identity.tokens.verify(token)?.into())
    }
}

/// A caller whose session token carries the `admin` role. Rejects with 403 otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminUser(pub AuthUser);

impl FromRequestParts<ApiState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &ApiState) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            tracing::warn!(uid = %user.uid, "Admin route refused");
            return Err(ApiError::forbidden("Administrator role required"));
        }
        Ok(Self(user))
    }
}
