use crate::Identity;
use crate::claims::Role;
use crate::extract::AuthUser;
use crate::store::{ProfileChanges, UserRecord};
use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use wayfare_derive::{api_handler, api_model};
use wayfare_domain::constants::IDENTITY_TAG;
use wayfare_kernel::security::bearer::bearer_token;
use wayfare_kernel::server::{ApiError, ApiState, ErrorBody};
use wayfare_kernel::validation;

const MAX_DISPLAY_NAME_CHARS: usize = 120;

#[api_model]
/// Stored profile of the caller
pub struct ProfileView {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    /// Normalized to `+234…`
    pub phone: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub last_login_at: DateTime<Utc>,
}

impl From<UserRecord> for ProfileView {
    fn from(user: UserRecord) -> Self {
        Self {
            uid: user.uid,
            email: user.email,
            display_name: user.display_name,
            phone: user.phone,
            role: user.role,
            created_at: user.created_at,
            last_login_at: user.last_login_at,
        }
    }
}

#[api_model]
/// Session opened from a provider token
pub struct SessionResponse {
    /// Bearer token carrying the `role` claim; use it for all further calls
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub profile: ProfileView,
}

#[api_model]
/// Profile fields the caller may change; omitted fields stay as they are
pub struct UpdateProfileRequest {
    pub display_name: Option<String>,
    /// Nigerian mobile number in local or international format
    pub phone: Option<String>,
}

fn identity(state: &ApiState) -> Result<&Identity, ApiError> {
    Ok(state.try_get_slice::<Identity>()?)
}

#[api_handler(
    post,
    path = "/api/auth/session",
    responses(
        (status = OK, description = "Profile stored and session token issued", body = SessionResponse),
        (status = UNAUTHORIZED, description = "Missing or invalid provider token", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = IDENTITY_TAG,
)]
pub(crate) async fn open_session(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> Result<Json<SessionResponse>, ApiError> {
    let identity = identity(&state)?;
    let token =
        bearer_token(&headers).ok_or_else(|| ApiError::unauthorized("Missing bearer token"))?;
    let claims = identity.tokens.verify(token)?;

    let now = Utc::now();
    let user = identity.users.upsert_sign_in(&claims, &identity.admin_emails, now).await?;
    let issued = identity.tokens.issue_session(&claims, user.role, now)?;

    Ok(Json(SessionResponse {
        token: issued.token,
        expires_at: issued.expires_at,
        profile: user.into(),
    }))
}

#[api_handler(
    get,
    path = "/api/me",
    responses(
        (status = OK, description = "Caller profile", body = ProfileView),
        (status = UNAUTHORIZED, body = ErrorBody),
        (status = NOT_FOUND, description = "No session opened yet", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = IDENTITY_TAG,
)]
pub(crate) async fn get_me(
    State(state): State<ApiState>,
    user: AuthUser,
) -> Result<Json<ProfileView>, ApiError> {
    let identity = identity(&state)?;
    let profile = identity
        .users
        .get(&user.uid)
        .await?
        .ok_or_else(|| ApiError::not_found("No profile yet; open a session first"))?;

    Ok(Json(profile.into()))
}

#[api_handler(
    patch,
    path = "/api/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = OK, description = "Updated profile", body = ProfileView),
        (status = UNAUTHORIZED, body = ErrorBody),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid name or phone", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = IDENTITY_TAG,
)]
pub(crate) async fn update_me(
    State(state): State<ApiState>,
    user: AuthUser,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileView>, ApiError> {
    let changes = ProfileChanges {
        display_name: request
            .display_name
            .as_deref()
            .map(|name| validation::required_text("displayName", name, MAX_DISPLAY_NAME_CHARS))
            .transpose()?,
        phone: request
            .phone
            .as_deref()
            .map(|phone| validation::nigerian_phone("phone", phone))
            .transpose()?,
    };

    let profile = identity(&state)?.users.update_profile(&user.uid, changes, Utc::now()).await?;
    Ok(Json(profile.into()))
}
