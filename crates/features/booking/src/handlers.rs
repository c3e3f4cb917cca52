use crate::Booking;
use crate::dashboard::{self, DashboardView};
use crate::fare::FareQuote;
use crate::model::{BookingStatus, BookingView, Customer, PaymentMethod};
use crate::vehicle::{VehicleClass, VehicleView};
use crate::wizard::{BookingDraft, Route, ScheduleInput};
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::Utc;
use serde::Deserialize;
use utoipa::IntoParams;
use wayfare_derive::{api_handler, api_model};
use wayfare_domain::constants::{ADMIN_TAG, BOOKING_TAG, DASHBOARD_TAG};
use wayfare_identity::{AdminUser, AuthUser, Identity};
use wayfare_kernel::server::{ApiError, ApiState, ErrorBody};

#[api_model]
/// Distance and vehicle to price
pub struct QuoteRequest {
    pub distance_km: f64,
    pub vehicle_class: VehicleClass,
}

#[api_model]
pub struct ConfirmRequest {
    pub payment_method: PaymentMethod,
}

#[api_model]
/// Target status of an administrative update
pub struct StatusUpdateRequest {
    /// `completed` or `cancelled`
    pub status: BookingStatus,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BookingFilter {
    /// Only bookings with this status
    pub status: Option<BookingStatus>,
}

fn booking(state: &ApiState) -> Result<&Booking, ApiError> {
    Ok(state.try_get_slice::<Booking>()?)
}

/// Contact details for a new booking: the stored profile first, then the token claims.
async fn customer(state: &ApiState, user: AuthUser) -> Result<Customer, ApiError> {
    let profile = state.try_get_slice::<Identity>()?.users().get(&user.uid).await?;
    let (name, phone) = match profile {
        Some(profile) => (profile.display_name.or(user.name), profile.phone.or(user.phone)),
        None => (user.name, user.phone),
    };

    Ok(Customer { uid: user.uid, email: user.email, name, phone })
}

#[api_handler(
    get,
    path = "/api/vehicles",
    responses((status = OK, description = "Bookable vehicle classes", body = Vec<VehicleView>)),
    tag = BOOKING_TAG,
)]
pub(crate) async fn list_vehicles() -> Json<Vec<VehicleView>> {
    Json(VehicleClass::ALL.into_iter().map(VehicleView::from).collect())
}

#[api_handler(
    post,
    path = "/api/fares/quote",
    request_body = QuoteRequest,
    responses(
        (status = OK, description = "Fare breakdown", body = FareQuote),
        (status = UNPROCESSABLE_ENTITY, description = "Distance out of range", body = ErrorBody),
    ),
    tag = BOOKING_TAG,
)]
pub(crate) async fn quote_fare(
    State(state): State<ApiState>,
    Json(request): Json<QuoteRequest>,
) -> Result<Json<FareQuote>, ApiError> {
    let quote = booking(&state)?.fares.quote(request.distance_km, request.vehicle_class)?;
    Ok(Json(quote))
}

#[api_handler(
    post,
    path = "/api/bookings/drafts",
    request_body = Route,
    responses(
        (status = CREATED, description = "Draft started on the schedule step", body = BookingDraft),
        (status = UNAUTHORIZED, body = ErrorBody),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid route", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = BOOKING_TAG,
)]
pub(crate) async fn create_draft(
    State(state): State<ApiState>,
    user: AuthUser,
    Json(route): Json<Route>,
) -> Result<(StatusCode, Json<BookingDraft>), ApiError> {
    let booking = booking(&state)?;
    let now = Utc::now();

    let mut draft = booking.drafts.start(&user.uid, now);
    draft.submit_route(route, &booking.fares, now)?;
    booking.drafts.save(draft.clone()).await;

    tracing::debug!(draft = %draft.id, uid = %user.uid, "Booking draft started");
    Ok((StatusCode::CREATED, Json(draft)))
}

#[api_handler(
    get,
    path = "/api/bookings/drafts/{id}",
    params(("id" = String, Path, description = "Draft ID")),
    responses(
        (status = OK, body = BookingDraft),
        (status = UNAUTHORIZED, body = ErrorBody),
        (status = NOT_FOUND, description = "Unknown, expired or foreign draft", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = BOOKING_TAG,
)]
pub(crate) async fn get_draft(
    State(state): State<ApiState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<BookingDraft>, ApiError> {
    Ok(Json(booking(&state)?.drafts.get_owned(&id, &user.uid).await?))
}

#[api_handler(
    delete,
    path = "/api/bookings/drafts/{id}",
    params(("id" = String, Path, description = "Draft ID")),
    responses(
        (status = NO_CONTENT, description = "Draft discarded"),
        (status = UNAUTHORIZED, body = ErrorBody),
        (status = NOT_FOUND, body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = BOOKING_TAG,
)]
pub(crate) async fn discard_draft(
    State(state): State<ApiState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    booking(&state)?.drafts.discard(&id, &user.uid).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[api_handler(
    put,
    path = "/api/bookings/drafts/{id}/route",
    params(("id" = String, Path, description = "Draft ID")),
    request_body = Route,
    responses(
        (status = OK, description = "Route replaced and re-priced", body = BookingDraft),
        (status = UNAUTHORIZED, body = ErrorBody),
        (status = NOT_FOUND, body = ErrorBody),
        (status = UNPROCESSABLE_ENTITY, body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = BOOKING_TAG,
)]
pub(crate) async fn update_route(
    State(state): State<ApiState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(route): Json<Route>,
) -> Result<Json<BookingDraft>, ApiError> {
    let booking = booking(&state)?;
    let mut draft = booking.drafts.get_owned(&id, &user.uid).await?;

    draft.submit_route(route, &booking.fares, Utc::now())?;
    booking.drafts.save(draft.clone()).await;
    Ok(Json(draft))
}

#[api_handler(
    put,
    path = "/api/bookings/drafts/{id}/schedule",
    params(("id" = String, Path, description = "Draft ID")),
    request_body = ScheduleInput,
    responses(
        (status = OK, description = "Schedule accepted; draft is ready to confirm", body = BookingDraft),
        (status = UNAUTHORIZED, body = ErrorBody),
        (status = NOT_FOUND, body = ErrorBody),
        (status = CONFLICT, description = "No route yet", body = ErrorBody),
        (status = UNPROCESSABLE_ENTITY, body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = BOOKING_TAG,
)]
pub(crate) async fn update_schedule(
    State(state): State<ApiState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(input): Json<ScheduleInput>,
) -> Result<Json<BookingDraft>, ApiError> {
    let booking = booking(&state)?;
    let mut draft = booking.drafts.get_owned(&id, &user.uid).await?;

    draft.submit_schedule(input, &booking.policy, Utc::now())?;
    booking.drafts.save(draft.clone()).await;
    Ok(Json(draft))
}

#[api_handler(
    post,
    path = "/api/bookings/drafts/{id}/back",
    params(("id" = String, Path, description = "Draft ID")),
    responses(
        (status = OK, description = "Draft moved one step back", body = BookingDraft),
        (status = UNAUTHORIZED, body = ErrorBody),
        (status = NOT_FOUND, body = ErrorBody),
        (status = CONFLICT, description = "Already on the first step", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = BOOKING_TAG,
)]
pub(crate) async fn step_back(
    State(state): State<ApiState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<BookingDraft>, ApiError> {
    let booking = booking(&state)?;
    let mut draft = booking.drafts.get_owned(&id, &user.uid).await?;

    draft.back(Utc::now())?;
    booking.drafts.save(draft.clone()).await;
    Ok(Json(draft))
}

#[api_handler(
    post,
    path = "/api/bookings/drafts/{id}/confirm",
    params(("id" = String, Path, description = "Draft ID")),
    request_body = ConfirmRequest,
    responses(
        (status = CREATED, description = "Booking created; the draft is consumed", body = BookingView),
        (status = UNAUTHORIZED, body = ErrorBody),
        (status = NOT_FOUND, body = ErrorBody),
        (status = CONFLICT, description = "Wizard incomplete or already confirmed", body = ErrorBody),
        (status = UNPROCESSABLE_ENTITY, description = "Pickup time no longer valid", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = BOOKING_TAG,
)]
pub(crate) async fn confirm_draft(
    State(state): State<ApiState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(request): Json<ConfirmRequest>,
) -> Result<(StatusCode, Json<BookingView>), ApiError> {
    let booking = booking(&state)?;
    let now = Utc::now();

    // Only the request holding the draft may confirm it; it goes back on any failure.
    let draft = booking.drafts.take(&id, &user.uid).await?;
    let created = async {
        let confirmed = draft.confirm(request.payment_method, &booking.policy, now)?;
        let customer = customer(&state, user).await?;
        booking.bookings.create(confirmed, customer, now).await.map_err(ApiError::from)
    }
    .await;

    match created {
        Ok(record) => Ok((StatusCode::CREATED, Json(record.into()))),
        Err(err) => {
            booking.drafts.restore(draft).await;
            Err(err)
        },
    }
}

#[api_handler(
    get,
    path = "/api/bookings",
    responses(
        (status = OK, description = "Caller's bookings, newest first", body = Vec<BookingView>),
        (status = UNAUTHORIZED, body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = BOOKING_TAG,
)]
pub(crate) async fn list_bookings(
    State(state): State<ApiState>,
    user: AuthUser,
) -> Result<Json<Vec<BookingView>>, ApiError> {
    let bookings = booking(&state)?.bookings.list_for_owner(&user.uid).await?;
    Ok(Json(bookings.into_iter().map(BookingView::from).collect()))
}

#[api_handler(
    get,
    path = "/api/bookings/{reference}",
    params(("reference" = String, Path, description = "Booking reference")),
    responses(
        (status = OK, body = BookingView),
        (status = UNAUTHORIZED, body = ErrorBody),
        (status = NOT_FOUND, body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = BOOKING_TAG,
)]
pub(crate) async fn get_booking(
    State(state): State<ApiState>,
    user: AuthUser,
    Path(reference): Path<String>,
) -> Result<Json<BookingView>, ApiError> {
    let record =
        booking(&state)?.bookings.get_visible(&reference, &user.uid, user.is_admin()).await?;
    Ok(Json(record.into()))
}

#[api_handler(
    post,
    path = "/api/bookings/{reference}/cancel",
    params(("reference" = String, Path, description = "Booking reference")),
    responses(
        (status = OK, description = "Booking cancelled", body = BookingView),
        (status = UNAUTHORIZED, body = ErrorBody),
        (status = NOT_FOUND, body = ErrorBody),
        (status = CONFLICT, description = "Closed booking or past the cancellation cut-off", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = BOOKING_TAG,
)]
pub(crate) async fn cancel_booking(
    State(state): State<ApiState>,
    user: AuthUser,
    Path(reference): Path<String>,
) -> Result<Json<BookingView>, ApiError> {
    let booking = booking(&state)?;
    let mut record = booking.bookings.get_visible(&reference, &user.uid, false).await?;

    record.cancel_by_customer(&booking.policy, Utc::now())?;
    let record = booking.bookings.save(record).await?;
    tracing::info!(reference = %record.reference, uid = %user.uid, "Booking cancelled by customer");
    Ok(Json(record.into()))
}

#[api_handler(
    get,
    path = "/api/dashboard",
    responses(
        (status = OK, description = "Caller's booking overview", body = DashboardView),
        (status = UNAUTHORIZED, body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = DASHBOARD_TAG,
)]
pub(crate) async fn get_dashboard(
    State(state): State<ApiState>,
    user: AuthUser,
) -> Result<Json<DashboardView>, ApiError> {
    let booking = booking(&state)?;
    let bookings = booking.bookings.list_for_owner(&user.uid).await?;
    Ok(Json(dashboard::summarize(&bookings, booking.fares.currency(), Utc::now())))
}

#[api_handler(
    get,
    path = "/api/admin/bookings",
    params(BookingFilter),
    responses(
        (status = OK, description = "All bookings, newest first", body = Vec<BookingView>),
        (status = UNAUTHORIZED, body = ErrorBody),
        (status = FORBIDDEN, body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = ADMIN_TAG,
)]
pub(crate) async fn admin_list_bookings(
    State(state): State<ApiState>,
    _admin: AdminUser,
    Query(filter): Query<BookingFilter>,
) -> Result<Json<Vec<BookingView>>, ApiError> {
    let bookings = booking(&state)?.bookings.list_all(filter.status).await?;
    Ok(Json(bookings.into_iter().map(BookingView::from).collect()))
}

#[api_handler(
    put,
    path = "/api/admin/bookings/{reference}/status",
    params(("reference" = String, Path, description = "Booking reference")),
    request_body = StatusUpdateRequest,
    responses(
        (status = OK, description = "Status changed", body = BookingView),
        (status = UNAUTHORIZED, body = ErrorBody),
        (status = FORBIDDEN, body = ErrorBody),
        (status = NOT_FOUND, body = ErrorBody),
        (status = CONFLICT, description = "Booking is closed or not confirmed", body = ErrorBody),
        (status = UNPROCESSABLE_ENTITY, description = "Unsupported target status", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = ADMIN_TAG,
)]
pub(crate) async fn admin_update_status(
    State(state): State<ApiState>,
    AdminUser(admin): AdminUser,
    Path(reference): Path<String>,
    Json(request): Json<StatusUpdateRequest>,
) -> Result<Json<BookingView>, ApiError> {
    let booking = booking(&state)?;
    let mut record = booking.bookings.get_visible(&reference, &admin.uid, true).await?;

    let from = record.status;
    record.set_status_by_admin(request.status, Utc::now())?;
    let record = booking.bookings.save(record).await?;
    tracing::info!(
        reference = %record.reference,
        admin = %admin.uid,
        from = from.as_str(),
        to = record.status.as_str(),
        "Booking status changed"
    );
    Ok(Json(record.into()))
}
