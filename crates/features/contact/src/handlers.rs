use crate::Contact;
use crate::store::{InquiryForm, InquiryRecord};
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use wayfare_derive::{api_handler, api_model};
use wayfare_domain::constants::{ADMIN_TAG, CONTACT_TAG};
use wayfare_identity::AdminUser;
use wayfare_kernel::server::{ApiError, ApiState, ErrorBody};

#[api_model]
/// A message from the contact form
pub struct InquiryRequest {
    pub name: String,
    pub email: String,
    /// Nigerian mobile number, optional
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: String,
}

#[api_model]
pub struct InquiryReceipt {
    pub id: String,
    pub created_at: DateTime<Utc>,
}

#[api_model]
/// A stored inquiry
pub struct InquiryView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl From<InquiryRecord> for InquiryView {
    fn from(record: InquiryRecord) -> Self {
        Self {
            id: record.inquiry_id,
            name: record.name,
            email: record.email,
            phone: record.phone,
            subject: record.subject,
            message: record.message,
            created_at: record.created_at,
        }
    }
}

fn contact(state: &ApiState) -> Result<&Contact, ApiError> {
    Ok(state.try_get_slice::<Contact>()?)
}

#[api_handler(
    post,
    path = "/api/contact",
    request_body = InquiryRequest,
    responses(
        (status = CREATED, description = "Inquiry stored", body = InquiryReceipt),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid field", body = ErrorBody),
    ),
    tag = CONTACT_TAG,
)]
pub(crate) async fn submit_inquiry(
    State(state): State<ApiState>,
    Json(request): Json<InquiryRequest>,
) -> Result<(StatusCode, Json<InquiryReceipt>), ApiError> {
    let form = InquiryForm {
        name: &request.name,
        email: &request.email,
        phone: request.phone.as_deref(),
        subject: request.subject.as_deref(),
        message: &request.message,
    };
    let record = contact(&state)?.inquiries.submit(&form, Utc::now()).await?;

    Ok((
        StatusCode::CREATED,
        Json(InquiryReceipt { id: record.inquiry_id, created_at: record.created_at }),
    ))
}

#[api_handler(
    get,
    path = "/api/admin/inquiries",
    responses(
        (status = OK, description = "Inquiries, newest first", body = Vec<InquiryView>),
        (status = UNAUTHORIZED, body = ErrorBody),
        (status = FORBIDDEN, body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = ADMIN_TAG,
)]
pub(crate) async fn list_inquiries(
    State(state): State<ApiState>,
    _admin: AdminUser,
) -> Result<Json<Vec<InquiryView>>, ApiError> {
    let inquiries = contact(&state)?.inquiries.list().await?;
    Ok(Json(inquiries.into_iter().map(InquiryView::from).collect()))
}
