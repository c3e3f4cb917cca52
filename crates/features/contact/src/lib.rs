//! # Contact
//!
//! The public contact form and the admin inbox behind it.

mod error;
mod handlers;
pub mod store;

pub use crate::error::{ContactError, ContactErrorExt};
pub use crate::handlers::{InquiryReceipt, InquiryRequest, InquiryView};

use crate::store::InquiryStore;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;
use wayfare_database::{Database, Migration};
use wayfare_kernel::domain::registry::InitializedSlice;
use wayfare_kernel::server::ApiState;

pub const MIGRATIONS: &[Migration] = &[Migration::new(
    "contact",
    "001",
    "DEFINE TABLE IF NOT EXISTS inquiry SCHEMALESS;
     DEFINE INDEX IF NOT EXISTS inquiry_created_at ON TABLE inquiry FIELDS created_at;",
)];

/// Contact feature state
#[wayfare_derive::wayfare_slice]
pub struct Contact {
    inquiries: InquiryStore,
}

/// Initialize the contact feature.
#[must_use]
pub fn init(db: &Database) -> InitializedSlice {
    InitializedSlice::new(Contact::new(ContactInner { inquiries: InquiryStore::new(db.clone()) }))
}

pub fn router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::submit_inquiry))
        .routes(routes!(handlers::list_inquiries))
}
