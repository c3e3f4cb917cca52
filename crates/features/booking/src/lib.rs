//! # Booking
//!
//! Vehicle classes, distance-based fares, the three-step booking wizard, stored bookings and
//! the dashboards built on them.
//!
//! Wizard drafts live in memory until confirmed; a confirmed draft becomes a `booking`
//! document with a public `WF-` reference. Payment state on a booking is advanced by the
//! payments slice through [`BookingStore`].

pub mod dashboard;
pub mod drafts;
mod error;
pub mod fare;
mod handlers;
pub mod model;
pub mod policy;
pub mod store;
pub mod vehicle;
pub mod wizard;

pub use crate::error::{BookingError, BookingErrorExt};
pub use crate::fare::{FareCalculator, FareQuote};
pub use crate::handlers::{BookingFilter, ConfirmRequest, QuoteRequest, StatusUpdateRequest};
pub use crate::model::{BookingRecord, BookingStatus, BookingView, Customer, PaymentMethod, PaymentStatus};
pub use crate::policy::BookingPolicy;
pub use crate::store::BookingStore;
pub use crate::vehicle::{VehicleClass, VehicleView};

use crate::drafts::DraftStore;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;
use wayfare_database::{Database, Migration};
use wayfare_domain::config::ApiConfig;
use wayfare_kernel::domain::registry::InitializedSlice;
use wayfare_kernel::server::ApiState;

pub const MIGRATIONS: &[Migration] = &[
    Migration::new(
        "booking",
        "001",
        "DEFINE TABLE IF NOT EXISTS booking SCHEMALESS;
         DEFINE INDEX IF NOT EXISTS booking_owner ON TABLE booking FIELDS owner_uid;
         DEFINE INDEX IF NOT EXISTS booking_payment_reference ON TABLE booking FIELDS payment_reference;
         DEFINE INDEX IF NOT EXISTS booking_created_at ON TABLE booking FIELDS created_at;",
    ),
    Migration::new(
        "booking",
        "002",
        "DEFINE INDEX IF NOT EXISTS booking_payment_attempts ON TABLE booking FIELDS payment_attempts;",
    ),
];

/// Booking feature state
#[wayfare_derive::wayfare_slice]
pub struct Booking {
    fares: FareCalculator,
    policy: BookingPolicy,
    drafts: DraftStore,
    bookings: BookingStore,
}

impl BookingInner {
    #[must_use]
    pub const fn fares(&self) -> &FareCalculator {
        &self.fares
    }

    #[must_use]
    pub const fn policy(&self) -> &BookingPolicy {
        &self.policy
    }

    #[must_use]
    pub const fn bookings(&self) -> &BookingStore {
        &self.bookings
    }
}

/// Initialize the booking feature.
///
/// # Errors
/// Returns [`BookingError::Config`] if the fare table or booking policy is unusable.
pub fn init(config: &ApiConfig, db: &Database) -> Result<InitializedSlice, BookingError> {
    let fares = FareCalculator::new(&config.pricing)?;
    let policy = BookingPolicy::new(&config.booking)?;

    tracing::info!(
        currency = fares.currency(),
        max_distance_km = fares.max_distance_km(),
        utc_offset = %policy.offset(),
        "Booking slice initialized"
    );

    let slice = Booking::new(BookingInner {
        drafts: DraftStore::new(&policy),
        bookings: BookingStore::new(db.clone()),
        fares,
        policy,
    });
    Ok(InitializedSlice::new(slice))
}

/// Catalogue, wizard, booking, dashboard and booking admin routes.
pub fn router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::list_vehicles))
        .routes(routes!(handlers::quote_fare))
        .routes(routes!(handlers::create_draft))
        .routes(routes!(handlers::get_draft, handlers::discard_draft))
        .routes(routes!(handlers::update_route))
        .routes(routes!(handlers::update_schedule))
        .routes(routes!(handlers::step_back))
        .routes(routes!(handlers::confirm_draft))
        .routes(routes!(handlers::list_bookings))
        .routes(routes!(handlers::get_booking))
        .routes(routes!(handlers::cancel_booking))
        .routes(routes!(handlers::get_dashboard))
        .routes(routes!(handlers::admin_list_bookings))
        .routes(routes!(handlers::admin_update_status))
}
