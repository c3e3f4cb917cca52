//! Facade crate for Wayfare features and shared modules.
//! Re-exports domain/kernel primitives and aggregates feature initialization.
//! Keep this crate thin: it should compose other crates, not implement business logic.
//!
//! ## Usage
//! - Apply [`migrations`] when connecting the database.
//! - Call [`init`] to build every feature slice, then register them on the `ApiState`.
//! - Merge [`router`] into the application router.

use utoipa_axum::router::OpenApiRouter;
use wayfare_database::{Database, Migration};
pub use wayfare_domain as domain;
use wayfare_domain::config::ApiConfig;
use wayfare_domain::registry::InitializedSlice;
pub use wayfare_kernel as kernel;
use wayfare_kernel::server::ApiState;

/// Feature slices, in initialization order.
pub mod features {
    pub use wayfare_booking as booking;
    pub use wayfare_contact as contact;
    pub use wayfare_identity as identity;
    pub use wayfare_payments as payments;
}

/// Schema migrations of every slice, in the order they must run.
#[must_use]
pub fn migrations() -> Vec<Migration> {
    [features::identity::MIGRATIONS, features::booking::MIGRATIONS, features::contact::MIGRATIONS]
        .concat()
}

/// Initialize all feature slices.
///
/// # Errors
/// Returns an error if any slice rejects its configuration.
pub fn init(
    config: &ApiConfig,
    database: &Database,
) -> Result<Vec<InitializedSlice>, Box<dyn std::error::Error + Send + Sync>> {
    let mut slices = Vec::new();

    // Identity first: every other slice authenticates through it
    slices.push(features::identity::init(config, database)?);

    // Booking: fares, wizard, bookings, dashboards
    slices.push(features::booking::init(config, database)?);

    // Payments
    slices.push(features::payments::init(config)?);

    // Contact
    slices.push(features::contact::init(database));

    Ok(slices)
}

/// Routes of every feature slice, without the system routes.
pub fn router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new()
        .merge(features::identity::router())
        .merge(features::booking::router())
        .merge(features::payments::router())
        .merge(features::contact::router())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_unique_per_slice_and_version() {
        let migrations = migrations();
        let mut keys: Vec<String> = migrations.iter().map(Migration::key).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), migrations.len());
        assert_eq!(migrations[0].slice, "identity");
    }

    #[test]
    fn router_documents_every_slice() {
        let (_, doc) = router().split_for_parts();
        for path in ["/api/auth/session", "/api/vehicles", "/api/payments/webhook", "/api/contact"] {
            assert!(doc.paths.paths.contains_key(path), "{path} is not routed");
        }
    }
}
