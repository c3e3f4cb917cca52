//! Table names and `OpenAPI` tags.

// Tables
pub const USER: &str = "user";
pub const BOOKING: &str = "booking";
pub const INQUIRY: &str = "inquiry";
pub const MIGRATION: &str = "migration";

// OpenAPI tags
pub const SYSTEM_TAG: &str = "System";
pub const IDENTITY_TAG: &str = "Identity";
pub const BOOKING_TAG: &str = "Booking";
pub const DASHBOARD_TAG: &str = "Dashboard";
pub const PAYMENTS_TAG: &str = "Payments";
pub const CONTACT_TAG: &str = "Contact";
pub const ADMIN_TAG: &str = "Admin";

/// Name of the bearer security scheme in the `OpenAPI` document.
pub const BEARER_SCHEME: &str = "bearer";

/// Prefix of public booking references (`WF-7KQ2MZ9X`).
pub const BOOKING_REFERENCE_PREFIX: &str = "WF-";

/// ISO 4217 code of the only currency the company charges in.
pub const CURRENCY_NGN: &str = "NGN";

/// Kobo per naira.
pub const KOBO_PER_NAIRA: u64 = 100;
