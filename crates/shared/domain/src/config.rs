use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;

/// Top-level API configuration.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfigInner {
    pub server: ServerConfig,
    pub security: SecurityConfig,
    pub database: DatabaseConfig,
    pub pricing: PricingConfig,
    pub booking: BookingPolicyConfig,
    pub payments: PaymentsConfig,
}

/// Arc-wrapped config, cheap to clone into handlers and slices.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(flatten, default)]
    inner: Arc<ApiConfigInner>,
}

impl Deref for ApiConfig {
    type Target = ApiConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for ApiConfig {
    fn deref_mut(&mut self) -> &mut ApiConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: IpAddr,
    pub port: u16,
    pub ssl: Option<SslConfig>,
    /// Browser origins allowed to call the API (the marketing site).
    pub cors_origins: Vec<String>,
}

/// TLS certificate/key paths.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SslConfig {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// `SurrealDB` connection configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub credentials: Option<DatabaseCredentials>,
}

/// `SurrealDB` root credentials (leave empty for `mem://`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub identity: IdentityConfig,
}

/// Bearer token verification and role assignment.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub jwt: JwtConfig,
    /// Accounts with these e-mails receive the `admin` role on sign-in.
    pub admin_emails: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: Option<String>,
    /// Lifetime of session tokens re-issued with the role claim.
    pub ttl_seconds: u64,
    pub clock_skew_seconds: u64,
}

/// Fare table. Amounts are in kobo.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    pub currency: String,
    pub base_fare_kobo: u64,
    pub minimum_fare_kobo: u64,
    /// Totals are rounded up to a multiple of this amount.
    pub rounding_kobo: u64,
    pub max_distance_km: u32,
    /// Marginal per-kilometre rates, ordered by `up_to_km`; the last tier is open-ended.
    pub tiers: Vec<FareTierConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FareTierConfig {
    pub up_to_km: Option<u32>,
    pub rate_per_km_kobo: u64,
}

/// Scheduling and cancellation rules of the booking wizard.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BookingPolicyConfig {
    /// Offset of the company's local time from UTC (Lagos is UTC+1, no DST).
    pub utc_offset_minutes: i32,
    pub min_lead_minutes: u32,
    pub max_advance_days: u32,
    pub cancellation_cutoff_minutes: u32,
    pub draft_ttl_seconds: u64,
    pub draft_capacity: u64,
}

#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaymentsConfig {
    pub paystack: PaystackConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaystackConfig {
    pub base_url: String,
    pub secret_key: String,
    /// Where Paystack sends the customer after checkout.
    pub callback_url: Option<String>,
    pub timeout_seconds: u64,
}

// --- Default ---

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 4583,
            ssl: None,
            cors_origins: Vec::new(),
        }
    }
}

impl Default for SslConfig {
    fn default() -> Self {
        Self { cert: PathBuf::from("cert.pem"), key: PathBuf::from("key.pem") }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "mem://".to_owned(),
            namespace: "wayfare".to_owned(),
            database: "core".to_owned(),
            credentials: None,
        }
    }
}

impl Default for DatabaseCredentials {
    fn default() -> Self {
        Self { username: "root".to_owned(), password: "root".to_owned() }
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "dev-only-change-me".to_owned(),
            issuer: "wayfare".to_owned(),
            audience: None,
            ttl_seconds: 3600,
            clock_skew_seconds: 60,
        }
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            currency: "NGN".to_owned(),
            base_fare_kobo: 150_000,
            minimum_fare_kobo: 250_000,
            rounding_kobo: 5_000,
            max_distance_km: 1_500,
            tiers: vec![
                FareTierConfig { up_to_km: Some(10), rate_per_km_kobo: 20_000 },
                FareTierConfig { up_to_km: Some(50), rate_per_km_kobo: 15_000 },
                FareTierConfig { up_to_km: Some(200), rate_per_km_kobo: 12_000 },
                FareTierConfig { up_to_km: None, rate_per_km_kobo: 10_000 },
            ],
        }
    }
}

impl Default for BookingPolicyConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 60,
            min_lead_minutes: 60,
            max_advance_days: 90,
            cancellation_cutoff_minutes: 120,
            draft_ttl_seconds: 1800,
            draft_capacity: 10_000,
        }
    }
}

impl Default for PaystackConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.paystack.co".to_owned(),
            secret_key: String::new(),
            callback_url: None,
            timeout_seconds: 15,
        }
    }
}
