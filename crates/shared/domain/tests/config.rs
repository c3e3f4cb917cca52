use wayfare_domain::config::{
    ApiConfig, BookingPolicyConfig, DatabaseConfig, PricingConfig, ServerConfig,
};
use serde_json::json;

#[test]
fn config_defaults_are_sane() {
    let server = ServerConfig::default();
    assert_eq!(server.port, 4583);
    assert!(server.ssl.is_none());
    assert!(server.cors_origins.is_empty());

    let db = DatabaseConfig::default();
    assert_eq!(db.url, "mem://");
    assert_eq!(db.namespace, "wayfare");
    assert_eq!(db.database, "core");
    assert!(db.credentials.is_none());

    let policy = BookingPolicyConfig::default();
    assert_eq!(policy.utc_offset_minutes, 60);
    assert_eq!(policy.cancellation_cutoff_minutes, 120);
}

#[test]
fn default_fare_table_ends_with_open_tier() {
    let pricing = PricingConfig::default();
    assert_eq!(pricing.currency, "NGN");
    assert_eq!(pricing.tiers.len(), 4);
    assert!(pricing.tiers.last().is_some_and(|tier| tier.up_to_km.is_none()));
    assert!(pricing.tiers.iter().take(3).all(|tier| tier.up_to_km.is_some()));
}

#[test]
fn api_config_deserializes_partial_sections() {
    let raw = json!({
        "server": { "address": "::", "port": 8080, "cors_origins": ["https://wayfare.ng"] },
        "database": { "url": "mem://", "namespace": "n", "database": "d", "credentials": null },
        "pricing": { "base_fare_kobo": 100000, "tiers": [{ "up_to_km": null, "rate_per_km_kobo": 9000 }] },
        "payments": { "paystack": { "secret_key": "sk_test_123" } }
    });

    let cfg: ApiConfig = serde_json::from_value(raw).expect("config deserialize");
    assert_eq!(cfg.server.port, 8080);
    assert_eq!(cfg.server.cors_origins, vec!["https://wayfare.ng".to_owned()]);
    assert_eq!(cfg.database.namespace, "n");
    assert_eq!(cfg.pricing.base_fare_kobo, 100_000);
    assert_eq!(cfg.pricing.minimum_fare_kobo, 250_000);
    assert_eq!(cfg.pricing.tiers.len(), 1);
    assert_eq!(cfg.payments.paystack.secret_key, "sk_test_123");
    assert_eq!(cfg.payments.paystack.base_url, "https://api.paystack.co");
    assert_eq!(cfg.booking.min_lead_minutes, 60);
}

#[test]
fn config_mutation_is_copy_on_write() {
    let original = ApiConfig::default();
    let mut changed = original.clone();
    changed.server.port = 9000;

    assert_eq!(original.server.port, 4583);
    assert_eq!(changed.server.port, 9000);
}
