use std::io::Write;
use wayfare_kernel::config::{load_config, load_config_with_env};
use wayfare_kernel::domain::config::ApiConfig;

fn vars(pairs: &[(&str, &str)]) -> config::Map<String, String> {
    pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect()
}

#[test]
fn file_values_are_loaded() -> Result<(), Box<dyn std::error::Error>> {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile()?;
    writeln!(
        file,
        r#"
[server]
port = 8088

[booking]
min_lead_minutes = 30

[payments.paystack]
secret_key = "sk_test_file"
"#
    )?;

    let cfg: ApiConfig = load_config_with_env(Some(file.path()), Some(vars(&[])))?;
    assert_eq!(cfg.server.port, 8088);
    assert_eq!(cfg.booking.min_lead_minutes, 30);
    assert_eq!(cfg.booking.max_advance_days, 90);
    assert_eq!(cfg.payments.paystack.secret_key, "sk_test_file");
    assert_eq!(cfg.pricing.tiers.len(), 4);
    Ok(())
}

#[test]
fn environment_overrides_file() -> Result<(), Box<dyn std::error::Error>> {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile()?;
    writeln!(file, "[server]\nport = 8088")?;

    let env = vars(&[
        ("WAYFARE__SERVER__PORT", "9099"),
        ("WAYFARE__PAYMENTS__PAYSTACK__SECRET_KEY", "sk_test_env"),
        ("WAYFARE__DATABASE__URL", "ws://db:8000"),
    ]);
    let cfg: ApiConfig = load_config_with_env(Some(file.path()), Some(env))?;

    assert_eq!(cfg.server.port, 9099);
    assert_eq!(cfg.payments.paystack.secret_key, "sk_test_env");
    assert_eq!(cfg.database.url, "ws://db:8000");
    Ok(())
}

#[test]
fn missing_explicit_file_is_an_error() {
    let result = load_config::<ApiConfig>(Some("/definitely/not/here/server.toml"));
    assert!(result.is_err());
}
