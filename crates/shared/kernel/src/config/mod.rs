use config::{Config, Environment, File, Map};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::Path;
use tracing::info;

/// Prefix of environment overrides (`WAYFARE__PAYMENTS__PAYSTACK__SECRET_KEY`).
pub const ENV_PREFIX: &str = "WAYFARE";
const ENV_SEPARATOR: &str = "__";
const DEFAULT_FILE: &str = "server";
const LIST_KEYS: [&str; 2] = ["security.identity.admin_emails", "server.cors_origins"];

#[wayfare_derive::wayfare_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// Loads configuration from a file overlaid with `WAYFARE__` environment variables.
///
/// * With `Some(path)`, the file must exist; its format follows the extension.
/// * With `None`, `server.{toml,json,..}` in the working directory is used when present, so a
///   container can run on defaults and environment variables alone.
///
/// Nested keys are separated by `__` (`WAYFARE__DATABASE__URL` maps to `database.url`).
/// `admin_emails` and `cors_origins` accept comma separated lists.
///
/// # Errors
/// Returns [`ConfigError::Config`] if the file is missing or malformed, or if the merged values
/// do not deserialize into `T`.
///
/// # Example
/// ```rust
/// use wayfare_kernel::config::load_config;
///
/// #[derive(Default, serde::Deserialize)]
/// struct AppConfig {
///     port: u16,
/// }
///
/// let cfg: AppConfig = load_config(Some("config/local.toml")).unwrap_or_default();
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    load_config_with_env(path, None)
}

/// Same as [`load_config`], but reads overrides from `vars` instead of the process environment
/// when given. Keys keep the `WAYFARE__` form.
///
/// # Errors
/// See [`load_config`].
pub fn load_config_with_env<T>(
    path: Option<impl AsRef<Path>>,
    vars: Option<Map<String, String>>,
) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let file = match &path {
        Some(path) => {
            info!("Loading config from {}", path.as_ref().display());
            File::from(path.as_ref()).required(true)
        },
        None => {
            info!("Loading optional config file '{DEFAULT_FILE}'");
            File::with_name(DEFAULT_FILE).required(false)
        },
    };

    let environment = LIST_KEYS.iter().fold(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .convert_case(config::Case::Snake)
            .try_parsing(true)
            .list_separator(",")
            .source(vars),
        |env, key| env.with_list_parse_key(key),
    );

    let config = Config::builder()
        .add_source(file)
        .add_source(environment)
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")?;

    Ok(config)
}
