use anyhow::Context;
use wayfare::domain::config::ApiConfig;
use wayfare::kernel::config::load_config;
use wayfare_logger::Logger;
use wayfare_server::Server;

/// Directory for rolling log files; console only when unset.
const LOG_DIR_VAR: &str = "WAYFARE_LOG_DIR";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let logger = Logger::builder().name(env!("CARGO_PKG_NAME"));
    let _log = match std::env::var_os(LOG_DIR_VAR) {
        Some(dir) => logger.path(dir).init()?,
        None => logger.init()?,
    };

    let cfg: ApiConfig =
        load_config(None::<&str>).context("Critical: Configuration is malformed")?;

    Server::builder().config(cfg).build().await?.run().await
}
