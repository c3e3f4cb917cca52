//! # Wayfare Server
//!
//! The ride booking HTTP API built on `Axum` and `SurrealDB`.
//!
//! ## Example
//! ```no_run
//! use wayfare_server::Server;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Server::builder()
//!         .port(4583)
//!         .build()
//!         .await?
//!         .run()
//!         .await
//! }
//! ```

mod router;

use anyhow::{Context, Result, anyhow};
use axum::Router;
use axum_server::Handle;
use axum_server::tls_rustls::RustlsConfig;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};
use wayfare::domain::config::ApiConfig;
use wayfare::kernel::server::ApiState;
use wayfare_database::Database;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// A fluent builder for configuring and initializing the [`Server`].
#[must_use = "builders do nothing unless you call .build()"]
#[derive(Debug, Default)]
pub struct ServerBuilder {
    cfg: ApiConfig,
}

impl ServerBuilder {
    /// Set up the server's configuration.
    pub fn config(mut self, cfg: ApiConfig) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.cfg.server.port = port;
        self
    }

    async fn init_database(&self) -> Result<Database> {
        let db_cfg = &self.cfg.database;
        let mut builder = Database::builder()
            .url(&db_cfg.url)
            .session(&db_cfg.namespace, &db_cfg.database)
            .migrations(wayfare::migrations());

        if let Some(creds) = &db_cfg.credentials {
            builder = builder.auth(&creds.username, &creds.password);
        }

        builder.init().await.context("Failed to establish database connection")
    }

    fn validate_ssl_config(&self) -> Result<()> {
        if let Some(ssl) = &self.cfg.server.ssl {
            if !ssl.cert.exists() {
                anyhow::bail!("SSL certificate not found at: {}", ssl.cert.display());
            }
            if !ssl.key.exists() {
                anyhow::bail!("SSL key not found at: {}", ssl.key.display());
            }

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let metadata = ssl.key.metadata()?;
                if metadata.permissions().mode() & 0o077 != 0 {
                    tracing::warn!(
                        "SECURITY: SSL Private Key {} has insecure permissions (should be 600)",
                        ssl.key.display()
                    );
                }
            }
        }
        Ok(())
    }

    /// Consumes the builder and initializes the server.
    ///
    /// # Process
    /// 1. Checks the TLS certificate and key when TLS is configured
    /// 2. Connects to the database and applies every slice's migrations
    /// 3. Initializes the feature slices (identity, booking, payments, contact)
    /// 4. Registers them on the application state
    ///
    /// # Errors
    /// Returns an error if:
    /// * the TLS files are missing
    /// * the database is unreachable, rejects the credentials or a migration fails
    /// * a slice rejects its configuration (for example an empty JWT secret)
    pub async fn build(self) -> Result<Server> {
        self.validate_ssl_config()?;

        let address = SocketAddr::new(self.cfg.server.address, self.cfg.server.port);
        info!(address = %address, "Initializing server");

        let db = self.init_database().await?;

        let slices =
            wayfare::init(&self.cfg, &db).map_err(|e| anyhow!("Platform bootstrap failed: {e}"))?;

        let state = slices
            .into_iter()
            .fold(ApiState::builder().config(self.cfg).db(db), |builder, slice| {
                builder.register_slice(slice)
            })
            .build()
            .context("Failed to finalize API state registry")?;
        info!(slices = ?state.slice_names(), "Feature slices ready");
        Ok(Server { state })
    }
}

/// A fully initialized server instance ready to run.
#[must_use = "call .run().await to start the server"]
#[derive(Debug)]
pub struct Server {
    state: ApiState,
}

impl Server {
    /// Returns a new [`ServerBuilder`] to configure the server.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    /// The complete application router: system and slice routes, docs, tracing and CORS.
    pub fn router(&self) -> Router {
        router::init(self.state.clone())
    }

    /// Serves HTTP, or HTTPS when `server.ssl` is set, until Ctrl+C or SIGTERM.
    ///
    /// In-flight requests get 30 seconds to finish after the signal.
    ///
    /// # Errors
    /// Returns an error if the certificates cannot be loaded or the address cannot be bound.
    pub async fn run(self) -> Result<()> {
        let server_cfg = self.state.config.server.clone();
        let address = SocketAddr::new(server_cfg.address, server_cfg.port);
        let service = self.router().into_make_service();

        let handle = Handle::<SocketAddr>::new();
        tokio::spawn(drain_on_signal(handle.clone()));

        match &server_cfg.ssl {
            Some(ssl) => {
                let tls = RustlsConfig::from_pem_file(&ssl.cert, &ssl.key)
                    .await
                    .context("Failed to load SSL/TLS certificates")?;
                info!("Booking API listening on https://{address}");
                axum_server::bind_rustls(address, tls)
                    .handle(handle)
                    .serve(service)
                    .await
                    .context("HTTPS server failed")?;
            },
            None => {
                info!("Booking API listening on http://{address}");
                axum_server::bind(address)
                    .handle(handle)
                    .serve(service)
                    .await
                    .context("HTTP server failed")?;
            },
        }

        info!("Server shutdown complete");
        Ok(())
    }

    /// Returns a reference to the application state.
    #[must_use]
    pub const fn state(&self) -> &ApiState {
        &self.state
    }
}

async fn drain_on_signal(handle: Handle<SocketAddr>) {
    match shutdown_signal().await {
        Ok(signal) => {
            info!(signal, "Draining connections before shutdown");
            handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
        },
        Err(e) => error!("Error while waiting for shutdown signal: {e:#}"),
    }
}

/// Waits for Ctrl+C or, on unix, SIGTERM, and names the one received.
async fn shutdown_signal() -> Result<&'static str> {
    let ctrl_c = async { signal::ctrl_c().await.context("Failed to install Ctrl+C handler") };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("Failed to install SIGTERM handler")?
            .recv()
            .await;
        Ok::<_, anyhow::Error>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<()>>();

    tokio::select! {
        res = ctrl_c => res.map(|()| "SIGINT"),
        res = terminate => res.map(|()| "SIGTERM"),
    }
}
