//! # Database Infrastructure
//!
//! Initializes and shares a [SurrealDB](https://surrealdb.com) connection across the workspace.
//!
//! ## Key Features
//! - **Engine Agnostic**: `mem://`, `rocksdb://`, `ws://` and `http://` through the `any` engine.
//! - **Resilient Connectivity**: health checks with exponential back-off during start-up.
//! - **Migrations**: each feature slice ships schema scripts that are applied once and
//!   checksummed.
//!
//! ## Example
//!
//! ```rust
//! use wayfare_database::{Database, DatabaseError, Migration};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), DatabaseError> {
//!     let db = Database::builder()
//!         .url("mem://")
//!         .session("wayfare", "core")
//!         .migrations([Migration::new("booking", "001", "DEFINE TABLE booking SCHEMALESS;")])
//!         .init()
//!         .await?;
//!
//!     let _version = db.version().await?;
//!     Ok(())
//! }
//! ```

mod error;
mod migrations;

pub use error::{DatabaseError, DatabaseErrorExt};
pub use migrations::{AppliedMigration, Migration, MigrationReport};

use migrations::MigrationRunner;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;
use surrealdb::Surreal;
use surrealdb::engine::any::{Any, connect};
use surrealdb::opt::auth::Root;
use tracing::{info, instrument, trace, warn};

const HEALTH_ATTEMPTS: u32 = 3;
const HEALTH_INITIAL_DELAY: Duration = Duration::from_millis(500);

/// Inner state of the [`Database`] wrapper.
#[derive(Debug)]
pub struct DatabaseInner {
    instance: Surreal<Any>,
    ns: String,
    db: String,
}

impl Drop for DatabaseInner {
    fn drop(&mut self) {
        info!(ns = %self.ns, db = %self.db, "SurrealDB session handle dropped");
    }
}

/// Cheap-to-clone `SurrealDB` handle with a selected namespace and database.
#[derive(Debug, Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

impl Database {
    /// Creates a new [`DatabaseBuilder`].
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::new()
    }

    /// Applies migrations that have not been recorded yet.
    ///
    /// # Errors
    /// * [`DatabaseError::Migration`] if a recorded migration was edited afterwards.
    /// * [`DatabaseError::Surreal`] if a script fails; the script's transaction is rolled back.
    pub async fn migrate(&self, migrations: &[Migration]) -> Result<MigrationReport, DatabaseError> {
        let report = MigrationRunner::new(&self.inner.instance).run(migrations).await?;

        for skipped in &report.skipped {
            trace!(slice = %skipped.slice, version = %skipped.version, "Migration already applied");
        }
        for applied in &report.applied {
            info!(slice = %applied.slice, version = %applied.version, "Applied migration");
        }

        Ok(report)
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.inner.ns
    }

    #[must_use]
    pub fn database(&self) -> &str {
        &self.inner.db
    }
}

impl Deref for Database {
    type Target = Surreal<Any>;

    fn deref(&self) -> &Self::Target {
        &self.inner.instance
    }
}

/// A fluent builder for configuring and establishing a `SurrealDB` connection.
#[must_use = "builders do nothing unless you call .init()"]
#[derive(Debug, Default)]
pub struct DatabaseBuilder {
    url: Option<String>,
    ns: Option<String>,
    db: Option<String>,
    auth: Option<(String, String)>,
    migrations: Vec<Migration>,
}

impl DatabaseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the connection URL.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the namespace and database name.
    pub fn session(mut self, namespace: impl Into<String>, database: impl Into<String>) -> Self {
        self.ns = Some(namespace.into());
        self.db = Some(database.into());
        self
    }

    /// Signs in as a root user after connecting.
    pub fn auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some((username.into(), password.into()));
        self
    }

    /// Adds migrations to apply during [`init`](Self::init), in iteration order.
    pub fn migrations(mut self, migrations: impl IntoIterator<Item = Migration>) -> Self {
        self.migrations.extend(migrations);
        self
    }

    /// Connects, checks health, signs in, selects the session and applies migrations.
    ///
    /// Health is probed up to three times, doubling the delay from 500 ms.
    ///
    /// # Errors
    /// * [`DatabaseError::Validation`] if URL, namespace or database are missing.
    /// * [`DatabaseError::Connection`] if the engine fails to start or stays unhealthy.
    /// * [`DatabaseError::Auth`] if the root credentials are rejected.
    /// * [`DatabaseError::Surreal`] / [`DatabaseError::Migration`] if the session or a
    ///   migration fails.
    #[instrument(skip(self), fields(url = self.url, ns = self.ns, db = self.db))]
    pub async fn init(self) -> Result<Database, DatabaseError> {
        let url = self.url.ok_or(DatabaseError::Validation {
            message: "URL is required".into(),
            context: None,
        })?;
        let ns = self.ns.ok_or(DatabaseError::Validation {
            message: "Namespace is required".into(),
            context: None,
        })?;
        let db = self.db.ok_or(DatabaseError::Validation {
            message: "Database is required".into(),
            context: None,
        })?;

        let instance = connect(&url).await.map_err(|e| DatabaseError::Connection {
            message: e.to_string().into(),
            context: Some("Initializing engine".into()),
        })?;

        let mut delay = HEALTH_INITIAL_DELAY;
        for attempt in 1..=HEALTH_ATTEMPTS {
            if instance.health().await.is_ok() {
                break;
            }
            if attempt == HEALTH_ATTEMPTS {
                return Err(DatabaseError::Connection {
                    message: "Unhealthy after retries".into(),
                    context: Some(url.into()),
                });
            }
            warn!(attempt, ?delay, "Database not ready, retrying...");
            tokio::time::sleep(delay).await;
            delay *= 2;
        }

        if let Some((username, password)) = &self.auth {
            instance.signin(Root { username, password }).await.map_err(|e| {
                DatabaseError::Auth { message: e.to_string().into(), context: Some(url.clone().into()) }
            })?;
        }

        instance.use_ns(&ns).use_db(&db).await.context("Activating session")?;

        let version =
            instance.version().await.map_or_else(|_| "unknown".to_owned(), |v| v.to_string());
        info!(namespace = %ns, database = %db, %version, "SurrealDB connection established");

        let database = Database { inner: Arc::new(DatabaseInner { instance, ns, db }) };
        database.migrate(&self.migrations).await?;

        Ok(database)
    }
}
