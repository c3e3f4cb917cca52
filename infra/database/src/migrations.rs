use crate::error::{DatabaseError, DatabaseErrorExt};
use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use surrealdb::Surreal;
use surrealdb::engine::any::Any;

const MIGRATION_TABLE: &str = "migration";

/// A schema script owned by a feature slice.
///
/// Migrations are applied once, in the order they are registered, and identified by
/// `slice:version`. Editing an applied script is detected through its checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Migration {
    pub slice: &'static str,
    pub version: &'static str,
    pub script: &'static str,
}

impl Migration {
    #[must_use]
    pub const fn new(slice: &'static str, version: &'static str, script: &'static str) -> Self {
        Self { slice, version, script }
    }

    #[must_use]
    pub fn key(&self) -> String {
        format!("{}:{}", self.slice, self.version)
    }

    /// SHA-256 of the script, hex encoded.
    #[must_use]
    pub fn checksum(&self) -> String {
        hex::encode(Sha256::digest(self.script.as_bytes()))
    }

    fn to_applied(self) -> AppliedMigration {
        AppliedMigration {
            slice: self.slice.to_owned(),
            version: self.version.to_owned(),
            checksum: self.checksum(),
        }
    }
}

/// A row of the `migration` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedMigration {
    pub slice: String,
    pub version: String,
    pub checksum: String,
}

/// Outcome of a migration run.
#[derive(Debug, Default)]
pub struct MigrationReport {
    pub applied: Vec<AppliedMigration>,
    pub skipped: Vec<AppliedMigration>,
}

#[derive(Debug)]
pub(crate) struct MigrationRunner<'a> {
    db: &'a Surreal<Any>,
}

impl<'a> MigrationRunner<'a> {
    pub(crate) const fn new(db: &'a Surreal<Any>) -> Self {
        Self { db }
    }

    pub(crate) async fn run(
        &self,
        migrations: &[Migration],
    ) -> Result<MigrationReport, DatabaseError> {
        let mut report = MigrationReport::default();
        let applied = self.applied_map().await?;

        for migration in migrations {
            if let Some(existing) = applied.get(&migration.key()) {
                ensure_checksum_match(migration, &existing.checksum)?;
                report.skipped.push(migration.to_applied());
                continue;
            }

            self.apply(migration).await?;
            report.applied.push(migration.to_applied());
        }

        Ok(report)
    }

    async fn apply(&self, migration: &Migration) -> Result<(), DatabaseError> {
        let query = format!(
            "BEGIN TRANSACTION;
            {}
            UPSERT type::thing('{MIGRATION_TABLE}', $key) CONTENT {{
                slice: $slice,
                version: $version,
                checksum: $checksum,
                applied_at: time::now()
            }};
            COMMIT TRANSACTION;",
            migration.script,
        );

        self.db
            .query(query)
            .bind(("key", migration.key()))
            .bind(("slice", migration.slice))
            .bind(("version", migration.version))
            .bind(("checksum", migration.checksum()))
            .await
            .and_then(|response| response.check())
            .context(format!("Applying migration {}", migration.key()))?;

        Ok(())
    }

    async fn applied_map(&self) -> Result<FxHashMap<String, AppliedMigration>, DatabaseError> {
        let rows: Vec<AppliedMigration> =
            self.db.select(MIGRATION_TABLE).await.context("Loading applied migrations")?;

        Ok(rows.into_iter().map(|row| (format!("{}:{}", row.slice, row.version), row)).collect())
    }
}

fn ensure_checksum_match(migration: &Migration, recorded: &str) -> Result<(), DatabaseError> {
    let current = migration.checksum();
    if recorded != current {
        return Err(DatabaseError::Migration {
            message: format!(
                "Checksum mismatch for {} (recorded {recorded}, current {current})",
                migration.key()
            )
            .into(),
            context: Some("Applied migrations must not be edited".into()),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_is_stable_and_script_sensitive() {
        let a = Migration::new("booking", "001", "DEFINE TABLE booking SCHEMALESS;");
        let b = Migration::new("booking", "001", "DEFINE TABLE booking SCHEMAFULL;");

        assert_eq!(a.checksum(), a.checksum());
        assert_eq!(a.checksum().len(), 64);
        assert_ne!(a.checksum(), b.checksum());
        assert_eq!(a.key(), "booking:001");
    }

    #[test]
    fn checksum_mismatch_is_rejected() {
        let migration = Migration::new("user", "001", "DEFINE TABLE user SCHEMALESS;");
        let err = ensure_checksum_match(&migration, "deadbeef").unwrap_err();
        assert!(matches!(err, DatabaseError::Migration { .. }));
        assert!(ensure_checksum_match(&migration, &migration.checksum()).is_ok());
    }
}
