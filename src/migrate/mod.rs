mod catalog;
mod executor;
mod ledger;

pub use catalog::{Catalog, MigrationUnit, ROLLBACK_PREFIX};
pub use executor::Executor;
pub use ledger::Ledger;

use crate::{Connection, Result};
use log::{error, info};

/// Outcome of a single-unit rollback. A missing rollback artifact is a
/// skipped no-op, not an error; rollback is an opt-in per-migration
/// capability.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RollbackOutcome {
    RolledBack,
    Skipped,
}

#[derive(Clone, Debug)]
pub struct StatusEntry {
    pub identifier: String,
    pub applied: bool,
}

#[derive(Clone, Debug)]
pub struct MigrationStatus {
    pub entries: Vec<StatusEntry>,
    pub total: usize,
    pub applied: usize,
    pub pending: usize,
}

/// Orchestrates a migration run: reads the ledger, diffs it against the
/// catalog and applies each pending unit in order through the executor.
pub struct Migrator {
    catalog: Catalog,
}

impl Migrator {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    /// Applies all pending migrations in strictly ascending identifier
    /// order, one at a time, and returns the number applied.
    ///
    /// With a `target`, only identifiers lexically `<=` the target are
    /// considered. The first failing unit aborts the run; units applied
    /// before it stay applied, each was its own committed transaction.
    pub async fn migrate(&self, connection: &Connection, target: Option<&str>) -> Result<usize> {
        let ledger = Ledger::new(connection);
        ledger.ensure_schema().await?;

        let applied = ledger.applied_identifiers().await?;
        let units = self.catalog.list_units().await?;

        let pending: Vec<MigrationUnit> = units
            .into_iter()
            .filter(|unit| !applied.contains(unit.identifier()))
            .filter(|unit| target.is_none_or(|target| unit.identifier() <= target))
            .collect();

        if pending.is_empty() {
            info!(target: "stratum::migrate", "No pending migrations.");
            return Ok(0);
        }

        info!(
            target: "stratum::migrate",
            "Found {} pending migration(s)",
            pending.len()
        );

        let executor = Executor::new(connection);
        for unit in &pending {
            if let Err(e) = executor.apply(unit, &ledger).await {
                error!(
                    target: "stratum::migrate",
                    "Error while executing migration {}: {e}",
                    unit.identifier()
                );

                return Err(e);
            }
        }

        Ok(pending.len())
    }

    /// Reverts exactly one migration by identifier, if a rollback artifact
    /// exists for it. Does not cascade to later migrations that may depend
    /// on it; that remains an operator decision.
    pub async fn rollback(
        &self,
        connection: &Connection,
        identifier: &str,
    ) -> Result<RollbackOutcome> {
        let Some(artifact) = self.catalog.rollback_artifact(identifier).await? else {
            info!(
                target: "stratum::migrate",
                "No rollback artifact for {identifier}, skipping"
            );

            return Ok(RollbackOutcome::Skipped);
        };

        let rollback_sql = tokio::fs::read_to_string(&artifact).await?;

        let ledger = Ledger::new(connection);
        ledger.ensure_schema().await?;

        Executor::new(connection)
            .revert(identifier, &rollback_sql, &ledger)
            .await?;

        Ok(RollbackOutcome::RolledBack)
    }

    /// Reports every catalog unit with its applied flag, plus summary
    /// counts. Ensures the ledger schema first so status works on a fresh
    /// database; otherwise read-only.
    pub async fn status(&self, connection: &Connection) -> Result<MigrationStatus> {
        let ledger = Ledger::new(connection);
        ledger.ensure_schema().await?;

        let applied = ledger.applied_identifiers().await?;
        let units = self.catalog.list_units().await?;

        let entries: Vec<StatusEntry> = units
            .iter()
            .map(|unit| StatusEntry {
                identifier: unit.identifier().to_string(),
                applied: applied.contains(unit.identifier()),
            })
            .collect();

        let applied_count = entries.iter().filter(|entry| entry.applied).count();

        Ok(MigrationStatus {
            total: entries.len(),
            applied: applied_count,
            pending: entries.len() - applied_count,
            entries,
        })
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::{Catalog, Ledger, Migrator, RollbackOutcome};
    use crate::Connection;
    use std::path::Path;

    async fn connection() -> Connection {
        Connection::create_from_dsn("sqlite://:memory:")
            .unwrap()
            .connect()
            .await
            .expect("unable to connect")
    }

    fn write(directory: &Path, name: &str, sql: &str) {
        std::fs::write(directory.join(name), sql).unwrap();
    }

    fn two_file_catalog(directory: &Path) {
        write(directory, "001_init.sql", "CREATE TABLE users (id INTEGER);");
        write(
            directory,
            "002_add_col.sql",
            "ALTER TABLE users ADD COLUMN name TEXT;",
        );
    }

    #[tokio::test]
    async fn migrates_fresh_database_in_order() {
        let dir = tempfile::tempdir().unwrap();
        two_file_catalog(dir.path());

        let connection = connection().await;
        let migrator = Migrator::new(Catalog::new(dir.path()));

        let count = migrator.migrate(&connection, None).await.unwrap();
        assert_eq!(count, 2);

        let applied = Ledger::new(&connection).applied_identifiers().await.unwrap();
        assert!(applied.contains("001_init.sql"));
        assert!(applied.contains("002_add_col.sql"));
    }

    #[tokio::test]
    async fn second_run_applies_nothing() {
        let dir = tempfile::tempdir().unwrap();
        two_file_catalog(dir.path());

        let connection = connection().await;
        let migrator = Migrator::new(Catalog::new(dir.path()));

        assert_eq!(migrator.migrate(&connection, None).await.unwrap(), 2);
        assert_eq!(migrator.migrate(&connection, None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn applies_only_units_missing_from_the_ledger() {
        let dir = tempfile::tempdir().unwrap();
        two_file_catalog(dir.path());

        let connection = connection().await;
        let migrator = Migrator::new(Catalog::new(dir.path()));

        // Pre-seed the ledger as if 001 had already run.
        let ledger = Ledger::new(&connection);
        ledger.ensure_schema().await.unwrap();
        ledger.record("001_init.sql").await.unwrap();
        connection
            .execute_batch("CREATE TABLE users (id INTEGER)")
            .await
            .unwrap();

        let count = migrator.migrate(&connection, None).await.unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn target_bounds_the_pending_set() {
        let dir = tempfile::tempdir().unwrap();
        two_file_catalog(dir.path());

        let connection = connection().await;
        let migrator = Migrator::new(Catalog::new(dir.path()));

        let count = migrator
            .migrate(&connection, Some("001_init.sql"))
            .await
            .unwrap();
        assert_eq!(count, 1);

        let applied = Ledger::new(&connection).applied_identifiers().await.unwrap();
        assert!(applied.contains("001_init.sql"));
        assert!(!applied.contains("002_add_col.sql"));
    }

    #[tokio::test]
    async fn fails_fast_and_keeps_earlier_units_applied() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "001_init.sql", "CREATE TABLE users (id INTEGER);");
        write(dir.path(), "002_broken.sql", "INSERT INTO missing VALUES (1);");
        write(dir.path(), "003_never.sql", "CREATE TABLE never (id INTEGER);");

        let connection = connection().await;
        let migrator = Migrator::new(Catalog::new(dir.path()));

        assert!(migrator.migrate(&connection, None).await.is_err());

        let applied = Ledger::new(&connection).applied_identifiers().await.unwrap();
        assert!(applied.contains("001_init.sql"));
        assert!(!applied.contains("002_broken.sql"));
        assert!(!applied.contains("003_never.sql"));
    }

    #[tokio::test]
    async fn status_reports_entries_and_counts() {
        let dir = tempfile::tempdir().unwrap();
        two_file_catalog(dir.path());

        let connection = connection().await;
        let migrator = Migrator::new(Catalog::new(dir.path()));

        migrator
            .migrate(&connection, Some("001_init.sql"))
            .await
            .unwrap();

        let status = migrator.status(&connection).await.unwrap();

        assert_eq!(status.total, 2);
        assert_eq!(status.applied, 1);
        assert_eq!(status.pending, 1);
        assert_eq!(status.entries[0].identifier, "001_init.sql");
        assert!(status.entries[0].applied);
        assert_eq!(status.entries[1].identifier, "002_add_col.sql");
        assert!(!status.entries[1].applied);
    }

    #[tokio::test]
    async fn status_works_before_any_migration() {
        let dir = tempfile::tempdir().unwrap();
        two_file_catalog(dir.path());

        let connection = connection().await;
        let migrator = Migrator::new(Catalog::new(dir.path()));

        let status = migrator.status(&connection).await.unwrap();

        assert_eq!(status.total, 2);
        assert_eq!(status.applied, 0);
        assert_eq!(status.pending, 2);
    }

    #[tokio::test]
    async fn rollback_without_artifact_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        two_file_catalog(dir.path());

        let connection = connection().await;
        let migrator = Migrator::new(Catalog::new(dir.path()));
        migrator.migrate(&connection, None).await.unwrap();

        let outcome = migrator
            .rollback(&connection, "002_add_col.sql")
            .await
            .unwrap();
        assert_eq!(outcome, RollbackOutcome::Skipped);

        // Ledger untouched by the no-op.
        let applied = Ledger::new(&connection).applied_identifiers().await.unwrap();
        assert_eq!(applied.len(), 2);
    }

    #[tokio::test]
    async fn rollback_removes_exactly_one_entry() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "001_init.sql", "CREATE TABLE users (id INTEGER);");
        write(dir.path(), "002_posts.sql", "CREATE TABLE posts (id INTEGER);");
        write(dir.path(), "rollback_002_posts.sql", "DROP TABLE posts;");

        let connection = connection().await;
        let migrator = Migrator::new(Catalog::new(dir.path()));
        migrator.migrate(&connection, None).await.unwrap();

        let outcome = migrator
            .rollback(&connection, "002_posts.sql")
            .await
            .unwrap();
        assert_eq!(outcome, RollbackOutcome::RolledBack);

        let applied = Ledger::new(&connection).applied_identifiers().await.unwrap();
        assert!(applied.contains("001_init.sql"));
        assert!(!applied.contains("002_posts.sql"));

        // The rolled-back unit is pending again.
        let status = migrator.status(&connection).await.unwrap();
        assert_eq!(status.pending, 1);
    }
}
