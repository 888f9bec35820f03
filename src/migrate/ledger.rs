use crate::{Connection, Result};
use std::collections::HashSet;

/// The persisted record of applied migrations.
///
/// One row per applied identifier, inserted on success and deleted only by
/// an explicit rollback. The UNIQUE constraint on `identifier` is the only
/// safeguard against two racing runs applying the same unit.
pub struct Ledger<'conn> {
    connection: &'conn Connection,
    table_name: String,
}

impl<'conn> Ledger<'conn> {
    pub fn new(connection: &'conn Connection) -> Self {
        Self {
            connection,
            table_name: "schema_migrations".to_string(),
        }
    }

    pub fn with_table_name(mut self, table_name: &str) -> Self {
        self.table_name = table_name.to_string();
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Idempotently creates the tracking table.
    pub async fn ensure_schema(&self) -> Result<()> {
        let sql = self.connection.ledger_table_sql(&self.table_name)?;
        self.connection.execute_batch(&sql).await
    }

    /// All recorded identifiers. No ordering guarantee; callers re-sort.
    pub async fn applied_identifiers(&self) -> Result<HashSet<String>> {
        let sql = format!("SELECT identifier FROM {}", self.table_name);
        let identifiers = self.connection.fetch_strings(&sql).await?;

        Ok(identifiers.into_iter().collect())
    }

    /// Inserts a ledger row. Must only be called inside the executor's
    /// transaction; the ledger has no transaction boundary of its own.
    pub(crate) async fn record(&self, identifier: &str) -> Result<()> {
        let sql = format!(
            "INSERT INTO {} (identifier) VALUES ({})",
            self.table_name,
            self.connection.placeholder(1)?
        );
        self.connection.execute(&sql, &[identifier]).await?;

        Ok(())
    }

    /// Deletes a ledger row, returning the number of rows removed. Same
    /// transactional contract as [`Ledger::record`].
    pub(crate) async fn unrecord(&self, identifier: &str) -> Result<u64> {
        let sql = format!(
            "DELETE FROM {} WHERE identifier = {}",
            self.table_name,
            self.connection.placeholder(1)?
        );

        self.connection.execute(&sql, &[identifier]).await
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::Ledger;
    use crate::Connection;

    async fn connection() -> Connection {
        Connection::create_from_dsn("sqlite://:memory:")
            .unwrap()
            .connect()
            .await
            .expect("unable to connect")
    }

    #[tokio::test]
    async fn ensure_schema_is_idempotent() {
        let connection = connection().await;
        let ledger = Ledger::new(&connection);

        ledger.ensure_schema().await.unwrap();
        ledger.ensure_schema().await.unwrap();

        assert!(ledger.applied_identifiers().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn records_and_unrecords_identifiers() {
        let connection = connection().await;
        let ledger = Ledger::new(&connection);
        ledger.ensure_schema().await.unwrap();

        ledger.record("001_init.sql").await.unwrap();
        ledger.record("002_add_col.sql").await.unwrap();

        let applied = ledger.applied_identifiers().await.unwrap();
        assert_eq!(applied.len(), 2);
        assert!(applied.contains("001_init.sql"));

        let removed = ledger.unrecord("001_init.sql").await.unwrap();
        assert_eq!(removed, 1);

        let applied = ledger.applied_identifiers().await.unwrap();
        assert_eq!(applied.len(), 1);
        assert!(applied.contains("002_add_col.sql"));
    }

    #[tokio::test]
    async fn duplicate_record_violates_uniqueness() {
        let connection = connection().await;
        let ledger = Ledger::new(&connection);
        ledger.ensure_schema().await.unwrap();

        ledger.record("001_init.sql").await.unwrap();
        assert!(ledger.record("001_init.sql").await.is_err());
    }

    #[tokio::test]
    async fn custom_table_name() {
        let connection = connection().await;
        let ledger = Ledger::new(&connection).with_table_name("history");
        ledger.ensure_schema().await.unwrap();

        assert_eq!(ledger.table_name(), "history");
        ledger.record("001_init.sql").await.unwrap();
        assert_eq!(ledger.applied_identifiers().await.unwrap().len(), 1);
    }
}
