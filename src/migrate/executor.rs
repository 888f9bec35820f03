use crate::migrate::catalog::MigrationUnit;
use crate::migrate::ledger::Ledger;
use crate::{Connection, Error, Result};
use log::info;

/// Applies or reverts a single migration unit transactionally.
///
/// The unit's statements and the matching ledger write share one transaction
/// boundary, so a unit is either fully applied and recorded, or neither.
/// Ledger state and schema state never diverge.
pub struct Executor<'conn> {
    connection: &'conn Connection,
}

impl<'conn> Executor<'conn> {
    pub fn new(connection: &'conn Connection) -> Self {
        Self { connection }
    }

    pub async fn apply(&self, unit: &MigrationUnit, ledger: &Ledger<'conn>) -> Result<()> {
        let identifier = unit.identifier();
        info!(target: "stratum::migrate", "++ applying {identifier}");

        let source = unit
            .source()
            .await
            .map_err(|e| Error::execution(identifier, e))?;

        let start = chrono::Utc::now();
        self.connection.begin_transaction().await?;

        match self.apply_in_transaction(&source, identifier, ledger).await {
            Ok(()) => {
                self.connection.commit().await?;

                let elapsed = chrono::Utc::now() - start;
                info!(
                    target: "stratum::migrate",
                    "++ applied {identifier} in {}ms",
                    elapsed.num_milliseconds()
                );

                Ok(())
            }
            Err(e) => {
                self.connection.roll_back().await?;
                Err(Error::execution(identifier, e))
            }
        }
    }

    async fn apply_in_transaction(
        &self,
        source: &str,
        identifier: &str,
        ledger: &Ledger<'conn>,
    ) -> Result<()> {
        self.connection.execute_batch(source).await?;
        ledger.record(identifier).await?;

        Ok(())
    }

    pub async fn revert(
        &self,
        identifier: &str,
        rollback_sql: &str,
        ledger: &Ledger<'conn>,
    ) -> Result<()> {
        info!(target: "stratum::migrate", "-- reverting {identifier}");

        self.connection.begin_transaction().await?;

        match self
            .revert_in_transaction(rollback_sql, identifier, ledger)
            .await
        {
            Ok(()) => {
                self.connection.commit().await?;
                info!(target: "stratum::migrate", "-- reverted {identifier}");

                Ok(())
            }
            Err(e) => {
                self.connection.roll_back().await?;
                Err(Error::rollback(identifier, e))
            }
        }
    }

    async fn revert_in_transaction(
        &self,
        rollback_sql: &str,
        identifier: &str,
        ledger: &Ledger<'conn>,
    ) -> Result<()> {
        self.connection.execute_batch(rollback_sql).await?;
        ledger.unrecord(identifier).await?;

        Ok(())
    }
}
