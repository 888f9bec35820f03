use crate::driver::Driver;
use crate::{ConnectionOptions, Error, Result};

/// A lazily-established database connection.
///
/// Created from a DSN, connected once with [`Connection::connect`], and then
/// held for the whole duration of a migration run. All statement execution
/// and transaction control goes through this facade; the scheme-selected
/// driver supplies the platform-specific pieces.
pub struct Connection {
    connection_options: ConnectionOptions,
    driver: Option<Driver>,
}

impl Connection {
    pub fn create(connection_options: ConnectionOptions) -> Self {
        Self {
            connection_options,
            driver: None,
        }
    }

    pub fn create_from_dsn(dsn: &str) -> Result<Self> {
        Ok(Self::create(ConnectionOptions::try_from(dsn)?))
    }

    pub fn is_connected(&self) -> bool {
        self.driver.is_some()
    }

    pub async fn connect(mut self) -> Result<Self> {
        if self.driver.is_some() {
            return Ok(self);
        }

        let driver = Driver::create(&self.connection_options).await?;
        let _ = self.driver.insert(driver);

        Ok(self)
    }

    fn driver(&self) -> Result<&Driver> {
        self.driver.as_ref().ok_or_else(Error::not_connected)
    }

    /// Executes one or more `;`-separated statements without parameters.
    pub async fn execute_batch(&self, sql: &str) -> Result<()> {
        self.driver()?.execute_batch(sql).await
    }

    /// Executes a single statement with positional string parameters,
    /// returning the number of affected rows.
    pub async fn execute(&self, sql: &str, params: &[&str]) -> Result<u64> {
        self.driver()?.execute(sql, params).await
    }

    /// Runs a query and collects the first column of every row as a string.
    pub async fn fetch_strings(&self, sql: &str) -> Result<Vec<String>> {
        self.driver()?.fetch_strings(sql).await
    }

    /// Positional parameter placeholder in this platform's syntax, 1-based.
    pub fn placeholder(&self, index: usize) -> Result<String> {
        Ok(self.driver()?.placeholder(index))
    }

    /// Platform DDL creating the migration ledger table if absent.
    pub fn ledger_table_sql(&self, table_name: &str) -> Result<String> {
        Ok(self.driver()?.ledger_table_sql(table_name))
    }

    pub async fn begin_transaction(&self) -> Result<()> {
        self.execute_batch("BEGIN").await
    }

    pub async fn commit(&self) -> Result<()> {
        self.execute_batch("COMMIT").await
    }

    pub async fn roll_back(&self) -> Result<()> {
        self.execute_batch("ROLLBACK").await
    }
}
