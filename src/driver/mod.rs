use crate::{AsyncResult, ConnectionOptions, Error, Result};

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "sqlite")]
pub mod sqlite;

/// The operations a backend must provide for the migration engine.
///
/// Methods return boxed futures so the trait stays object-safe; the SQLite
/// backend resolves them synchronously, the PostgreSQL one awaits the wire.
pub trait DriverConnection {
    fn execute_batch<'a>(&'a self, sql: &'a str) -> AsyncResult<'a, ()>;

    fn execute<'a>(&'a self, sql: &'a str, params: &'a [&'a str]) -> AsyncResult<'a, u64>;

    fn fetch_strings<'a>(&'a self, sql: &'a str) -> AsyncResult<'a, Vec<String>>;

    /// Positional parameter placeholder in this platform's syntax, 1-based.
    fn placeholder(&self, index: usize) -> String;

    /// Platform DDL creating the migration ledger table if absent.
    fn ledger_table_sql(&self, table_name: &str) -> String;
}

pub struct Driver {
    inner_driver: Box<dyn DriverConnection>,
}

impl std::fmt::Debug for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver").finish_non_exhaustive()
    }
}

impl Driver {
    pub async fn create(connection_options: &ConnectionOptions) -> Result<Self> {
        let scheme = connection_options.scheme.as_deref().unwrap_or_default();
        let inner_driver = match scheme {
            #[cfg(feature = "postgres")]
            "psql" => Box::new(postgres::Driver::create(connection_options).await?)
                as Box<dyn DriverConnection>,
            #[cfg(feature = "sqlite")]
            "sqlite" => Box::new(sqlite::Driver::create(connection_options).await?)
                as Box<dyn DriverConnection>,
            proto => return Err(Error::unknown_driver(proto)),
        };

        Ok(Self { inner_driver })
    }

    pub async fn execute_batch(&self, sql: &str) -> Result<()> {
        self.inner_driver.execute_batch(sql).await
    }

    pub async fn execute(&self, sql: &str, params: &[&str]) -> Result<u64> {
        self.inner_driver.execute(sql, params).await
    }

    pub async fn fetch_strings(&self, sql: &str) -> Result<Vec<String>> {
        self.inner_driver.fetch_strings(sql).await
    }

    pub fn placeholder(&self, index: usize) -> String {
        self.inner_driver.placeholder(index)
    }

    pub fn ledger_table_sql(&self, table_name: &str) -> String {
        self.inner_driver.ledger_table_sql(table_name)
    }
}
