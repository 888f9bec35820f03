use crate::driver::DriverConnection;
use crate::{AsyncResult, ConnectionOptions, Error, Result};

pub struct Driver {
    connection: rusqlite::Connection,
}

impl Driver {
    pub async fn create(options: &ConnectionOptions) -> Result<Self> {
        let connection = match options.file_path.as_deref() {
            Some(path) => rusqlite::Connection::open(path),
            None => rusqlite::Connection::open_in_memory(),
        }
        .map_err(Error::connection)?;

        Ok(Self { connection })
    }
}

impl DriverConnection for Driver {
    fn execute_batch<'a>(&'a self, sql: &'a str) -> AsyncResult<'a, ()> {
        Box::pin(async move { Ok(self.connection.execute_batch(sql)?) })
    }

    fn execute<'a>(&'a self, sql: &'a str, params: &'a [&'a str]) -> AsyncResult<'a, u64> {
        Box::pin(async move {
            let count = self
                .connection
                .execute(sql, rusqlite::params_from_iter(params.iter().copied()))?;

            Ok(count as u64)
        })
    }

    fn fetch_strings<'a>(&'a self, sql: &'a str) -> AsyncResult<'a, Vec<String>> {
        Box::pin(async move {
            let mut statement = self.connection.prepare(sql)?;
            let rows = statement.query_map([], |row| row.get::<_, String>(0))?;

            let mut values = vec![];
            for value in rows {
                values.push(value?);
            }

            Ok(values)
        })
    }

    fn placeholder(&self, index: usize) -> String {
        format!("?{index}")
    }

    fn ledger_table_sql(&self, table_name: &str) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {table_name} (\
             id INTEGER PRIMARY KEY AUTOINCREMENT, \
             identifier TEXT UNIQUE NOT NULL, \
             applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP)"
        )
    }
}
