use crate::driver::DriverConnection;
use crate::{AsyncResult, ConnectionOptions, Error, Result};
use log::error;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, NoTls};

pub struct Driver {
    client: Client,
}

impl Driver {
    pub async fn create(options: &ConnectionOptions) -> Result<Self> {
        let mut config = tokio_postgres::Config::new();
        if let Some(host) = options.host.as_deref() {
            config.host(host);
        }
        if let Some(port) = options.port {
            config.port(port);
        }
        if let Some(username) = options.username.as_deref() {
            config.user(username);
        }
        if let Some(password) = options.password.as_deref() {
            config.password(password);
        }
        if let Some(database_name) = options.database_name.as_deref() {
            config.dbname(database_name);
        }

        let (client, connection) = config.connect(NoTls).await.map_err(Error::connection)?;

        // The connection object drives the socket; it has to be polled for
        // the whole lifetime of the client.
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!(target: "stratum::driver", "postgres connection error: {e}");
            }
        });

        Ok(Self { client })
    }
}

impl DriverConnection for Driver {
    fn execute_batch<'a>(&'a self, sql: &'a str) -> AsyncResult<'a, ()> {
        Box::pin(async move { Ok(self.client.batch_execute(sql).await?) })
    }

    fn execute<'a>(&'a self, sql: &'a str, params: &'a [&'a str]) -> AsyncResult<'a, u64> {
        Box::pin(async move {
            let params: Vec<&(dyn ToSql + Sync)> = params
                .iter()
                .map(|param| param as &(dyn ToSql + Sync))
                .collect();

            Ok(self.client.execute(sql, &params).await?)
        })
    }

    fn fetch_strings<'a>(&'a self, sql: &'a str) -> AsyncResult<'a, Vec<String>> {
        Box::pin(async move {
            let rows = self.client.query(sql, &[]).await?;

            Ok(rows.iter().map(|row| row.get::<_, String>(0)).collect())
        })
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${index}")
    }

    fn ledger_table_sql(&self, table_name: &str) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {table_name} (\
             id SERIAL PRIMARY KEY, \
             identifier VARCHAR(255) UNIQUE NOT NULL, \
             applied_at TIMESTAMP WITH TIME ZONE DEFAULT CURRENT_TIMESTAMP)"
        )
    }
}
