use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use stratum::migrate::{Catalog, MigrationStatus, Migrator, RollbackOutcome};
use stratum::{Connection, Error, Result};

const DATABASE_URL_VAR: &str = "DATABASE_URL";

/// Ordered, transactional SQL schema migrations
#[derive(Debug, Parser)]
#[command(author, name = "stratum", version)]
struct Cli {
    /// Connection DSN; falls back to the DATABASE_URL environment variable
    #[arg(long, value_name = "URL")]
    database_url: Option<String>,

    /// Directory containing the versioned migration files
    #[arg(long, default_value = "migrations", value_name = "PATH")]
    migrations_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, clap::Subcommand)]
enum Command {
    /// Apply pending migrations in ascending identifier order
    Migrate {
        /// Apply only migrations up to and including this identifier
        #[arg(long, value_name = "ID")]
        target: Option<String>,
    },
    /// Revert a single applied migration using its rollback artifact
    Rollback {
        /// Identifier of the migration to revert
        #[arg(long, value_name = "ID")]
        target: String,
    },
    /// Show applied and pending migrations
    Status,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let dsn = match cli.database_url {
        Some(dsn) => dsn,
        None => std::env::var(DATABASE_URL_VAR).map_err(|_| Error::missing_database_url())?,
    };

    let connection = Connection::create_from_dsn(&dsn)?.connect().await?;
    let migrator = Migrator::new(Catalog::new(cli.migrations_dir));

    match cli.command {
        Command::Migrate { target } => {
            let count = migrator.migrate(&connection, target.as_deref()).await?;
            println!("Applied {count} migration(s)");
        }
        Command::Rollback { target } => match migrator.rollback(&connection, &target).await? {
            RollbackOutcome::RolledBack => println!("Rolled back {target}"),
            RollbackOutcome::Skipped => {
                println!("No rollback artifact for {target}, nothing to do")
            }
        },
        Command::Status => print_status(&migrator.status(&connection).await?),
    }

    Ok(())
}

fn print_status(status: &MigrationStatus) {
    println!("Migration status:");
    for entry in &status.entries {
        println!("{} {}", if entry.applied { "✓" } else { "○" }, entry.identifier);
    }
    println!(
        "Total: {} | Applied: {} | Pending: {}",
        status.total, status.applied, status.pending
    );
}
