mod scan;

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "jobwatch")]
#[command(about = "Marks tracked job postings that are no longer advertised")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Check every pending job's detail page and mark the expired ones
    Scan {
        /// Fetch and assess pages without updating the database or the log
        #[arg(long)]
        dry_run: bool,
        /// Progress log to append to (overrides `JOBWATCH_PROGRESS_LOG`)
        #[arg(long)]
        log_file: Option<PathBuf>,
    },
    /// List the jobs the next scan would visit
    Pending {
        /// Print the queue as JSON
        #[arg(long)]
        json: bool,
    },
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check that the database is reachable
    Ping,
    /// Apply pending schema migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let config = jobwatch_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = jobwatch_db::PoolConfig::from_app_config(&config);
    let pool = jobwatch_db::connect_pool(&config.database, pool_config).await?;

    let result = match command {
        Commands::Scan { dry_run, log_file } => {
            scan::run_scan(&pool, &config, dry_run, log_file.as_deref()).await
        }
        Commands::Pending { json } => scan::run_pending(&pool, json).await,
        Commands::Db { command } => run_db(&pool, command).await,
    };

    pool.close().await;
    result
}

async fn run_db(pool: &sqlx::PgPool, command: DbCommands) -> anyhow::Result<()> {
    match command {
        DbCommands::Ping => {
            jobwatch_db::ping(pool).await?;
            println!("database reachable");
        }
        DbCommands::Migrate => {
            let applied = jobwatch_db::run_migrations(pool).await?;
            println!("applied {applied} migration(s)");
        }
    }
    Ok(())
}
