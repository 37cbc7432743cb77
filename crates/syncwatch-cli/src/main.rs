//! syncwatch: watch a directory, upload settled files with rclone, keep a
//! dedup ledger and notify on the outcome.
//!
//! Configuration comes from the environment (and `.env`); see `DaemonConfig`.

mod daemon;
mod history;
mod setup;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use syncwatch_core::constants::DEFAULT_HISTORY_LIMIT;
use syncwatch_core::{DaemonConfig, FileTask};
use syncwatch_infra::telemetry::DEFAULT_FILTER;
use syncwatch_infra::{init_telemetry, LogFormat};

#[derive(Parser)]
#[command(name = "syncwatch", version, about = "Watch a directory and upload settled files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the watcher daemon until Ctrl+C or SIGTERM
    Watch,
    /// Run the pipeline once for a single file, then exit
    Process {
        /// File to process
        path: PathBuf,
    },
    /// Show the most recent upload history
    History {
        /// Maximum number of rows
        #[arg(long, default_value_t = DEFAULT_HISTORY_LIMIT)]
        limit: i64,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Delete every upload history row
    ClearHistory {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = DaemonConfig::from_env().context("Configuration validation failed")?;
    let format: LogFormat = config.log_format.parse()?;
    init_telemetry(format, DEFAULT_FILTER)?;

    tracing::debug!(?config, "Configuration loaded and validated");

    match cli.command {
        Commands::Watch => {
            let ledger = setup::setup_ledger(&config).await?;
            let coordinator = setup::setup_coordinator(&config, ledger)?;
            daemon::run(&config, coordinator).await?;
        }
        Commands::Process { path } => {
            let ledger = setup::setup_ledger(&config).await?;
            let coordinator = setup::setup_coordinator(&config, ledger)?;
            let outcome = coordinator
                .run(FileTask::new(path))
                .await
                .context("Pipeline run failed")?;
            println!("{:?}", outcome);
        }
        Commands::History { limit, json } => {
            let ledger = setup::setup_ledger(&config).await?;
            let rows = ledger.list_recent(limit.max(1)).await?;
            if json {
                let out = serde_json::to_string_pretty(&rows).context("Serialize history")?;
                println!("{}", out);
            } else if rows.is_empty() {
                println!("No uploads recorded");
            } else {
                for row in &rows {
                    println!("{}", history::render_row(row));
                }
            }
        }
        Commands::ClearHistory { yes } => {
            if !yes {
                anyhow::bail!("Refusing to clear history without --yes");
            }
            let ledger = setup::setup_ledger(&config).await?;
            let deleted = ledger.clear().await?;
            println!("Deleted {} history rows", deleted);
        }
    }

    Ok(())
}
