//! # ReproUI
//!
//! Console order desk for the 3D-print service.
//!
//! 1. Load `secrets/config.toml` (or run `--offline` with example orders).
//! 2. Start the [`DeskSystem`] over the spreadsheet.
//! 3. Hand stdin and the event stream to the [`Console`] until `quit`.
//! 4. Shut down, flushing whatever the operator changed last.

use clap::Parser;
use reproui::config::{DeskConfig, DEFAULT_CONFIG_PATH};
use reproui::console::Console;
use reproui::demo;
use reproui::error::DeskError;
use reproui::lifecycle::DeskSystem;
use reproui::sheets::SheetsClient;
use std::path::PathBuf;
use sync_framework::tracing::setup_tracing;
use sync_framework::TableClient;
use tokio::io::BufReader;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "reproui")]
#[command(about = "Order desk for the 3D-print service", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Use built-in example orders instead of the spreadsheet
    #[arg(long)]
    offline: bool,
}

#[tokio::main]
async fn main() -> Result<(), DeskError> {
    setup_tracing();
    let cli = Cli::parse();

    let config = match DeskConfig::load(&cli.config) {
        Ok(config) => config,
        Err(DeskError::ConfigMissing(path)) if cli.offline => {
            info!(path = %path.display(), "No configuration file, using offline defaults");
            DeskConfig::offline()
        }
        Err(e) => {
            error!(error = %e, "Cannot start");
            return Err(e);
        }
    };

    if cli.offline {
        info!("Starting offline with example orders");
        run(demo::offline_table(&config.sheet), &config).await
    } else {
        let table = SheetsClient::from_config(&config).inspect_err(|e| {
            error!(error = %e, "Cannot create spreadsheet client");
        })?;
        info!(spreadsheet = %config.spreadsheet_id, "Starting");
        run(table, &config).await
    }
}

async fn run<C: TableClient>(table: C, config: &DeskConfig) -> Result<(), DeskError> {
    let (system, events) = DeskSystem::start(table, config);

    let console = Console::new(system.client.clone(), std::io::stdout());
    console
        .run(BufReader::new(tokio::io::stdin()), events)
        .await;

    system.shutdown().await?;
    info!("Application completed successfully");
    Ok(())
}
