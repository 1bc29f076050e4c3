//! Uplink Daemon - store-and-forward uplink for field-device telemetry.

mod app;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use uplink_config_and_utils::{init_logging, Config, Paths};

/// Uplink daemon command-line interface.
#[derive(Parser)]
#[command(name = "uplinkd")]
#[command(about = "Telemetry uplink daemon: durable local queue drained to a remote collector")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Base directory for runtime files (database, logs, config). Defaults to ~/.uplink
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the daemon in the foreground
    Run,
    /// Enqueue a single reading (a JSON object) into the local queue
    Enqueue {
        /// The reading, e.g. '{"R001": "23.50"}'
        #[arg(long)]
        data: String,
    },
    /// Show pending and parked record counts for the local queue
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(&cli.log_level);

    // Load configuration
    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };
    let config = Config::load(&paths)?;

    match cli.command {
        Some(Commands::Run) | None => {
            app::run_daemon(config, paths).await?;
        }
        Some(Commands::Enqueue { data }) => {
            app::enqueue_reading(&paths, &data)?;
        }
        Some(Commands::Status) => {
            app::show_status(&paths)?;
        }
    }

    Ok(())
}
