use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use fuelwatch::cli::setup::{setup, setup_at_path};
use fuelwatch::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for fuelwatch::AppCommand {
    fn from(cmd: Commands) -> fuelwatch::AppCommand {
        match cmd {
            Commands::Track => fuelwatch::AppCommand::Track,
            Commands::Sync => fuelwatch::AppCommand::Sync,
            Commands::History { limit, normalized } => {
                fuelwatch::AppCommand::History { limit, normalized }
            }
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Fetch today's price, record it and send the reports
    Track,
    /// Convert new ledger rows into the reference currency
    Sync,
    /// Show recent ledger rows and statistics
    History {
        /// Number of most recent rows to show
        #[arg(short, long, default_value_t = 15)]
        limit: usize,

        /// Show the normalized ledger instead of the primary one
        #[arg(short, long)]
        normalized: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => setup_at_path(path),
            None => setup(),
        },
        Some(cmd) => fuelwatch::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
