//! # Social Metadata Main Entry Point
//!
//! Loads configuration, prepares the database and serves the API.

use clap::{Parser, Subcommand};
use social_metadata::{
    config::ConfigLoader,
    db::{init_pool, migrate},
    server::run_server,
    telemetry::init_tracing,
};

#[derive(Parser)]
#[command(name = "social-metadata")]
#[command(about = "Facebook page metadata rendered as HTML fragments", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Default)]
enum Commands {
    /// Apply migrations and serve the HTTP API
    #[default]
    Serve,
    /// Apply pending migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration from layered env files and variables
    let config = ConfigLoader::new().load()?;
    init_tracing(&config)?;

    tracing::info!(profile = %config.profile, "Loaded configuration");
    if let Ok(redacted_json) = config.redacted_json() {
        tracing::debug!(config = %redacted_json, "Effective configuration");
    }

    let db = init_pool(&config).await?;
    migrate(&db).await?;

    match cli.command.unwrap_or_default() {
        Commands::Serve => run_server(config, db).await,
        Commands::Migrate => {
            tracing::info!("Migrations applied");
            Ok(())
        }
    }
}
