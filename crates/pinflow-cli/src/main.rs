//! pinflow CLI
//!
//! Runs and validates scenario files against the pinflow core library.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod error;
mod scenario;

/// pinflow - synchronous dataflow scenario runner
#[derive(Parser)]
#[command(name = "pinflow")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Scenario file, or a directory containing pinflow.yaml
    #[arg(short, long, default_value = "pinflow.yaml", env = "PINFLOW_CONFIG")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the scenario graph and run its steps
    Run {
        /// Pretty-print each sink record
        #[arg(long)]
        pretty: bool,
    },

    /// Validate the scenario without running it
    Validate,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Run { pretty } => {
            commands::run::run(&cli.config, pretty)?;
        }
        Commands::Validate => {
            commands::validate::run(&cli.config)?;
        }
    }

    Ok(())
}
