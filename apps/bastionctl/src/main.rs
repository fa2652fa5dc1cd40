//! bastionctl - Reconcile WALLIX Bastion resources from a manifest
//!
//! Reads a YAML manifest describing the desired state of users, groups,
//! devices, accounts and authorizations, compares it against a Bastion
//! appliance over its REST API, and converges the appliance.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod manifest;

use error::CliResult;

/// bastionctl - WALLIX Bastion desired-state management
#[derive(Parser)]
#[command(name = "bastionctl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a manifest to the appliance
    Apply(commands::apply::ApplyArgs),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = run(cli).await;

    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            e.print();
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    match cli.command {
        Commands::Apply(args) => commands::apply::execute(args).await,
    }
}
