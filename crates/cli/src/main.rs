//! Market Stall CLI - session store maintenance.
//!
//! # Usage
//!
//! ```bash
//! # Create the session table
//! ms-cli migrate
//!
//! # Delete expired sessions
//! ms-cli sessions purge
//! ```
//!
//! # Commands
//!
//! - `migrate` - Create the tower-sessions table in the session database
//! - `sessions purge` - Delete sessions past their expiry

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "ms-cli")]
#[command(author, version, about = "Market Stall CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the session table
    Migrate,
    /// Maintain stored sessions
    Sessions {
        #[command(subcommand)]
        action: SessionsAction,
    },
}

#[derive(Subcommand)]
enum SessionsAction {
    /// Delete expired sessions
    Purge,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await,
        Commands::Sessions { action } => match action {
            SessionsAction::Purge => commands::sessions::purge().await,
        },
    }
}
