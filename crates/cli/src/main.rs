//! Akaar CLI - database migrations and catalog seeding.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations (including the session table)
//! akaar migrate
//!
//! # Seed the catalog with the starter products
//! akaar seed
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Seed the catalog with starter products and their mesh files

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "akaar")]
#[command(author, version, about = "Akaar storefront CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Seed the catalog with starter products
    Seed,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::Seed => {
            let seeded = commands::seed::catalog().await?;
            tracing::info!(products = seeded, "Catalog seeding complete");
        }
    }
    Ok(())
}
