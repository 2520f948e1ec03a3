//! Café Amka CLI - Database migrations and back-office tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! cafe-cli migrate
//!
//! # Load or refresh the menu from YAML
//! cafe-cli seed menu -f crates/cli/seed/menu.yaml
//!
//! # Move an order to its next status
//! cafe-cli orders advance <ORDER_ID>
//!
//! # Cancel an order
//! cafe-cli orders cancel <ORDER_ID>
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed menu` - Upsert categories and menu items from a YAML catalogue
//! - `orders advance` / `orders cancel` - Staff order status changes

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

use commands::orders::Action;

#[derive(Parser)]
#[command(name = "cafe-cli")]
#[command(author, version, about = "Café Amka CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the database
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Manage orders
    Orders {
        #[command(subcommand)]
        action: OrderAction,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Upsert the menu from a YAML catalogue
    Menu {
        /// Path to the catalogue file
        #[arg(short, long, default_value = "crates/cli/seed/menu.yaml")]
        file: String,
    },
}

#[derive(Subcommand)]
enum OrderAction {
    /// Move an order to its next status
    Advance {
        /// Order ID (UUID)
        id: String,
    },
    /// Cancel an order that has not completed
    Cancel {
        /// Order ID (UUID)
        id: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
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
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { target } => match target {
            SeedTarget::Menu { file } => commands::seed::menu(&file).await?,
        },
        Commands::Orders { action } => match action {
            OrderAction::Advance { id } => commands::orders::update(&id, Action::Advance).await?,
            OrderAction::Cancel { id } => commands::orders::update(&id, Action::Cancel).await?,
        },
    }
    Ok(())
}
