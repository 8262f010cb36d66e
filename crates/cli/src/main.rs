//! Store directory CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run directory and session-store migrations
//! sd-cli migrate
//!
//! # Create a directory user
//! sd-cli user create -e wes@example.com -n "Wes"
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `user create` - Create directory users

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "sd-cli")]
#[command(author, version, about = "Store directory CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations (directory schema and session store)
    Migrate,
    /// Manage directory users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user
    Create {
        /// User email address
        #[arg(short, long)]
        email: String,

        /// User display name
        #[arg(short, long)]
        name: String,
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
        Commands::User { action } => match action {
            UserAction::Create { email, name } => {
                commands::user::create_user(&email, &name).await?;
            }
        },
    }
    Ok(())
}
