//! Souk CLI - Database migrations and store management tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply pending migrations
//! souk-cli migrate
//!
//! # Load product types, categories, products and delivery areas
//! souk-cli seed demos/catalog.yaml
//!
//! # Create a promo code valid until the given instant
//! souk-cli promo create -c SPRING -p 15 --valid-until 2026-06-01T00:00:00Z
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string

#![cfg_attr(not(test), forbid(unsafe_code))]

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "souk-cli")]
#[command(author, version, about = "Souk CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the catalog from a YAML file
    Seed {
        /// Path to the catalog file
        file: String,
    },
    /// Manage promo codes
    Promo {
        #[command(subcommand)]
        action: PromoAction,
    },
}

#[derive(Subcommand)]
enum PromoAction {
    /// Create a new promo code
    Create {
        /// Code customers type at checkout (stored upper-case)
        #[arg(short, long)]
        code: String,

        /// Discount percentage (1-100)
        #[arg(short, long)]
        percentage: i32,

        /// Start of the validity window, RFC 3339 (default: now)
        #[arg(long)]
        valid_from: Option<DateTime<Utc>>,

        /// End of the validity window, RFC 3339
        #[arg(long)]
        valid_until: DateTime<Utc>,

        /// Create the code disabled
        #[arg(long)]
        inactive: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "souk_cli=info,souk_db=info".into()),
        )
        .init();

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
        Commands::Seed { file } => {
            commands::seed::catalog(&file).await?;
        }
        Commands::Promo { action } => match action {
            PromoAction::Create {
                code,
                percentage,
                valid_from,
                valid_until,
                inactive,
            } => {
                let input = souk_core::promo::PromoCodeInput {
                    code,
                    percentage,
                    valid_from: valid_from.unwrap_or_else(Utc::now),
                    valid_until,
                    is_active: !inactive,
                };
                commands::promo::create(&input).await?;
            }
        },
    }
    Ok(())
}
