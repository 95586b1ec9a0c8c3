//! RIS Demo CLI
//!
//! Command-line interface for sending inquiries and updates to RIS and for
//! trying the payment token encodings offline.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod ui;

#[derive(Parser)]
#[command(name = "ris-demo")]
#[command(about = "RIS Demo CLI - Score transactions with the RIS fraud service", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print responses as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a risk inquiry (MODE=Q)
    Inquiry {
        /// Merchant id
        #[arg(short, long, env = "RIS_MERCHANT_ID")]
        merchant_id: String,

        /// Session id
        #[arg(short, long)]
        session_id: String,

        /// Merchant order number
        #[arg(short, long)]
        order: Option<String>,

        /// Order total in the lowest currency unit
        #[arg(short, long, default_value = "0")]
        total: String,

        /// Currency code
        #[arg(long, default_value = "USD")]
        currency: String,

        /// Customer email
        #[arg(short, long)]
        email: Option<String>,

        /// Customer IP address
        #[arg(long)]
        ip_address: Option<String>,

        /// Card number
        #[arg(long, conflicts_with = "gift_card")]
        card: Option<String>,

        /// Gift card number
        #[arg(long)]
        gift_card: Option<String>,

        /// Mask the card number instead of hashing it
        #[arg(long, requires = "card")]
        mask: bool,
    },

    /// Update an earlier transaction (MODE=U)
    Update {
        /// Merchant id
        #[arg(short, long, env = "RIS_MERCHANT_ID")]
        merchant_id: String,

        /// Session id of the original inquiry
        #[arg(short, long)]
        session_id: String,

        /// Transaction id returned by the inquiry
        #[arg(short, long)]
        transaction_id: String,

        /// Update mode: U (no response) or X (with response)
        #[arg(long, default_value = "U")]
        mode: String,

        /// Authorization status (A or D)
        #[arg(long)]
        auth: Option<String>,

        /// Merchant acknowledgment (Y or N)
        #[arg(long)]
        mack: Option<String>,

        /// Refund or chargeback status (R or C)
        #[arg(long)]
        refund_chargeback: Option<String>,
    },

    /// Hash a payment token with KHASH (offline)
    Khash {
        /// Payment token
        token: String,

        /// Hash as a gift card for this merchant id
        #[arg(long)]
        merchant_id: Option<u64>,
    },

    /// Mask a card number (offline)
    Mask {
        /// Card number
        token: String,
    },

    /// Show the configuration loaded from the environment
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing, RUST_LOG wins over the defaults
    let default_filter = if cli.verbose {
        "ris_demo_cli=debug,ris_lib=debug"
    } else {
        "ris_demo_cli=info,ris_lib=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    // Dispatch commands
    match cli.command {
        Commands::Inquiry {
            merchant_id,
            session_id,
            order,
            total,
            currency,
            email,
            ip_address,
            card,
            gift_card,
            mask,
        } => {
            let args = commands::inquiry::InquiryArgs {
                merchant_id,
                session_id,
                order,
                total,
                currency,
                email,
                ip_address,
                card,
                gift_card,
                mask,
            };
            commands::inquiry::run(args, cli.json).await?;
        }
        Commands::Update {
            merchant_id,
            session_id,
            transaction_id,
            mode,
            auth,
            mack,
            refund_chargeback,
        } => {
            let args = commands::update::UpdateArgs {
                merchant_id,
                session_id,
                transaction_id,
                mode,
                auth,
                mack,
                refund_chargeback,
            };
            commands::update::run(args, cli.json).await?;
        }
        Commands::Khash { token, merchant_id } => {
            commands::khash::run_khash(&token, merchant_id)?;
        }
        Commands::Mask { token } => {
            commands::khash::run_mask(&token)?;
        }
        Commands::Config => {
            commands::config::run()?;
        }
    }

    Ok(())
}
