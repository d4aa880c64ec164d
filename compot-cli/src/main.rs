mod commands;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use commands::Context;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "compot")]
#[command(about = "Compot - prize competitions and instant-win games")]
#[command(version)]
struct Cli {
    /// Data directory for the account database and game config
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Seed the game RNG for reproducible plays
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show account balance
    Balance,
    /// Add funds to the account
    TopUp {
        /// Amount in pounds, e.g. 20 or £12.50
        amount: String,
    },
    /// Show recent transactions
    Transactions,
    /// List competitions
    Competitions,
    /// Buy competition tickets
    Buy {
        /// Competition ID
        competition: String,
        /// Number of tickets
        quantity: u32,
        /// Display name recorded on the ticket
        #[arg(long)]
        name: Option<String>,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Show tickets
    Tickets {
        /// Include drawn tickets
        #[arg(short, long)]
        all: bool,
    },
    /// Buy and scratch a scratch card
    Scratch,
    /// Pay for a round of pick-a-box and open one box
    PickBox {
        /// Box to open, counting from 1
        index: usize,
    },
    /// Spin the prize wheel
    Spin,
    /// Discard the account and start over from the demo data
    Reset {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "compot={},compot_core={},compot_games={}",
            log_level, log_level, log_level
        )))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Get data directory
    let data_dir = cli.data_dir.unwrap_or_else(|| {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("compot")
    });

    // Ensure data directory exists
    tokio::fs::create_dir_all(&data_dir)
        .await
        .with_context(|| format!("cannot create {}", data_dir.display()))?;

    let mut ctx = Context::open(&data_dir, cli.seed)?;

    // Execute command
    let result = match cli.command {
        Commands::Balance => commands::account::show_balance(&ctx),
        Commands::TopUp { amount } => commands::account::top_up(&ctx, &amount),
        Commands::Transactions => commands::account::show_transactions(&ctx),
        Commands::Competitions => commands::competitions::list(&ctx),
        Commands::Buy {
            competition,
            quantity,
            name,
            yes,
        } => commands::competitions::buy(&ctx, &competition, quantity, name.as_deref(), yes),
        Commands::Tickets { all } => commands::competitions::show_tickets(&ctx, all),
        Commands::Scratch => commands::games::scratch(&mut ctx),
        Commands::PickBox { index } => commands::games::pick_box(&mut ctx, index),
        Commands::Spin => commands::games::spin(&mut ctx).await,
        Commands::Reset { force } => commands::account::reset(&ctx, force),
    };

    if let Err(e) = result {
        if commands::report(&e) {
            std::process::exit(1);
        }
    }

    Ok(())
}
