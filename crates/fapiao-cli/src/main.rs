//! CLI application for Chinese e-invoice field extraction.

mod commands;

use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use commands::{batch, config, extract, ledger, text};

/// Chinese e-invoice extraction - invoice number, seller and amount from PDF invoices
#[derive(Parser)]
#[command(name = "fapiao")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract fields from a single PDF invoice
    Extract(extract::ExtractArgs),

    /// Extract fields from plain text (file or stdin)
    Text(text::TextArgs),

    /// Process multiple PDF invoices into a ledger
    Batch(batch::BatchArgs),

    /// Inspect, annotate and export a ledger
    Ledger(ledger::LedgerArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity; RUST_LOG directives take precedence
    let level = match cli.verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Extract(args) => extract::run(args, config_path).await,
        Commands::Text(args) => text::run(args, config_path).await,
        Commands::Batch(args) => batch::run(args, config_path).await,
        Commands::Ledger(args) => ledger::run(args).await,
        Commands::Config(args) => config::run(args).await,
    }
}
