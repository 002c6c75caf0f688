//! Moot CLI - judge a courtroom debate from the terminal
//!
//! # Usage
//!
//! ```bash
//! # Argue a case interactively; type "rag wins", "chaos wins" or "quit" to end it
//! moot play --case "A cat sues its owner."
//!
//! # Look up precedent in the corpus
//! moot search "defamation by a parrot" --filter jurisdiction="Supreme Court of India"
//!
//! # Show version and configuration
//! moot info
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

mod commands;

use commands::{info, play, search};

/// Moot - a precedent lawyer and a chaos lawyer argue, you judge
#[derive(Parser)]
#[command(
    name = "moot",
    version,
    about = "Moot CLI - judge an AI courtroom debate",
    long_about = "Two AI lawyers argue a case in front of you.\n\n\
                  The precedent lawyer defends with retrieved case law,\n\
                  the chaos lawyer sues with whatever comes to mind."
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Judge a debate interactively
    #[command(name = "play")]
    Play(play::PlayArgs),

    /// Search the precedent corpus
    #[command(name = "search")]
    Search(search::SearchArgs),

    /// Show version and configuration
    #[command(name = "info")]
    Info(info::InfoArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    match cli.command {
        Commands::Play(args) => play::run(args).await,
        Commands::Search(args) => search::run(args).await,
        Commands::Info(args) => info::run(args),
    }
}

fn setup_logging(verbosity: u8) {
    use tracing_subscriber::EnvFilter;

    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();
}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg);
}

pub fn print_warning(msg: &str) {
    println!("{} {}", "⚠".yellow().bold(), msg);
}

pub fn print_info(msg: &str) {
    println!("{} {}", "ℹ".blue().bold(), msg);
}
