use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use kgx::settings::Settings;

mod commands;
mod render;

use commands::extract::ExtractArgs;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a kgx.toml config file (defaults to ./kgx.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch a web page and extract verified knowledge triples from it
    Extract(ExtractArgs),

    /// Show previously extracted triples, newest first
    History(HistoryArgs),

    /// Export every stored triple as CSV
    Export {
        /// Output file (defaults to kg_triples_<timestamp>.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the kgx version
    Version,
}

#[derive(Args)]
struct HistoryArgs {
    /// Only show this many rows
    #[arg(short, long)]
    limit: Option<usize>,

    /// Print rows as JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Logs go to stderr so stdout only carries rendered results
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("kgx=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;

    match cli.command {
        Command::Extract(args) => commands::extract::execute(settings, args).await,
        Command::History(args) => commands::history::execute(&settings, args.limit, args.json),
        Command::Export { output } => commands::export::execute(&settings, output),
        Command::Version => commands::version::execute(),
    }
}
