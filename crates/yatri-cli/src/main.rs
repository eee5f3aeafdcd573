//! Yatri CLI — Command-line interface for the Yatri identity registry.
//!
//! Subcommands: status, stats, record, verify, pause, resume.

mod commands;

use clap::{Parser, Subcommand};

/// Yatri — Digital identity registry for tourist safety.
#[derive(Parser, Debug)]
#[command(name = "yatri", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Query the status of a running node.
    Status(commands::status::StatusArgs),
    /// Show registry statistics.
    Stats(commands::stats::StatsArgs),
    /// Fetch an identity record by registry id.
    Record(commands::record::RecordArgs),
    /// Verify an identity record.
    Verify(commands::verify::VerifyArgs),
    /// Pause record-plane mutations.
    Pause(commands::pause::PauseArgs),
    /// Resume record-plane mutations.
    Resume(commands::resume::ResumeArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Status(args) => commands::status::run(args).await,
        Commands::Stats(args) => commands::stats::run(args).await,
        Commands::Record(args) => commands::record::run(args).await,
        Commands::Verify(args) => commands::verify::run(args).await,
        Commands::Pause(args) => commands::pause::run(args).await,
        Commands::Resume(args) => commands::resume::run(args).await,
    }
}
