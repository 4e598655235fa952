//! CLI application for renaming and analyzing bank statement PDFs.

mod commands;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use console::style;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{RunStatus, analyze, config, parsers, rename};

/// Bank statement sorter - name statements by the dates they cover
#[derive(Parser)]
#[command(name = "stmtsort")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy statements into <parser>_from_<MMMYYYY>_to_<MMMYYYY>.pdf names
    Rename(rename::RenameArgs),

    /// Report covered dates, gaps and duplicates
    Analyze(analyze::AnalyzeArgs),

    /// List registered statement parsers
    Parsers,

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("{} {}", style("✗").red(), e);
        return ExitCode::from(2);
    }

    let config_path = cli.config.as_deref();
    let result = match cli.command {
        Commands::Rename(args) => rename::run(args, config_path).await,
        Commands::Analyze(args) => analyze::run(args, config_path).await,
        Commands::Parsers => parsers::run().await,
        Commands::Config(args) => config::run(args, config_path).await,
    };

    match result {
        Ok(RunStatus::Complete) => ExitCode::SUCCESS,
        Ok(RunStatus::Incomplete) => ExitCode::from(1),
        Err(e) => {
            eprintln!("{} {:#}", style("✗").red(), e);
            ExitCode::from(2)
        }
    }
}
