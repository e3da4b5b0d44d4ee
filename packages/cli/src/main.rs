mod commands;
mod config;
mod logging;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{check, convert, init, inspect, CheckArgs, ConvertArgs, InitArgs, InspectArgs};

/// Chroma CLI - shader diagnostics and project archives
#[derive(Parser, Debug)]
#[command(name = "chroma")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log at debug level (otherwise CHROMA_LOG, default warn)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a config file and a starter project
    Init(InitArgs),

    /// Map a captured driver log onto a shader source
    Check(CheckArgs),

    /// Summarize project files
    Inspect(InspectArgs),

    /// Convert a legacy JSON project into an archive
    Convert(ConvertArgs),
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?.display().to_string();

    match cli.command {
        Command::Init(args) => init(args, &cwd).await,
        Command::Check(args) => check(args, &cwd),
        Command::Inspect(args) => inspect(args, &cwd),
        Command::Convert(args) => convert(args, &cwd).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(err) = run(cli).await {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
