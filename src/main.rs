use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tilebc::command;
use tilebc::runtime::{setup_logger, LogLevel};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Log level (trace, debug, info, warn, error, off); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "info")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Partition(command::Partition),
    Dedup(command::Dedup),
    Stitch(command::Stitch),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logger(cli.log_level);

    let result = match cli.command {
        Commands::Partition(mut cmd) => cmd.try_execute(),
        Commands::Dedup(mut cmd) => cmd.try_execute(),
        Commands::Stitch(mut cmd) => cmd.try_execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
