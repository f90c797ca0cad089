//! Rawdeck CLI - Raw Audio Writer
//!
//! Command-line interface for writing audio files to playback cards.

use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;
use log::debug;

use rawdeck::cli::{Cli, Commands};
use rawdeck::Result;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logger
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    debug!("Rawdeck v{}", env!("CARGO_PKG_VERSION"));

    match handle_command(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error [{}]: {}", e.error_code(), e);
            if let Some(hint) = e.recovery_suggestion() {
                eprintln!("Hint: {}", hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn handle_command(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Write(args) => rawdeck::cli::commands::write_to_device(&args),
        Commands::Probe {
            block_device,
            filesystem,
            json,
        } => rawdeck::cli::commands::probe_device(&block_device, filesystem.as_deref(), json),
    }
}
