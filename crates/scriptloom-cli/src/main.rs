mod args;
mod commands;
mod error;
mod logging;
mod state;

use std::process::ExitCode;

use clap::Parser;
use scriptloom::config::{default_config_path, load_config_or_default};

use args::Cli;
use error::CliError;
use state::AppState;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init_logging(&cli.log_level, cli.log_format) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::debug!("Command failed: {:?}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config_path = cli
        .config
        .or_else(default_config_path)
        .ok_or_else(|| CliError::Invalid("cannot determine home directory; pass --config".to_string()))?;
    let config = load_config_or_default(&config_path)?;
    log::debug!("Using configuration {}", config_path.display());

    let state = AppState::open(&config)?;
    commands::dispatch(&state, cli.command).await
}
