use std::process::ExitCode;

use clap::Parser;
use mork_coord::cli::gate::HoldOutcome;
use mork_coord::cli::{self, BusCommand, Cli, Commands, ConfigCommand, GateCommand};
use mork_coord::config::Config;
use mork_coord::error::Result;
use mork_coord::gate::SingletonGate;
use tracing::error;

/// Exit code when another process already holds the poller lock.
const EXIT_CONTENDED: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match Config::load(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to load config: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => Config::from_env(),
    };

    config.init_logging();

    match run(cli.command, &config).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, config: &Config) -> Result<ExitCode> {
    match command {
        Commands::Gate(cmd) => {
            let gate = SingletonGate::from_config(&config.gate);
            match cmd {
                GateCommand::Status => cli::gate::execute_status(&gate)?,
                GateCommand::Hold(args) => {
                    if cli::gate::execute_hold(&gate, args.for_secs).await?
                        == HoldOutcome::Contended
                    {
                        return Ok(ExitCode::from(EXIT_CONTENDED));
                    }
                }
                GateCommand::Clear(args) => cli::gate::execute_clear(&gate, args.force)?,
            }
        }
        Commands::Bus(BusCommand::Replay(args)) => {
            cli::bus::execute_replay(&args.file, &config.bus, args.json)?;
        }
        Commands::Config(ConfigCommand::Validate) => cli::config::execute_validate(config)?,
    }
    Ok(ExitCode::SUCCESS)
}
