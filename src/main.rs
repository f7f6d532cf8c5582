//! Claw CLI entry point.

use anyhow::Context;
use clap::Parser;

use claw_control::cli::{commands, handle_error, Cli, Commands};
use claw_control::infrastructure::config::ConfigLoader;
use claw_control::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ConfigLoader::load().context("Failed to load configuration") {
        Ok(config) => config,
        Err(err) => handle_error(err, cli.json),
    };

    let mut log_config = LogConfig::from(&config.logging);
    if let Some(level) = cli.log_level.clone() {
        log_config = log_config.with_level(level);
    }
    let _logger = match LoggerImpl::init(&log_config) {
        Ok(logger) => logger,
        Err(err) => handle_error(err, cli.json),
    };

    let result = match cli.command {
        Commands::Init(args) => commands::init::execute(args, &config, cli.json).await,
        Commands::Task(args) => commands::task::execute(args, &config, cli.json).await,
        Commands::Agent(args) => commands::agent::execute(args, &config, cli.json).await,
        Commands::Activity(args) => commands::activity::execute(args, &config, cli.json).await,
    };

    if let Err(err) = result {
        handle_error(err, cli.json);
    }
}
