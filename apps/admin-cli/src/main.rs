mod cli;
mod commands;
mod config;
mod logging;

use admin_gateway::{CancellationToken, RequestGateway};
use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;

use crate::cli::{Cli, Commands};
use crate::config::AppConfig;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // defaults -> YAML (if provided) -> env (ADMIN__*)
    let config = AppConfig::load(cli.config.as_deref())?;
    logging::init_logging(&config.logging)?;

    if cli.print_config {
        println!("{}", config.to_pretty_json()?);
        return Ok(ExitCode::SUCCESS);
    }

    match cli.command.unwrap_or(Commands::Check) {
        Commands::Check => check_config(&config),
        Commands::Request(args) => {
            let gateway = build_gateway(&config)?;
            commands::run_request(&gateway, args, cancel_on_ctrl_c()).await
        }
        Commands::Menu(command) => {
            let gateway = build_gateway(&config)?;
            commands::run_menu(&gateway, command, cancel_on_ctrl_c()).await
        }
    }
}

fn check_config(config: &AppConfig) -> Result<ExitCode> {
    tracing::info!("Checking configuration...");
    let policy = config
        .gateway
        .base_url_policy()
        .context("invalid gateway configuration")?;

    println!("Configuration is valid");
    println!("Selected base URL: {}", policy.select());
    println!("{}", config.to_pretty_json()?);
    Ok(ExitCode::SUCCESS)
}

fn build_gateway(config: &AppConfig) -> Result<RequestGateway> {
    RequestGateway::from_config(&config.gateway).context("failed to build request gateway")
}

/// Token that fires on the first Ctrl+C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Received Ctrl+C signal, cancelling request");
                trigger.cancel();
            }
            Err(e) => tracing::error!(%e, "Error handling Ctrl+C signal"),
        }
    });
    token
}
