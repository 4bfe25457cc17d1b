mod cli;
mod commands;
mod config;
mod logging;
mod refresh;
mod render;
mod session;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use refresh_core::{AppState, FormOptions};
use refresh_engine::{JobLifecycleController, ReqwestBackend};
use refresh_logging::refresh_info;

use crate::cli::{Cli, Command};
use crate::config::ConsoleConfig;

fn main() -> ExitCode {
    match run() {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(refresh::EXIT_NOT_STARTED)
        }
    }
}

fn run() -> Result<u8> {
    let cli = Cli::parse();
    let mut config = ConsoleConfig::load(cli.config.as_deref())?;
    config.apply_overrides(&cli);

    let level = config.log.level_filter()?;
    logging::initialize(config.log.destination, level, &config.log.file);
    refresh_info!(
        "refresh-console {} using backend {}",
        env!("CARGO_PKG_VERSION"),
        config.base_url
    );
    match &config.source {
        Some(path) => refresh_info!("Loaded configuration from {}", path.display()),
        None => refresh_info!("No configuration file, using defaults"),
    }

    let backend = ReqwestBackend::new(config.backend_settings())
        .with_context(|| format!("configuring backend client for {}", config.base_url))?;
    let state = AppState::with_options(FormOptions::standard(), config.default_kind);
    let poll_settings = config.poll_settings();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("starting async runtime")?;

    runtime.block_on(async move {
        let mut controller = JobLifecycleController::new(Arc::new(backend), state, poll_settings);
        match cli.command.unwrap_or(Command::Console) {
            Command::Console => session::run(&mut controller).await.map(|()| refresh::EXIT_SUCCESS),
            Command::Refresh(args) => refresh::run_refresh(&mut controller, &args).await,
            Command::Channels => refresh::run_channels(&mut controller).await,
        }
    })
}
