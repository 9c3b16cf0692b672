// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline CLI Entry Point
//!
//! Parses and security-validates CLI arguments, builds the bootstrap
//! `AppConfig`, initializes tracing, dispatches to the engine, and maps
//! the outcome to a Unix exit code.

use adaptive_pipeline_bootstrap::cli::ValidatedCommand;
use adaptive_pipeline_bootstrap::config::{AppConfig, LogLevel};
use adaptive_pipeline_bootstrap::exit_code::ExitCode;
use adaptive_pipeline_bootstrap::{bootstrap_cli, run};

fn app_config(cli: &adaptive_pipeline_bootstrap::ValidatedCli) -> AppConfig {
    let mut builder = AppConfig::builder()
        .app_name("pipeline")
        .log_level(if cli.verbose { LogLevel::Debug } else { LogLevel::Info })
        .verbose(cli.verbose);

    let definition_path = match &cli.command {
        ValidatedCommand::Run { definition, .. }
        | ValidatedCommand::DryRun { definition }
        | ValidatedCommand::Replay { definition, .. }
        | ValidatedCommand::Validate { definition } => definition.clone(),
    };
    builder = builder.definition_path(definition_path);

    if let Some(config_path) = &cli.config {
        builder = builder.engine_config_path(config_path.clone());
    }

    builder.build()
}

fn init_tracing(level: LogLevel) {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", format!("{:?}", level).to_lowercase());
    }
    pipeline_engine::infrastructure::logging::init_tracing();
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = match bootstrap_cli() {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("argument error: {e}");
            return std::process::ExitCode::from(ExitCode::UsageError.as_i32() as u8);
        }
    };

    let config = app_config(&cli);
    init_tracing(config.log_level());
    tracing::info!(app = config.app_name(), "starting");

    let code = match run::dispatch(cli).await {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            tracing::error!(error = %e, "pipeline run failed");
            ExitCode::from_pipeline_error(&e)
        }
    };

    std::process::ExitCode::from(code.as_i32() as u8)
}
