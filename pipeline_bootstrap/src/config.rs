// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Application Configuration
//!
//! Bootstrap-phase configuration, built from validated CLI arguments
//! (`cli::validator`) before any pipeline is loaded. Immutable once built.

use std::path::PathBuf;

/// Log level configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

impl LogLevel {
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Bootstrap-phase application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    app_name: String,
    log_level: LogLevel,
    /// Path to the `PipelineDefinition` JSON/YAML document.
    definition_path: Option<PathBuf>,
    /// Path to an `EngineConfig` file (layered with `PIPE_` env overrides).
    engine_config_path: Option<PathBuf>,
    verbose: bool,
}

impl AppConfig {
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn log_level(&self) -> LogLevel {
        self.log_level
    }

    pub fn definition_path(&self) -> Option<&PathBuf> {
        self.definition_path.as_ref()
    }

    pub fn engine_config_path(&self) -> Option<&PathBuf> {
        self.engine_config_path.as_ref()
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    app_name: Option<String>,
    log_level: Option<LogLevel>,
    definition_path: Option<PathBuf>,
    engine_config_path: Option<PathBuf>,
    verbose: bool,
}

impl AppConfigBuilder {
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self
    }

    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = Some(level);
        self
    }

    pub fn definition_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.definition_path = Some(path.into());
        self
    }

    pub fn engine_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.engine_config_path = Some(path.into());
        self
    }

    pub fn verbose(mut self, enabled: bool) -> Self {
        self.verbose = enabled;
        self
    }

    /// # Panics
    /// Panics if `app_name` was not set.
    pub fn build(self) -> AppConfig {
        self.try_build().expect("app_name is required")
    }

    pub fn try_build(self) -> Result<AppConfig, String> {
        Ok(AppConfig {
            app_name: self.app_name.ok_or("app_name is required")?,
            log_level: self.log_level.unwrap_or_default(),
            definition_path: self.definition_path,
            engine_config_path: self.engine_config_path,
            verbose: self.verbose,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_with_minimal_fields() {
        let config = AppConfig::builder().app_name("pipeline-cli").build();
        assert_eq!(config.app_name(), "pipeline-cli");
        assert_eq!(config.log_level(), LogLevel::Info);
        assert!(config.definition_path().is_none());
        assert!(!config.is_verbose());
    }

    #[test]
    fn builds_with_all_fields() {
        let config = AppConfig::builder()
            .app_name("pipeline-cli")
            .log_level(LogLevel::Debug)
            .definition_path("pipeline.json")
            .engine_config_path("engine.toml")
            .verbose(true)
            .build();
        assert_eq!(config.log_level(), LogLevel::Debug);
        assert_eq!(config.definition_path(), Some(&PathBuf::from("pipeline.json")));
        assert!(config.is_verbose());
    }

    #[test]
    fn try_build_fails_without_app_name() {
        assert!(AppConfigBuilder::default().try_build().is_err());
    }
}
