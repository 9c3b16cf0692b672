// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `EngineConfig` — process-wide defaults layered from an optional TOML/YAML
//! file and overridden by `PIPE_`-prefixed environment variables, following
//! the teacher's `infrastructure::config` layering convention.

use pipeline_domain::error::PipelineError;
use serde::{Deserialize, Serialize};

const ENV_PREFIX: &str = "PIPE";

/// Which `CheckpointStore` adapter the engine wires up at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointStoreKind {
    InMemory,
    Sqlite,
}

impl Default for CheckpointStoreKind {
    fn default() -> Self {
        Self::InMemory
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Default batch size for the throughput controller when a pipeline's
    /// own `ThroughputConfig` doesn't set one (spec.md §4.4).
    pub default_batch_size: usize,
    /// Default bounded concurrency for the throughput controller.
    pub default_concurrency: usize,
    /// Number of compiled expressions the evaluator's LRU cache retains
    /// (spec.md §4.7).
    pub expression_cache_size: usize,
    /// Hard wall-clock timeout, in milliseconds, for a single expression
    /// evaluation (spec.md §4.7).
    pub expression_timeout_ms: u64,
    pub checkpoint_store: CheckpointStoreKind,
    /// Path to the SQLite database file when `checkpoint_store = sqlite`.
    /// `:memory:` is accepted.
    pub sqlite_path: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_batch_size: 100,
            default_concurrency: 4,
            expression_cache_size: 256,
            expression_timeout_ms: 50,
            checkpoint_store: CheckpointStoreKind::default(),
            sqlite_path: "checkpoints.db".to_string(),
        }
    }
}

impl EngineConfig {
    /// Loads config layered as: built-in defaults, then an optional file at
    /// `path` (TOML or YAML, by extension), then `PIPE_`-prefixed
    /// environment variables (e.g. `PIPE_DEFAULT_BATCH_SIZE=200`).
    pub fn load(path: Option<&str>) -> Result<Self, PipelineError> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        let builder = builder.add_source(config::Environment::with_prefix(ENV_PREFIX).separator("_"));

        let config = builder.build()?;
        // Fields absent from every source fall back to `EngineConfig::default()`
        // via the struct's `#[serde(default)]` attribute.
        config.try_deserialize().map_err(PipelineError::from)
    }
}

impl From<config::ConfigError> for PipelineError {
    fn from(err: config::ConfigError) -> Self {
        PipelineError::invalid_config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_used_when_nothing_overrides_them() {
        let cfg = EngineConfig::load(None).unwrap();
        assert_eq!(cfg.default_batch_size, 100);
        assert_eq!(cfg.checkpoint_store, CheckpointStoreKind::InMemory);
    }

    #[test]
    fn environment_overrides_defaults() {
        std::env::set_var("PIPE_DEFAULT_BATCH_SIZE", "250");
        let cfg = EngineConfig::load(None).unwrap();
        assert_eq!(cfg.default_batch_size, 250);
        std::env::remove_var("PIPE_DEFAULT_BATCH_SIZE");
    }
}
