// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # CLI Parser
//!
//! Command-line interface parsing using clap. Defines the CLI structure
//! only; security validation happens in `cli::validator` after parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Top-level CLI structure.
#[derive(Parser, Debug, Clone)]
#[command(name = "pipeline")]
#[command(about = concat!("Adaptive Pipeline Engine v", env!("CARGO_PKG_VERSION")))]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// `EngineConfig` file path (TOML/YAML, layered under `PIPE_` env overrides)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// CLI subcommands, each operating on a `PipelineDefinition` document.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run a pipeline definition to completion
    Run {
        /// Pipeline definition file (JSON or YAML)
        #[arg(short, long)]
        definition: PathBuf,

        /// Pipeline id to resume under (ULID); a fresh id is minted if omitted
        #[arg(long)]
        pipeline_id: Option<String>,

        /// Seed records file (JSON array), used by the `seed` extractor
        #[arg(long)]
        seed: Option<PathBuf>,

        /// Preserve the existing checkpoint for `pipeline_id` instead of
        /// clearing it before the run starts
        #[arg(long)]
        resume: bool,
    },

    /// Simulate a pipeline definition without touching any Loader or CheckpointStore
    DryRun {
        /// Pipeline definition file (JSON or YAML)
        #[arg(short, long)]
        definition: PathBuf,
    },

    /// Resume a pipeline from a given step using a checkpointed or supplied seed
    Replay {
        /// Pipeline definition file (JSON or YAML)
        #[arg(short, long)]
        definition: PathBuf,

        /// Step key to resume from
        #[arg(short, long)]
        from: String,

        /// Seed records file (JSON array) to replay with
        #[arg(long)]
        seed: Option<PathBuf>,

        /// Pipeline id whose checkpoint should be resumed
        #[arg(long)]
        pipeline_id: Option<String>,

        /// Preserve the existing checkpoint for `pipeline_id` instead of
        /// clearing it before the replay starts
        #[arg(long)]
        resume: bool,
    },

    /// Validate a pipeline definition's structure (duplicate keys, unknown
    /// edges, cycles) without running a single step
    Validate {
        /// Pipeline definition file (JSON or YAML)
        #[arg(short, long)]
        definition: PathBuf,
    },
}

/// Parses CLI arguments, exiting the process on `--help`/`--version`/parse
/// errors (clap's default behavior).
pub fn parse_cli() -> Cli {
    Cli::parse()
}
