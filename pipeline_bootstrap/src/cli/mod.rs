// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # CLI Module
//!
//! Two-phase argument handling: `parser` defines the clap structure,
//! `validator` re-checks every path and identifier clap accepted for
//! security issues before anything touches the filesystem.

pub mod parser;
pub mod validator;

use std::path::PathBuf;

pub use parser::{Cli, Commands};
pub use validator::{ParseError, SecureArgParser};

/// A `Commands` variant whose paths and identifiers have passed
/// `SecureArgParser` validation.
#[derive(Debug, Clone)]
pub enum ValidatedCommand {
    Run {
        definition: PathBuf,
        pipeline_id: Option<String>,
        seed: Option<PathBuf>,
        resume: bool,
    },
    DryRun {
        definition: PathBuf,
    },
    Replay {
        definition: PathBuf,
        from: String,
        seed: Option<PathBuf>,
        pipeline_id: Option<String>,
        resume: bool,
    },
    Validate {
        definition: PathBuf,
    },
}

/// Fully parsed and security-validated CLI invocation.
#[derive(Debug, Clone)]
pub struct ValidatedCli {
    pub command: ValidatedCommand,
    pub verbose: bool,
    pub config: Option<PathBuf>,
}

fn validate_definition_path(path: &PathBuf) -> Result<PathBuf, ParseError> {
    SecureArgParser::validate_path(&path.to_string_lossy())
}

fn validate_command(command: Commands) -> Result<ValidatedCommand, ParseError> {
    match command {
        Commands::Run {
            definition,
            pipeline_id,
            seed,
            resume,
        } => Ok(ValidatedCommand::Run {
            definition: validate_definition_path(&definition)?,
            pipeline_id: pipeline_id.map(|id| SecureArgParser::validate_pipeline_id(&id)).transpose()?,
            seed: match seed {
                Some(path) => Some(validate_definition_path(&path)?),
                None => None,
            },
            resume,
        }),
        Commands::DryRun { definition } => Ok(ValidatedCommand::DryRun {
            definition: validate_definition_path(&definition)?,
        }),
        Commands::Replay {
            definition,
            from,
            seed,
            pipeline_id,
            resume,
        } => Ok(ValidatedCommand::Replay {
            definition: validate_definition_path(&definition)?,
            from: SecureArgParser::validate_step_key(&from)?,
            seed: match seed {
                Some(path) => Some(validate_definition_path(&path)?),
                None => None,
            },
            pipeline_id: pipeline_id.map(|id| SecureArgParser::validate_pipeline_id(&id)).transpose()?,
            resume,
        }),
        Commands::Validate { definition } => Ok(ValidatedCommand::Validate {
            definition: validate_definition_path(&definition)?,
        }),
    }
}

/// Parses CLI arguments (clap exits the process on `--help`/`--version`/a
/// parse error) and re-validates every path and identifier it extracted.
pub fn parse_and_validate() -> Result<ValidatedCli, ParseError> {
    let cli = parser::parse_cli();
    let config = match cli.config {
        Some(path) => Some(validate_definition_path(&path)?),
        None => None,
    };

    Ok(ValidatedCli {
        command: validate_command(cli.command)?,
        verbose: cli.verbose,
        config,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_dangerous_definition_path() {
        let command = Commands::Validate {
            definition: PathBuf::from("../etc/passwd"),
        };
        assert!(validate_command(command).is_err());
    }

    #[test]
    fn rejects_malformed_pipeline_id() {
        let command = Commands::Run {
            definition: PathBuf::from("Cargo.toml"),
            pipeline_id: Some("not-a-ulid".to_string()),
            seed: None,
            resume: false,
        };
        assert!(matches!(
            validate_command(command),
            Err(ParseError::InvalidValue { .. })
        ));
    }
}
