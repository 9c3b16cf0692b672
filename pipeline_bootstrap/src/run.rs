// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Composition Root
//!
//! Wires a `ValidatedCli` invocation to the engine: loads the
//! `PipelineDefinition` document, builds the `Scheduler` over the
//! configured `CheckpointStore`/`SecretResolver`, installs signal-driven
//! cooperative cancellation, and dispatches to the matching
//! `pipeline_engine::presentation::commands` entry point.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use pipeline_domain::entities::PipelineDefinition;
use pipeline_domain::error::PipelineError;
use pipeline_domain::record::Record;
use pipeline_domain::repositories::checkpoint_store::CheckpointStore;
use pipeline_domain::repositories::secret_resolver::SecretResolver;
use pipeline_domain::value_objects::PipelineId;
use pipeline_engine::application::scheduler::Scheduler;
use pipeline_engine::infrastructure::checkpoint_store::{InMemoryCheckpointStore, SqliteCheckpointStore};
use pipeline_engine::infrastructure::config::{CheckpointStoreKind, EngineConfig};
use pipeline_engine::infrastructure::logging::TracingStepLog;
use pipeline_engine::infrastructure::secret_resolver::EnvSecretResolver;
use pipeline_engine::infrastructure::MetricsService;
use pipeline_engine::presentation::commands;

use crate::cli::{ValidatedCli, ValidatedCommand};
use crate::signals::create_signal_handler;

/// Reads a `PipelineDefinition` document, choosing JSON or YAML by the
/// file extension (`.json` vs `.yml`/`.yaml`; anything else is tried as
/// JSON first, then YAML).
fn load_definition(path: &Path) -> Result<PipelineDefinition, PipelineError> {
    let text = std::fs::read_to_string(path).map_err(|e| PipelineError::invalid_config(format!("reading {}: {e}", path.display())))?;

    let is_yaml = matches!(path.extension().and_then(|ext| ext.to_str()), Some("yml") | Some("yaml"));
    if is_yaml {
        serde_yaml::from_str(&text).map_err(|e| PipelineError::invalid_config(format!("parsing {}: {e}", path.display())))
    } else {
        serde_json::from_str(&text).or_else(|json_err| {
            serde_yaml::from_str(&text)
                .map_err(|_| PipelineError::invalid_config(format!("parsing {}: {json_err}", path.display())))
        })
    }
}

/// Reads a seed-records file: a JSON array of records.
fn load_seed(path: &Path) -> Result<Vec<Record>, PipelineError> {
    let text = std::fs::read_to_string(path).map_err(|e| PipelineError::invalid_config(format!("reading {}: {e}", path.display())))?;
    serde_json::from_str(&text).map_err(|e| PipelineError::invalid_config(format!("parsing {}: {e}", path.display())))
}

async fn build_checkpoint_store(config: &EngineConfig) -> Result<Arc<dyn CheckpointStore>, PipelineError> {
    match config.checkpoint_store {
        CheckpointStoreKind::InMemory => Ok(Arc::new(InMemoryCheckpointStore::new())),
        CheckpointStoreKind::Sqlite => {
            let store = SqliteCheckpointStore::from_file(&config.sqlite_path).await?;
            Ok(Arc::new(store))
        }
    }
}

/// Spawns the platform signal handler and flips `cancelled` once a
/// shutdown signal arrives; the scheduler polls `cancelled` cooperatively
/// via `OnCancelRequested`.
fn install_signal_handler(cancelled: Arc<AtomicBool>) {
    tokio::spawn(async move {
        let handler = create_signal_handler();
        let flag = cancelled.clone();
        handler
            .wait_for_signal(Box::new(move || {
                flag.store(true, Ordering::SeqCst);
            }))
            .await;
    });
}

/// Runs the command a validated CLI invocation selected, returning the
/// engine-level result so the caller can map it to an `ExitCode`.
pub async fn dispatch(cli: ValidatedCli) -> Result<(), PipelineError> {
    // `validate` is pure structural validation (spec.md's CLI surface); it
    // never needs a CheckpointStore or SecretResolver, so it skips engine
    // config and scheduler wiring entirely.
    if let ValidatedCommand::Validate { definition } = &cli.command {
        let definition = load_definition(definition)?;
        commands::validate_definition(&definition)?;
        tracing::info!("pipeline definition is valid");
        return Ok(());
    }

    let engine_config = EngineConfig::load(cli.config.as_deref().and_then(|p| p.to_str()))?;
    let checkpoint_store = build_checkpoint_store(&engine_config).await?;
    let secrets: Arc<dyn SecretResolver> = Arc::new(EnvSecretResolver::new());
    let metrics = Arc::new(MetricsService::new());
    let scheduler = commands::build_scheduler(Some(checkpoint_store), Some(secrets), Some(metrics));

    let cancelled = Arc::new(AtomicBool::new(false));
    install_signal_handler(cancelled.clone());

    match cli.command {
        ValidatedCommand::Validate { .. } => unreachable!("handled above"),
        ValidatedCommand::DryRun { definition } => {
            let definition = load_definition(&definition)?;
            let report = commands::dry_run_pipeline(&scheduler, &definition).await?;
            tracing::info!(processed = report.metrics.processed, "dry run complete");
            Ok(())
        }
        ValidatedCommand::Run {
            definition,
            pipeline_id,
            seed,
            resume,
        } => {
            let definition = load_definition(&definition)?;
            let pipeline_id = parse_pipeline_id(pipeline_id.as_deref())?;
            let summary = run_with_cancellation(&scheduler, &definition, pipeline_id, resume, seed, &cancelled).await?;
            tracing::info!(succeeded = summary.succeeded, failed = summary.failed, "run complete");
            Ok(())
        }
        ValidatedCommand::Replay {
            definition,
            from,
            seed,
            pipeline_id,
            resume,
        } => {
            let definition = load_definition(&definition)?;
            let pipeline_id = parse_pipeline_id(pipeline_id.as_deref())?;
            let seed_records = match seed {
                Some(path) => load_seed(&path)?,
                None => Vec::new(),
            };
            let summary = commands::replay_pipeline(&scheduler, &definition, &from, seed_records, pipeline_id, resume).await?;
            tracing::info!(succeeded = summary.succeeded, failed = summary.failed, "replay complete");
            Ok(())
        }
    }
}

fn parse_pipeline_id(raw: Option<&str>) -> Result<Option<PipelineId>, PipelineError> {
    match raw {
        Some(value) => value
            .parse::<PipelineId>()
            .map(Some)
            .map_err(|e| PipelineError::invalid_config(format!("invalid pipeline id '{value}': {e}"))),
        None => Ok(None),
    }
}

/// `run` wires the same cooperative-cancellation `OnCancelRequested` and
/// `TracingStepLog` that `main` installs for every other command; kept
/// separate from `commands::run_pipeline` so the presentation layer stays
/// usable without a signal handler (e.g. from tests).
async fn run_with_cancellation(
    scheduler: &Scheduler,
    definition: &PipelineDefinition,
    pipeline_id: Option<PipelineId>,
    resume: bool,
    seed: Option<std::path::PathBuf>,
    cancelled: &Arc<AtomicBool>,
) -> Result<pipeline_domain::entities::Summary, PipelineError> {
    use pipeline_engine::application::scheduler::ExecuteOptions;

    definition.validate()?;
    let cancel_flag = cancelled.clone();
    let on_cancel = move || cancel_flag.load(Ordering::SeqCst);
    let step_log = TracingStepLog;
    let opts = ExecuteOptions {
        pipeline_id,
        resume,
        on_cancel_requested: Some(&on_cancel),
        on_record_error: None,
        step_log: &step_log,
    };

    match seed {
        Some(path) => {
            let seed_records = load_seed(&path)?;
            scheduler.execute_with_seed(definition, seed_records, &opts).await
        }
        None => scheduler.execute(definition, &opts).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_pipeline_id_accepts_valid_ulid() {
        let id = parse_pipeline_id(Some("01ARZ3NDEKTSV4RRFFQ69G5FAV")).unwrap();
        assert!(id.is_some());
    }

    #[test]
    fn parse_pipeline_id_rejects_garbage() {
        assert!(parse_pipeline_id(Some("not-a-ulid")).is_err());
    }

    #[test]
    fn parse_pipeline_id_none_passes_through() {
        assert!(parse_pipeline_id(None).unwrap().is_none());
    }

    #[test]
    fn loads_a_json_definition_document() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("pipeline-bootstrap-test-{:?}.json", std::thread::current().id()));
        std::fs::write(
            &path,
            r#"{"steps": [{"key": "e1", "name": "extract", "type": "EXTRACT", "config": {}}]}"#,
        )
        .unwrap();

        let definition = load_definition(&path).unwrap();
        assert_eq!(definition.steps.len(), 1);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn loads_a_seed_records_file() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("pipeline-bootstrap-seed-{:?}.json", std::thread::current().id()));
        std::fs::write(&path, r#"[{"id": 1}, {"id": 2}]"#).unwrap();

        let seed = load_seed(&path).unwrap();
        assert_eq!(seed.len(), 2);

        std::fs::remove_file(&path).ok();
    }
}
