// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Command handlers behind the CLI's `run`/`dry-run`/`replay`/`validate`
//! subcommands (SPEC_FULL's CLI surface section), mirroring the shape of
//! the teacher's `Process`/`Validate`/`Show` commands but over
//! `PipelineDefinition`s instead of files.

use std::sync::Arc;

use pipeline_domain::entities::{PipelineDefinition, Summary};
use pipeline_domain::error::PipelineError;
use pipeline_domain::record::Record;
use pipeline_domain::repositories::checkpoint_store::CheckpointStore;
use pipeline_domain::repositories::secret_resolver::SecretResolver;
use pipeline_domain::value_objects::{PipelineId, StepKey};

use crate::application::checkpoint_manager::CheckpointManager;
use crate::application::dispatch::{ExtractorRegistry, LoaderRegistry};
use crate::application::dry_run::DryRunReport;
use crate::application::operator_registry::OperatorRegistry;
use crate::application::scheduler::{ExecuteOptions, Scheduler};
use crate::infrastructure::sample_adapters::{CollectingLoader, SeedExtractor};
use crate::infrastructure::MetricsService;
use pipeline_domain::repositories::operator::OperatorHelpers;

/// Wires a `Scheduler` with the built-in operator catalog plus the sample
/// `seed`/`collect` adapters (SPEC_FULL's "sample infrastructure adapters"),
/// over an optional `CheckpointStore`, `SecretResolver`, and `MetricsService`.
pub fn build_scheduler(
    checkpoint_store: Option<Arc<dyn CheckpointStore>>,
    secrets: Option<Arc<dyn SecretResolver>>,
    metrics: Option<Arc<MetricsService>>,
) -> Scheduler {
    let mut extractors = ExtractorRegistry::new();
    extractors.register(Arc::new(SeedExtractor));

    let mut loaders = LoaderRegistry::new();
    loaders.register(Arc::new(CollectingLoader::new()));

    let mut checkpoints = CheckpointManager::new(checkpoint_store);
    if let Some(metrics) = &metrics {
        checkpoints = checkpoints.with_metrics(metrics.clone());
    }

    let mut scheduler = Scheduler::new(extractors, OperatorRegistry::new(), loaders, OperatorHelpers::new(secrets), checkpoints);
    if let Some(metrics) = metrics {
        scheduler = scheduler.with_metrics(metrics);
    }
    scheduler
}

/// Structural validation only: the `validate` subcommand. Never touches a
/// `CheckpointStore` or runs a single step.
pub fn validate_definition(definition: &PipelineDefinition) -> Result<(), PipelineError> {
    definition.validate()
}

pub async fn run_pipeline(
    scheduler: &Scheduler,
    definition: &PipelineDefinition,
    pipeline_id: Option<PipelineId>,
    resume: bool,
) -> Result<Summary, PipelineError> {
    definition.validate()?;
    let opts = ExecuteOptions {
        pipeline_id,
        resume,
        ..Default::default()
    };
    scheduler.execute(definition, &opts).await
}

pub async fn dry_run_pipeline(scheduler: &Scheduler, definition: &PipelineDefinition) -> Result<DryRunReport, PipelineError> {
    definition.validate()?;
    Ok(scheduler.dry_run(definition).await)
}

pub async fn replay_pipeline(
    scheduler: &Scheduler,
    definition: &PipelineDefinition,
    from_step: &str,
    seed: Vec<Record>,
    pipeline_id: Option<PipelineId>,
    resume: bool,
) -> Result<Summary, PipelineError> {
    definition.validate()?;
    let start_key = StepKey::new(from_step)?;
    let opts = ExecuteOptions {
        pipeline_id,
        resume,
        ..Default::default()
    };
    scheduler.replay_from_step(definition, &start_key, seed, &opts).await
}
