// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `Scheduler` (spec.md §4.1) — drives a `PipelineDefinition` to terminal
//! completion. Linear mode walks steps in declared order; graph mode runs a
//! Kahn's-algorithm topological execution over `edges`, assembling each
//! step's input from its predecessors' outputs.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use pipeline_domain::entities::{Edge, ExecutorContext, Output, PipelineDefinition, Step, StepType, Summary};
use pipeline_domain::error::PipelineError;
use pipeline_domain::record::{as_value, Record};
use pipeline_domain::repositories::callbacks::{NoOpStepLog, OnCancelRequested, OnRecordError, StepLogCallback};
use pipeline_domain::repositories::operator::OperatorHelpers;
use pipeline_domain::routing;
use pipeline_domain::util::path;
use pipeline_domain::value_objects::{PipelineId, RouteBranch, RouteCondition, StepKey};
use serde_json::Value;
use tracing::warn;

use crate::application::checkpoint_manager::CheckpointManager;
use crate::application::dispatch::{ExtractorRegistry, LoaderRegistry};
use crate::application::dry_run::{DryRunReport, DryRunSimulator};
use crate::application::operator_registry::OperatorRegistry;
use crate::application::throughput_controller::ThroughputController;
use crate::application::transform_executor::TransformExecutor;
use crate::infrastructure::MetricsService;

static DEFAULT_STEP_LOG: NoOpStepLog = NoOpStepLog;

/// Caller-supplied hooks and identifiers for one run. `step_log` defaults to
/// a no-op observer so callers that don't care about step-level telemetry
/// can build this with `..Default::default()`.
pub struct ExecuteOptions<'a> {
    pub pipeline_id: Option<PipelineId>,
    /// Preserves the existing checkpoint instead of clearing it before load
    /// (spec.md §3/§4.1's resume semantics). Defaults to `false`: a run
    /// against a reused `pipeline_id` starts fresh unless the caller opts in.
    pub resume: bool,
    pub on_cancel_requested: Option<&'a dyn OnCancelRequested>,
    pub on_record_error: Option<&'a dyn OnRecordError>,
    pub step_log: &'a dyn StepLogCallback,
}

impl<'a> Default for ExecuteOptions<'a> {
    fn default() -> Self {
        Self {
            pipeline_id: None,
            resume: false,
            on_cancel_requested: None,
            on_record_error: None,
            step_log: &DEFAULT_STEP_LOG,
        }
    }
}

enum RunMode {
    Full,
    Seed(Vec<Record>),
    Replay { start_key: StepKey, seed: Vec<Record> },
}

enum StepOutcome {
    Output(Output),
    Paused,
}

pub struct Scheduler {
    extractors: ExtractorRegistry,
    operators: OperatorRegistry,
    loaders: LoaderRegistry,
    helpers: OperatorHelpers,
    checkpoints: CheckpointManager,
    metrics: Option<Arc<MetricsService>>,
}

impl Scheduler {
    pub fn new(
        extractors: ExtractorRegistry,
        operators: OperatorRegistry,
        loaders: LoaderRegistry,
        helpers: OperatorHelpers,
        checkpoints: CheckpointManager,
    ) -> Self {
        Self {
            extractors,
            operators,
            loaders,
            helpers,
            checkpoints,
            metrics: None,
        }
    }

    /// Registers a `MetricsService` the throughput controller reports
    /// per-chunk/per-step counters to (SPEC_FULL's ambient metrics
    /// section).
    pub fn with_metrics(mut self, metrics: Arc<MetricsService>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Runs `definition` from the start.
    pub async fn execute(&self, definition: &PipelineDefinition, opts: &ExecuteOptions<'_>) -> Result<Summary, PipelineError> {
        definition.validate()?;
        let mut ctx = self.new_context(definition, opts).await;
        let result = self.run(definition, &mut ctx, opts, RunMode::Full).await;
        self.finish(&ctx, opts).await;
        result
    }

    /// Skips every EXTRACT step; `seed` becomes the input to the first
    /// non-extract step (or, in graph mode, the output standing in for
    /// every EXTRACT step).
    pub async fn execute_with_seed(
        &self,
        definition: &PipelineDefinition,
        seed: Vec<Record>,
        opts: &ExecuteOptions<'_>,
    ) -> Result<Summary, PipelineError> {
        definition.validate()?;
        let mut ctx = self.new_context(definition, opts).await;
        let result = self.run(definition, &mut ctx, opts, RunMode::Seed(seed)).await;
        self.finish(&ctx, opts).await;
        result
    }

    /// Reuses `seed` as the output of `start_key` and executes only its
    /// successors (declaration order in linear mode, graph reachability in
    /// graph mode).
    pub async fn replay_from_step(
        &self,
        definition: &PipelineDefinition,
        start_key: &StepKey,
        seed: Vec<Record>,
        opts: &ExecuteOptions<'_>,
    ) -> Result<Summary, PipelineError> {
        definition.validate()?;
        let mut ctx = self.new_context(definition, opts).await;
        let result = self
            .run(
                definition,
                &mut ctx,
                opts,
                RunMode::Replay {
                    start_key: start_key.clone(),
                    seed,
                },
            )
            .await;
        self.finish(&ctx, opts).await;
        result
    }

    /// See [`DryRunSimulator`] (spec.md §4.6).
    pub async fn dry_run(&self, definition: &PipelineDefinition) -> DryRunReport {
        let simulator = DryRunSimulator::new(&self.extractors, &self.operators, &self.loaders, &self.helpers);
        simulator.run(definition).await
    }

    async fn new_context(&self, definition: &PipelineDefinition, opts: &ExecuteOptions<'_>) -> ExecutorContext {
        let mut ctx = ExecutorContext::new(definition.context.error_handling.clone(), definition.context.checkpointing.clone());
        let pipeline_id = if ctx.checkpointing.enabled { opts.pipeline_id.as_ref() } else { None };
        if !opts.resume {
            self.checkpoints.clear_checkpoint(pipeline_id).await;
        }
        self.checkpoints.load_checkpoint(&mut ctx, pipeline_id).await;
        ctx
    }

    async fn finish(&self, ctx: &ExecutorContext, opts: &ExecuteOptions<'_>) {
        let pipeline_id = if ctx.checkpointing.enabled { opts.pipeline_id.as_ref() } else { None };
        self.checkpoints.save_checkpoint(ctx, pipeline_id).await;
    }

    async fn run(
        &self,
        definition: &PipelineDefinition,
        ctx: &mut ExecutorContext,
        opts: &ExecuteOptions<'_>,
        mode: RunMode,
    ) -> Result<Summary, PipelineError> {
        if definition.is_graph() {
            self.run_graph(definition, ctx, opts, mode).await
        } else {
            self.run_linear(definition, ctx, opts, mode).await
        }
    }

    async fn run_linear(
        &self,
        definition: &PipelineDefinition,
        ctx: &mut ExecutorContext,
        opts: &ExecuteOptions<'_>,
        mode: RunMode,
    ) -> Result<Summary, PipelineError> {
        let mut summary = Summary::default();
        let (mut records, skip_extract, start_after) = match mode {
            RunMode::Full => (Vec::new(), false, None),
            RunMode::Seed(seed) => (seed, true, None),
            RunMode::Replay { start_key, seed } => (seed, false, Some(start_key)),
        };

        let mut started = start_after.is_none();
        let mut dedup_applied = false;

        for step in &definition.steps {
            if !started {
                if Some(&step.key) == start_after.as_ref() {
                    started = true;
                }
                continue;
            }
            if skip_extract && step.step_type == StepType::Extract {
                continue;
            }
            if let Some(cancel) = opts.on_cancel_requested {
                if cancel.is_cancelled() {
                    break;
                }
            }

            let len = records.len();
            opts.step_log.on_step_start(&step.key);
            match self.run_step(step, records, ctx, definition, opts, &mut summary, false).await {
                Ok(StepOutcome::Output(out)) => {
                    let mut next = out.into_records();
                    if step.step_type == StepType::Extract {
                        if let Some(field) = &definition.context.idempotency_key_field {
                            if !dedup_applied {
                                next = dedup_by_key(next, field);
                                dedup_applied = true;
                            }
                        }
                    }
                    opts.step_log.on_step_complete(&step.key, next.len());
                    records = if step.step_type.is_terminal() { Vec::new() } else { next };
                }
                Ok(StepOutcome::Paused) => {
                    return Ok(Summary::paused_at(step.key.as_str()).with_counts(summary.processed, summary.succeeded, summary.failed));
                }
                Err(err) => {
                    opts.step_log.on_step_failed(&step.key, &err.to_string());
                    summary.processed += len as u64;
                    summary.failed += len as u64;
                    if err.is_fatal() || ctx.error_handling.is_fail_fast() {
                        return Err(err);
                    }
                    records = Vec::new();
                }
            }
        }
        Ok(summary)
    }

    async fn run_graph(
        &self,
        definition: &PipelineDefinition,
        ctx: &mut ExecutorContext,
        opts: &ExecuteOptions<'_>,
        mode: RunMode,
    ) -> Result<Summary, PipelineError> {
        let mut summary = Summary::default();
        let order_index: HashMap<&StepKey, usize> = definition.steps.iter().enumerate().map(|(i, s)| (&s.key, i)).collect();
        let steps_by_key: HashMap<&StepKey, &Step> = definition.steps.iter().map(|s| (&s.key, s)).collect();

        let mut predecessors: HashMap<StepKey, Vec<&Edge>> = HashMap::new();
        let mut successors: HashMap<StepKey, Vec<&Edge>> = HashMap::new();
        for edge in &definition.edges {
            predecessors.entry(edge.to.clone()).or_default().push(edge);
            successors.entry(edge.from.clone()).or_default().push(edge);
        }

        let mut in_degree: HashMap<StepKey, usize> = definition
            .steps
            .iter()
            .map(|s| (s.key.clone(), predecessors.get(&s.key).map_or(0, Vec::len)))
            .collect();

        let mut outputs: HashMap<StepKey, Output> = HashMap::new();
        let mut completed: HashSet<StepKey> = HashSet::new();
        let mut dedup_applied = false;

        match &mode {
            RunMode::Full => {}
            RunMode::Seed(seed) => {
                for step in &definition.steps {
                    if step.step_type == StepType::Extract {
                        outputs.insert(step.key.clone(), Output::Records(seed.clone()));
                        completed.insert(step.key.clone());
                    }
                }
            }
            RunMode::Replay { start_key, seed } => {
                outputs.insert(start_key.clone(), Output::Records(seed.clone()));
                completed.insert(start_key.clone());
            }
        }

        for key in &completed {
            for edge in successors.get(key).into_iter().flatten() {
                if let Some(d) = in_degree.get_mut(&edge.to) {
                    *d = d.saturating_sub(1);
                }
            }
        }

        let mut ready: Vec<StepKey> = definition
            .steps
            .iter()
            .filter(|s| !completed.contains(&s.key) && in_degree.get(&s.key).copied().unwrap_or(0) == 0)
            .map(|s| s.key.clone())
            .collect();

        while !ready.is_empty() {
            if let Some(cancel) = opts.on_cancel_requested {
                if cancel.is_cancelled() {
                    break;
                }
            }
            ready.sort_by_key(|k| order_index[k]);
            let key = ready.remove(0);
            let step = steps_by_key[&key];

            let mut input = Vec::new();
            for edge in predecessors.get(&key).into_iter().flatten() {
                let Some(out) = outputs.get(&edge.from) else { continue };
                match &edge.branch {
                    Some(branch) => input.extend(out.branch(branch)),
                    None => input.extend(out.clone().into_records()),
                }
            }

            let len = input.len();
            opts.step_log.on_step_start(&key);
            let outcome = self.run_step(step, input, ctx, definition, opts, &mut summary, true).await;
            match outcome {
                Ok(StepOutcome::Output(mut out)) => {
                    if step.step_type == StepType::Extract {
                        if let Some(field) = &definition.context.idempotency_key_field {
                            if !dedup_applied {
                                out = Output::Records(dedup_by_key(out.into_records(), field));
                                dedup_applied = true;
                            }
                        }
                    }
                    opts.step_log.on_step_complete(&key, out.len());
                    outputs.insert(key.clone(), out);
                    completed.insert(key.clone());
                    Self::release_successors(&key, &successors, &mut in_degree, &completed, &mut ready);
                }
                Ok(StepOutcome::Paused) => {
                    return Ok(Summary::paused_at(key.as_str()).with_counts(summary.processed, summary.succeeded, summary.failed));
                }
                Err(err) => {
                    opts.step_log.on_step_failed(&key, &err.to_string());
                    summary.processed += len as u64;
                    summary.failed += len as u64;
                    if err.is_fatal() || ctx.error_handling.is_fail_fast() {
                        return Err(err);
                    }
                    outputs.insert(key.clone(), Output::Empty);
                    completed.insert(key.clone());
                    Self::release_successors(&key, &successors, &mut in_degree, &completed, &mut ready);
                }
            }
        }

        Ok(summary)
    }

    fn release_successors(
        key: &StepKey,
        successors: &HashMap<StepKey, Vec<&Edge>>,
        in_degree: &mut HashMap<StepKey, usize>,
        completed: &HashSet<StepKey>,
        ready: &mut Vec<StepKey>,
    ) {
        for edge in successors.get(key).into_iter().flatten() {
            if let Some(d) = in_degree.get_mut(&edge.to) {
                *d = d.saturating_sub(1);
                if *d == 0 && !completed.contains(&edge.to) && !ready.contains(&edge.to) {
                    ready.push(edge.to.clone());
                }
            }
        }
    }

    /// Dispatches a single step per the table in spec.md §4.1.
    #[allow(clippy::too_many_arguments)]
    async fn run_step(
        &self,
        step: &Step,
        input: Vec<Record>,
        ctx: &mut ExecutorContext,
        definition: &PipelineDefinition,
        opts: &ExecuteOptions<'_>,
        summary: &mut Summary,
        graph_mode: bool,
    ) -> Result<StepOutcome, PipelineError> {
        match step.step_type {
            StepType::Trigger => Ok(StepOutcome::Output(Output::Records(input))),
            StepType::Extract => {
                let code = step
                    .config
                    .get("adapterCode")
                    .and_then(Value::as_str)
                    .ok_or_else(|| PipelineError::invalid_config(format!("[{}] EXTRACT requires 'adapterCode'", step.key)))?;
                let records = match self.extractors.get(code) {
                    Some(extractor) => extractor.extract(step, ctx, opts.on_record_error).await?,
                    None => {
                        warn!(step = %step.key, %code, "unknown extractor adapter code, returning no records");
                        Vec::new()
                    }
                };
                opts.step_log.on_extract_data(&step.key, records.len());
                Ok(StepOutcome::Output(Output::Records(records)))
            }
            StepType::Transform | StepType::Enrich => {
                let out = TransformExecutor::execute_operator(&step.key, &step.config, input, &self.operators, &self.helpers, opts.on_record_error)
                    .await?;
                Ok(StepOutcome::Output(Output::Records(out)))
            }
            StepType::Validate => {
                let out = TransformExecutor::execute_validate(&step.key, &step.config, input, &ctx.error_handling, opts.on_record_error)?;
                Ok(StepOutcome::Output(Output::Records(out)))
            }
            StepType::Route => {
                if graph_mode {
                    Ok(StepOutcome::Output(TransformExecutor::execute_route_branches(&step.config, input)?))
                } else {
                    Ok(StepOutcome::Output(Output::Records(TransformExecutor::execute_route(&step.config, input)?)))
                }
            }
            StepType::Load | StepType::Export | StepType::Feed | StepType::Sink => {
                let code = step.config.get("adapterCode").and_then(Value::as_str).ok_or_else(|| {
                    PipelineError::invalid_config(format!("[{}] {:?} requires 'adapterCode'", step.key, step.step_type))
                })?;
                let result = match self.loaders.get(code) {
                    Some(loader) => {
                        let throughput = step.throughput.clone().unwrap_or_default().merged_with_default(&definition.context.throughput);
                        ThroughputController::run(step, input, &throughput, &ctx.error_handling, loader, self.metrics.as_deref())
                            .await?
                            .result
                    }
                    None => {
                        warn!(step = %step.key, %code, "unknown loader adapter code, counting all input as failed");
                        pipeline_domain::entities::ExecutionResult::new(0, input.len() as u64)
                    }
                };
                summary.record_result(result);
                opts.step_log.on_load_data(&step.key, result.ok, result.fail);
                Ok(StepOutcome::Output(Output::Empty))
            }
            StepType::Gate => {
                if gate_should_pause(&step.config, &input)? {
                    Ok(StepOutcome::Paused)
                } else {
                    Ok(StepOutcome::Output(Output::Records(input)))
                }
            }
        }
    }
}

/// Keeps the first occurrence of each distinct value of `field` (spec.md
/// §4.5's idempotency dedup): `null`/absent maps to `""`.
fn dedup_by_key(records: Vec<Record>, field: &str) -> Vec<Record> {
    let mut seen: HashSet<String> = HashSet::new();
    records
        .into_iter()
        .filter(|record| {
            let key = match path::get(&as_value(record), field) {
                None | Some(Value::Null) => String::new(),
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
            };
            seen.insert(key)
        })
        .collect()
}

/// A GATE step pauses the run when any record in the current batch matches
/// every condition in `config.when`; absent `when` never pauses. Reuses
/// ROUTE's branch-matching semantics (a single synthetic branch) rather
/// than a bespoke predicate language.
fn gate_should_pause(config: &Value, records: &[Record]) -> Result<bool, PipelineError> {
    let Some(when) = config.get("when") else { return Ok(false) };
    let conditions: Vec<RouteCondition> =
        serde_json::from_value(when.clone()).map_err(|e| PipelineError::invalid_config(format!("invalid GATE 'when': {e}")))?;
    let branch = RouteBranch {
        name: "pause".to_string(),
        when: conditions,
    };
    let matched = routing::first_branch_with_any_match(records.to_vec(), std::slice::from_ref(&branch));
    Ok(!matched.is_empty())
}
