// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! End-to-end scheduler scenarios exercising the scheduler, operator
//! catalog, throughput controller, and expression evaluator together.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use pipeline_domain::entities::{Edge, ExecutionResult, ExecutorContext, PipelineContext, PipelineDefinition, Step, StepType};
use pipeline_domain::error::PipelineError;
use pipeline_domain::record::{as_value, Record};
use pipeline_domain::repositories::callbacks::OnRecordError;
use pipeline_domain::repositories::extractor::Extractor;
use pipeline_domain::repositories::loader::Loader;
use pipeline_domain::value_objects::{
    CheckpointingPolicy, DrainStrategy, ErrorHandlingMode, ErrorHandlingPolicy, PauseOnErrorRate, PipelineId, StepKey, ThroughputConfig,
};
use pipeline_engine::application::checkpoint_manager::CheckpointManager;
use pipeline_engine::application::dispatch::{ExtractorRegistry, LoaderRegistry};
use pipeline_engine::application::expression;
use pipeline_engine::application::operator_registry::OperatorRegistry;
use pipeline_engine::application::scheduler::{ExecuteOptions, Scheduler};
use pipeline_engine::infrastructure::checkpoint_store::InMemoryCheckpointStore;
use pipeline_engine::infrastructure::sample_adapters::{CollectingLoader, SeedExtractor};
use serde_json::json;
use std::collections::BTreeMap;

fn seed_step(key: &str, records: serde_json::Value) -> Step {
    Step::new(
        StepKey::new(key).unwrap(),
        "extract",
        StepType::Extract,
        json!({"adapterCode": "seed", "records": records}),
    )
}

/// A `Scheduler` wired to `SeedExtractor` and a `CollectingLoader` whose
/// handle the caller keeps, so tests can inspect what the loader received.
fn scheduler_with_collector() -> (Scheduler, Arc<CollectingLoader>) {
    let mut extractors = ExtractorRegistry::new();
    extractors.register(Arc::new(SeedExtractor));
    let collector = Arc::new(CollectingLoader::new());
    let mut loaders = LoaderRegistry::new();
    loaders.register(collector.clone());

    let scheduler = Scheduler::new(
        extractors,
        OperatorRegistry::new(),
        loaders,
        pipeline_domain::repositories::operator::OperatorHelpers::new(None),
        CheckpointManager::new(None),
    );
    (scheduler, collector)
}

/// S1: linear extract -> transform -> load, with idempotency dedup and a
/// `script` operator computing `priceMinor = price * 100`.
#[tokio::test]
async fn s1_linear_extract_transform_load() {
    let (scheduler, collector) = scheduler_with_collector();

    let definition = PipelineDefinition {
        steps: vec![
            seed_step(
                "e1",
                json!([{"sku": "A", "price": 10}, {"sku": "A", "price": 10}, {"sku": "B", "price": 2}]),
            ),
            Step::new(
                StepKey::new("t1").unwrap(),
                "transform",
                StepType::Transform,
                json!({"adapterCode": "script", "expression": "price * 100", "targetPath": "priceMinor"}),
            ),
            Step::new(
                StepKey::new("l1").unwrap(),
                "load",
                StepType::Load,
                json!({"adapterCode": "collect"}),
            ),
        ],
        edges: Vec::new(),
        context: PipelineContext {
            idempotency_key_field: Some("sku".to_string()),
            ..Default::default()
        },
    };

    let summary = scheduler.execute(&definition, &ExecuteOptions::default()).await.unwrap();
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 0);

    let collected = collector.collected();
    let minors: Vec<i64> = collected
        .iter()
        .map(|r| as_value(r).get("priceMinor").and_then(serde_json::Value::as_i64).unwrap())
        .collect();
    assert_eq!(minors, vec![1000, 200]);
}

/// S2: VALIDATE drops a failing record and reports it, but keeps validating
/// the rest of the batch even under `errorHandling.mode = FAIL_FAST` — a
/// field rejection is a recoverable RecordError, not a handler failure.
#[tokio::test]
async fn s2_validate_fail_fast() {
    let (scheduler, collector) = scheduler_with_collector();

    let definition = PipelineDefinition {
        steps: vec![
            seed_step("e1", json!([{"email": "a@b"}, {"email": ""}, {"email": "c@d"}])),
            Step::new(
                StepKey::new("v1").unwrap(),
                "validate",
                StepType::Validate,
                json!({"fields": {"email": {"required": true, "type": "string"}}}),
            ),
            Step::new(
                StepKey::new("l1").unwrap(),
                "load",
                StepType::Load,
                json!({"adapterCode": "collect"}),
            ),
        ],
        edges: Vec::new(),
        context: PipelineContext {
            error_handling: ErrorHandlingPolicy { mode: ErrorHandlingMode::FailFast },
            ..Default::default()
        },
    };

    let errors = Arc::new(std::sync::Mutex::new(Vec::new()));
    let errors_cb = RecordErrorCollector(errors.clone());
    let opts = ExecuteOptions {
        on_record_error: Some(&errors_cb),
        ..Default::default()
    };
    scheduler.execute(&definition, &opts).await.unwrap();

    let captured = errors.lock().unwrap();
    assert_eq!(captured.len(), 1);
    assert!(captured[0].contains("email"));
    drop(captured);

    let collected = collector.collected();
    let emails: Vec<String> = collected
        .iter()
        .map(|r| as_value(r).get("email").and_then(serde_json::Value::as_str).unwrap().to_string())
        .collect();
    assert_eq!(emails, vec!["a@b".to_string(), "c@d".to_string()]);
}

/// S3: graph-mode ROUTE partitions records into disjoint branches.
#[tokio::test]
async fn s3_route_partitions_in_graph_mode() {
    let eu_loader = Arc::new(CollectingLoader::new());
    let na_loader = Arc::new(CollectingLoader::new());

    let mut extractors = ExtractorRegistry::new();
    extractors.register(Arc::new(SeedExtractor));
    let mut loaders = LoaderRegistry::new();
    loaders.register(Arc::new(NamedLoader {
        code: "loadEU".to_string(),
        inner: eu_loader.clone(),
    }));
    loaders.register(Arc::new(NamedLoader {
        code: "loadNA".to_string(),
        inner: na_loader.clone(),
    }));

    let scheduler = Scheduler::new(
        extractors,
        OperatorRegistry::new(),
        loaders,
        pipeline_domain::repositories::operator::OperatorHelpers::new(None),
        CheckpointManager::new(None),
    );

    let definition = PipelineDefinition {
        steps: vec![
            seed_step("e1", json!([{"region": "EU"}, {"region": "US"}, {"region": "CA"}])),
            Step::new(
                StepKey::new("route").unwrap(),
                "route",
                StepType::Route,
                json!({"branches": [
                    {"name": "eu", "when": [{"field": "region", "cmp": "eq", "value": "EU"}]},
                    {"name": "na", "when": [{"field": "region", "cmp": "in", "value": ["US", "CA"]}]},
                ]}),
            ),
            Step::new(
                StepKey::new("loadEU").unwrap(),
                "loadEU",
                StepType::Load,
                json!({"adapterCode": "loadEU"}),
            ),
            Step::new(
                StepKey::new("loadNA").unwrap(),
                "loadNA",
                StepType::Load,
                json!({"adapterCode": "loadNA"}),
            ),
        ],
        edges: vec![
            Edge::new(StepKey::new("e1").unwrap(), StepKey::new("route").unwrap()),
            Edge::on_branch(StepKey::new("route").unwrap(), StepKey::new("loadEU").unwrap(), "eu"),
            Edge::on_branch(StepKey::new("route").unwrap(), StepKey::new("loadNA").unwrap(), "na"),
        ],
        context: Default::default(),
    };

    scheduler.execute(&definition, &ExecuteOptions::default()).await.unwrap();
    assert_eq!(eu_loader.collected().len(), 1);
    assert_eq!(na_loader.collected().len(), 2);
}

/// S5: replaying from "xform" skips "ext" entirely and feeds the seed
/// straight into the transform step.
#[tokio::test]
async fn s5_replay_skips_extract() {
    let (scheduler, collector) = scheduler_with_collector();

    let definition = PipelineDefinition {
        steps: vec![
            Step::new(
                StepKey::new("ext").unwrap(),
                "extract",
                StepType::Extract,
                json!({"adapterCode": "seed", "records": [{"x": 999}]}),
            ),
            Step::new(
                StepKey::new("xform").unwrap(),
                "transform",
                StepType::Transform,
                json!({"adapterCode": "set", "path": "seen", "value": true}),
            ),
            Step::new(
                StepKey::new("load").unwrap(),
                "load",
                StepType::Load,
                json!({"adapterCode": "collect"}),
            ),
        ],
        edges: Vec::new(),
        context: Default::default(),
    };

    let seed = vec![record(json!({"x": 1})), record(json!({"x": 2}))];
    let start_key = StepKey::new("xform").unwrap();
    scheduler
        .replay_from_step(&definition, &start_key, seed, &ExecuteOptions::default())
        .await
        .unwrap();

    let collected = collector.collected();
    assert_eq!(collected.len(), 2);
    for r in &collected {
        assert_eq!(as_value(r).get("seen"), Some(&json!(true)));
    }
    // The extract step's seed value (999) never reaches the load step.
    assert!(collected.iter().all(|r| as_value(r).get("x") != Some(&json!(999))));
}

/// S4: a throughput-governed LOAD under SHED drops every chunk after the
/// error-rate threshold trips, without attempting the remaining chunks.
#[tokio::test]
async fn s4_throughput_shed_drops_remaining_chunks() {
    let calls = Arc::new(AtomicUsize::new(0));
    let loader = Arc::new(BadChunkLoader { calls: calls.clone() });

    let step = Step::new(StepKey::new("load").unwrap(), "load", StepType::Load, json!({"adapterCode": "bad"}));
    let config = ThroughputConfig {
        batch_size: Some(100),
        concurrency: Some(1),
        pause_on_error_rate: Some(PauseOnErrorRate { threshold: 0.5, interval_sec: 0 }),
        drain_strategy: Some(DrainStrategy::Shed),
        ..Default::default()
    };

    let mut records = Vec::new();
    for chunk_idx in 0..10u32 {
        for _ in 0..100 {
            let bad = chunk_idx == 2; // chunk 3 (0-indexed 2) is entirely bad
            records.push(record(json!({"bad": bad})));
        }
    }

    let outcome = pipeline_engine::application::throughput_controller::ThroughputController::run(
        &step,
        records,
        &config,
        &ErrorHandlingPolicy::default(),
        loader,
        None,
    )
    .await
    .unwrap();

    assert_eq!(outcome.result.ok, 200);
    assert_eq!(outcome.result.fail, 100);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

/// S6: a compute-heavy whitelisted expression trips the evaluator's
/// wall-clock timeout.
#[test]
fn s6_expression_timeout() {
    let mut context = serde_json::Map::new();
    let items: Vec<serde_json::Value> = (0..50_000).map(|_| json!(1)).collect();
    context.insert("items".to_string(), serde_json::Value::Array(items));
    let expr = "items.map(x => x + 1).reduce((a, b) => a + b, 0)";
    let result = expression::evaluate(expr, &context, 50);
    assert!(!result.success);
    assert!(result.error.as_deref().unwrap_or_default().to_lowercase().contains("timeout"));
    assert!(result.elapsed_ms >= 50);
}

/// Cooperative cancellation: once `onCancelRequested` reports true, at most
/// one additional step begins. The flag flips the moment the first step
/// starts, so the run must still finish that step but never start a second.
#[tokio::test]
async fn cancellation_allows_at_most_one_additional_step_to_begin() {
    let (scheduler, _collector) = scheduler_with_collector();
    let cancel_now = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let started = Arc::new(std::sync::Mutex::new(Vec::<String>::new()));

    let definition = PipelineDefinition {
        steps: vec![
            seed_step("e1", json!([{"x": 1}])),
            Step::new(StepKey::new("t1").unwrap(), "t1", StepType::Transform, json!({"adapterCode": "set", "path": "a", "value": 1})),
            Step::new(StepKey::new("t2").unwrap(), "t2", StepType::Transform, json!({"adapterCode": "set", "path": "b", "value": 2})),
            Step::new(StepKey::new("l1").unwrap(), "load", StepType::Load, json!({"adapterCode": "collect"})),
        ],
        edges: Vec::new(),
        context: Default::default(),
    };

    let step_log = TrackingStepLog {
        started: started.clone(),
        cancel_now: cancel_now.clone(),
        trigger_on: "t1".to_string(),
    };
    let on_cancel = {
        let flag = cancel_now.clone();
        move || flag.load(Ordering::SeqCst)
    };
    let opts = ExecuteOptions {
        on_cancel_requested: Some(&on_cancel),
        step_log: &step_log,
        ..Default::default()
    };

    scheduler.execute(&definition, &opts).await.unwrap();

    let started = started.lock().unwrap();
    assert_eq!(started.as_slice(), ["e1".to_string(), "t1".to_string()]);
}

// === helpers ===

fn record(value: serde_json::Value) -> Record {
    pipeline_domain::record::from_value(value)
}

struct TrackingStepLog {
    started: Arc<std::sync::Mutex<Vec<String>>>,
    cancel_now: Arc<std::sync::atomic::AtomicBool>,
    trigger_on: String,
}

impl pipeline_domain::repositories::callbacks::StepLogCallback for TrackingStepLog {
    fn on_step_start(&self, step_key: &StepKey) {
        self.started.lock().unwrap().push(step_key.to_string());
        if step_key.as_str() == self.trigger_on {
            self.cancel_now.store(true, Ordering::SeqCst);
        }
    }
}

struct RecordErrorCollector(Arc<std::sync::Mutex<Vec<String>>>);

impl pipeline_domain::repositories::callbacks::OnRecordError for RecordErrorCollector {
    fn on_record_error(&self, _step_key: &StepKey, message: &str, _record: &Record) {
        self.0.lock().unwrap().push(message.to_string());
    }
}

struct NamedLoader {
    code: String,
    inner: Arc<CollectingLoader>,
}

#[async_trait]
impl Loader for NamedLoader {
    fn adapter_code(&self) -> &str {
        &self.code
    }

    async fn execute(
        &self,
        step: &Step,
        records: Vec<Record>,
        error_handling: &ErrorHandlingPolicy,
    ) -> Result<ExecutionResult, PipelineError> {
        self.inner.execute(step, records, error_handling).await
    }

    async fn simulate(&self, step: &Step, records: &[Record]) -> Option<serde_json::Value> {
        self.inner.simulate(step, records).await
    }
}

struct BadChunkLoader {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Loader for BadChunkLoader {
    fn adapter_code(&self) -> &str {
        "bad"
    }

    async fn execute(
        &self,
        _step: &Step,
        records: Vec<Record>,
        _error_handling: &ErrorHandlingPolicy,
    ) -> Result<ExecutionResult, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let is_bad = records.first().map(|r| as_value(r).get("bad") == Some(&json!(true))).unwrap_or(false);
        if is_bad {
            Ok(ExecutionResult::new(0, records.len() as u64))
        } else {
            Ok(ExecutionResult::new(records.len() as u64, 0))
        }
    }

    async fn simulate(&self, _step: &Step, _records: &[Record]) -> Option<serde_json::Value> {
        None
    }
}

/// Reads an integer cursor from its own checkpoint sub-map (defaulting to
/// `0` on a fresh checkpoint), emits one record carrying it, then writes the
/// incremented cursor back and marks the context dirty.
struct CursorExtractor;

#[async_trait]
impl Extractor for CursorExtractor {
    fn adapter_code(&self) -> &str {
        "cursor"
    }

    async fn extract(
        &self,
        step: &Step,
        ctx: &mut ExecutorContext,
        _on_record_error: Option<&dyn OnRecordError>,
    ) -> Result<Vec<Record>, PipelineError> {
        let cursor = ctx
            .cp_data
            .as_ref()
            .and_then(|data| data.sub_map(&step.key))
            .and_then(|sub| sub.get("cursor"))
            .and_then(serde_json::Value::as_i64)
            .unwrap_or(0);

        let mut sub = BTreeMap::new();
        sub.insert("cursor".to_string(), json!(cursor + 1));
        ctx.cp_data.get_or_insert_with(pipeline_domain::entities::CheckpointData::empty).set_sub_map(&step.key, sub);
        ctx.mark_dirty();

        Ok(vec![record_with("cursor", json!(cursor))])
    }
}

fn record_with(field: &str, value: serde_json::Value) -> Record {
    let mut r = Record::new();
    r.insert(field.to_string(), value);
    r
}

/// A `Scheduler` wired to `CursorExtractor` and a `CollectingLoader`, backed
/// by a real `InMemoryCheckpointStore` so checkpoint state actually survives
/// across two `execute` calls against the same `pipeline_id`.
fn scheduler_with_checkpoint_store() -> (Scheduler, Arc<CollectingLoader>) {
    let mut extractors = ExtractorRegistry::new();
    extractors.register(Arc::new(CursorExtractor));
    let collector = Arc::new(CollectingLoader::new());
    let mut loaders = LoaderRegistry::new();
    loaders.register(collector.clone());

    let scheduler = Scheduler::new(
        extractors,
        OperatorRegistry::new(),
        loaders,
        pipeline_domain::repositories::operator::OperatorHelpers::new(None),
        CheckpointManager::new(Some(Arc::new(InMemoryCheckpointStore::new()))),
    );
    (scheduler, collector)
}

fn cursor_definition() -> PipelineDefinition {
    PipelineDefinition {
        steps: vec![
            Step::new(StepKey::new("ext").unwrap(), "extract", StepType::Extract, json!({"adapterCode": "cursor"})),
            Step::new(StepKey::new("load").unwrap(), "load", StepType::Load, json!({"adapterCode": "collect"})),
        ],
        edges: Vec::new(),
        context: PipelineContext {
            checkpointing: CheckpointingPolicy { enabled: true },
            ..Default::default()
        },
    }
}

fn cursor_seen(collector: &CollectingLoader) -> Vec<i64> {
    collector
        .collected()
        .iter()
        .map(|r| as_value(r).get("cursor").and_then(serde_json::Value::as_i64).unwrap())
        .collect()
}

/// S7: without `resume`, a second run against the same `pipeline_id` starts
/// from a cleared checkpoint (spec.md §4.5's default resume semantics).
#[tokio::test]
async fn s7_without_resume_checkpoint_is_cleared_between_runs() {
    let (scheduler, collector) = scheduler_with_checkpoint_store();
    let pipeline_id = PipelineId::new();
    let definition = cursor_definition();

    let opts = ExecuteOptions {
        pipeline_id: Some(pipeline_id),
        resume: false,
        ..Default::default()
    };
    scheduler.execute(&definition, &opts).await.unwrap();
    assert_eq!(cursor_seen(&collector), vec![0]);

    // A second run against the same pipeline_id sees cursor 0 again: without
    // `resume`, the checkpoint was cleared before this run's extract ran.
    scheduler.execute(&definition, &opts).await.unwrap();
    assert_eq!(cursor_seen(&collector), vec![0, 0]);
}

/// S7: with `resume: true`, a second run against the same `pipeline_id`
/// continues from the cursor the first run left behind.
#[tokio::test]
async fn s7_with_resume_checkpoint_carries_the_cursor_forward() {
    let (scheduler, collector) = scheduler_with_checkpoint_store();
    let pipeline_id = PipelineId::new();
    let definition = cursor_definition();

    let opts = ExecuteOptions {
        pipeline_id: Some(pipeline_id),
        resume: true,
        ..Default::default()
    };
    scheduler.execute(&definition, &opts).await.unwrap();
    assert_eq!(cursor_seen(&collector), vec![0]);

    // The checkpoint the first run saved is preserved: the second run's
    // extract sees cursor 1, not 0.
    scheduler.execute(&definition, &opts).await.unwrap();
    assert_eq!(cursor_seen(&collector), vec![0, 1]);
}
