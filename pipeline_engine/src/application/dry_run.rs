// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `DryRunSimulator` (spec.md §4.6): runs a pipeline non-destructively,
//! sampling up to `N` before/after pairs per step and recording loader
//! previews instead of performing real writes.

use std::sync::Arc;

use pipeline_domain::entities::{CheckpointData, ExecutorContext, PipelineDefinition, Step, StepType};
use pipeline_domain::error::PipelineError;
use pipeline_domain::record::{as_value, Record};
use pipeline_domain::repositories::extractor::Extractor;
use pipeline_domain::repositories::loader::Loader;
use pipeline_domain::value_objects::{CheckpointingPolicy, ErrorHandlingPolicy};
use serde_json::{json, Value};
use tracing::warn;

use crate::application::dispatch::{ExtractorRegistry, LoaderRegistry};
use crate::application::operator_registry::OperatorRegistry;
use crate::application::transform_executor::TransformExecutor;
use pipeline_domain::repositories::operator::OperatorHelpers;

const DEFAULT_SAMPLE_LIMIT: usize = 5;

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct DryRunSample {
    pub step: String,
    pub before: Value,
    pub after: Value,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct DryRunMetrics {
    pub processed: u64,
    pub succeeded: u64,
    pub failed: u64,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct DryRunReport {
    pub metrics: DryRunMetrics,
    pub sample_records: Vec<DryRunSample>,
    pub errors: Vec<String>,
    pub details: Vec<Value>,
}

pub struct DryRunSimulator<'a> {
    pub extractors: &'a ExtractorRegistry,
    pub operators: &'a OperatorRegistry,
    pub loaders: &'a LoaderRegistry,
    pub helpers: &'a OperatorHelpers,
    pub sample_limit: usize,
}

impl<'a> DryRunSimulator<'a> {
    pub fn new(extractors: &'a ExtractorRegistry, operators: &'a OperatorRegistry, loaders: &'a LoaderRegistry, helpers: &'a OperatorHelpers) -> Self {
        Self {
            extractors,
            operators,
            loaders,
            helpers,
            sample_limit: DEFAULT_SAMPLE_LIMIT,
        }
    }

    pub async fn run(&self, definition: &PipelineDefinition) -> DryRunReport {
        let mut report = DryRunReport::default();
        let mut ctx = ExecutorContext::new(ErrorHandlingPolicy::default(), CheckpointingPolicy::default());
        ctx.cp_data = Some(CheckpointData::empty());

        let mut records: Vec<Record> = Vec::new();
        for step in &definition.steps {
            records = match self.run_step(step, records, &mut ctx, &mut report).await {
                Ok(next) => next,
                Err(err) => {
                    report.errors.push(format!("[{}] {err}", step.key));
                    continue;
                }
            };
        }
        report.metrics.failed = report.errors.len() as u64;
        report.metrics.succeeded = report.metrics.processed;
        report
    }

    async fn run_step(
        &self,
        step: &Step,
        records: Vec<Record>,
        ctx: &mut ExecutorContext,
        report: &mut DryRunReport,
    ) -> Result<Vec<Record>, PipelineError> {
        match step.step_type {
            StepType::Trigger => Ok(records),
            StepType::Extract => {
                let code = step
                    .config
                    .get("adapterCode")
                    .and_then(Value::as_str)
                    .ok_or_else(|| PipelineError::invalid_config("EXTRACT step requires 'adapterCode'"))?;
                let out = match self.extractors.get(code) {
                    Some(extractor) => extractor.extract(step, ctx, None).await?,
                    None => {
                        warn!(step = %step.key, %code, "unknown extractor adapter code, returning no records");
                        Vec::new()
                    }
                };
                report.metrics.processed += out.len() as u64;
                self.sample(report, step, &Record::new(), out.iter().take(self.sample_limit));
                Ok(out)
            }
            StepType::Transform | StepType::Validate => {
                let before_sample: Vec<Record> = records.iter().take(self.sample_limit).cloned().collect();
                let out = if step.step_type == StepType::Validate {
                    TransformExecutor::execute_validate(&step.key, &step.config, records, &ctx.error_handling, None)?
                } else {
                    TransformExecutor::execute_operator(&step.key, &step.config, records, self.operators, self.helpers, None).await?
                };
                for (before, after) in before_sample.iter().zip(out.iter()) {
                    report.sample_records.push(DryRunSample {
                        step: step.key.to_string(),
                        before: as_value(before),
                        after: as_value(after),
                    });
                }
                Ok(out)
            }
            StepType::Enrich | StepType::Route | StepType::Export | StepType::Feed | StepType::Sink => Ok(records),
            StepType::Load => {
                let code = step
                    .config
                    .get("adapterCode")
                    .and_then(Value::as_str)
                    .ok_or_else(|| PipelineError::invalid_config("LOAD step requires 'adapterCode'"))?;
                match self.loaders.get(code) {
                    Some(loader) => {
                        if let Some(preview) = loader.simulate(step, &records).await {
                            report.details.push(json!({"step": step.key.to_string(), "preview": preview}));
                        }
                    }
                    None => warn!(step = %step.key, %code, "unknown loader adapter code, no preview available"),
                }
                Ok(records)
            }
            StepType::Gate => Ok(records),
        }
    }

    fn sample<'r>(&self, report: &mut DryRunReport, step: &Step, before: &Record, after: impl Iterator<Item = &'r Record>) {
        for record in after {
            if report.sample_records.iter().filter(|s| s.step == step.key.to_string()).count() >= self.sample_limit {
                break;
            }
            report.sample_records.push(DryRunSample {
                step: step.key.to_string(),
                before: as_value(before),
                after: as_value(record),
            });
        }
    }
}
