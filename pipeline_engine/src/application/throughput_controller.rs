// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `ThroughputController` — wraps LOAD-family batches with bounded
//! concurrency, rate limiting, and adaptive drain behaviour (spec.md §4.4).

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use pipeline_domain::entities::{ExecutionResult, Step};
use pipeline_domain::error::PipelineError;
use pipeline_domain::record::Record;
use pipeline_domain::repositories::loader::Loader;
use pipeline_domain::util::chunk::chunk;
use pipeline_domain::value_objects::{DrainStrategy, ErrorHandlingPolicy, ThroughputConfig};

use crate::infrastructure::MetricsService;

/// Floor applied to `BACKOFF`'s sleep; spec.md §4.4 names `minPauseMs` but
/// leaves its value to the implementation.
const MIN_PAUSE_MS: u64 = 100;

const DEFAULT_BATCH_SIZE: usize = 100;
const DEFAULT_CONCURRENCY: usize = 1;
const DEFERRED_QUEUE_CAP: usize = 1000;

#[derive(Debug, Default)]
pub struct ThroughputOutcome {
    pub result: ExecutionResult,
    /// Chunks discarded under SHED (including QUEUE overflow); they count
    /// toward neither `ok` nor `fail`.
    pub dropped_records: usize,
}

pub struct ThroughputController;

impl ThroughputController {
    pub async fn run(
        step: &Step,
        records: Vec<Record>,
        config: &ThroughputConfig,
        error_handling: &ErrorHandlingPolicy,
        loader: Arc<dyn Loader>,
        metrics: Option<&MetricsService>,
    ) -> Result<ThroughputOutcome, PipelineError> {
        let batch_size = config.batch_size_or(DEFAULT_BATCH_SIZE).max(1);
        let concurrency = config.concurrency_or(DEFAULT_CONCURRENCY).max(1);
        let mut chunks: VecDeque<Vec<Record>> = chunk(&records, batch_size).into_iter().collect();
        let mut deferred: VecDeque<Vec<Record>> = VecDeque::new();

        let mut outcome = ThroughputOutcome::default();
        let mut shed = false;
        let mut queued = false;

        let mut in_flight = FuturesUnordered::new();
        loop {
            while in_flight.len() < concurrency && !chunks.is_empty() {
                let chunk = chunks.pop_front().unwrap();
                let loader = Arc::clone(&loader);
                let step = step.clone();
                let error_handling = *error_handling;
                in_flight.push(async move {
                    let len = chunk.len();
                    let result = loader.execute(&step, chunk, &error_handling).await;
                    (result, len)
                });
            }
            if in_flight.is_empty() {
                break;
            }
            let (result, len) = in_flight.next().await.expect("in_flight non-empty");
            let result = result?;
            outcome.result = outcome.result.combine(result);
            if let Some(metrics) = metrics {
                metrics.increment_chunks_processed();
                metrics.record_processed(step.key.as_str(), result.ok);
                metrics.record_failed(step.key.as_str(), result.fail);
            }

            if let Some(pause) = config.pause_on_error_rate {
                let error_ratio = if len == 0 { 0.0 } else { result.fail as f64 / len as f64 };
                if error_ratio >= pause.threshold {
                    match config.drain_strategy.unwrap_or(DrainStrategy::Backoff) {
                        DrainStrategy::Backoff => {
                            let pause_ms = (pause.interval_sec * 1000).max(MIN_PAUSE_MS);
                            tokio::time::sleep(Duration::from_millis(pause_ms)).await;
                        }
                        DrainStrategy::Shed => {
                            outcome.dropped_records += chunks.iter().map(Vec::len).sum::<usize>();
                            chunks.clear();
                            shed = true;
                        }
                        DrainStrategy::Queue => {
                            queued = true;
                            while let Some(chunk) = chunks.pop_front() {
                                if deferred.len() >= DEFERRED_QUEUE_CAP {
                                    outcome.dropped_records += chunk.len();
                                } else {
                                    deferred.push_back(chunk);
                                }
                            }
                        }
                    }
                }
            }

            if let Some(rps) = config.rate_limit_rps {
                if rps > 0.0 {
                    tokio::time::sleep(Duration::from_millis((1000.0 / rps) as u64)).await;
                }
            }
            if shed {
                break;
            }
        }

        if queued && !deferred.is_empty() {
            if let Some(pause) = config.pause_on_error_rate {
                tokio::time::sleep(Duration::from_secs(pause.interval_sec)).await;
            }
            while let Some(chunk) = deferred.pop_front() {
                let result = loader.execute(step, chunk, error_handling).await?;
                outcome.result = outcome.result.combine(result);
                if let Some(metrics) = metrics {
                    metrics.increment_chunks_processed();
                    metrics.record_processed(step.key.as_str(), result.ok);
                    metrics.record_failed(step.key.as_str(), result.fail);
                }
                if let Some(rps) = config.rate_limit_rps {
                    if rps > 0.0 {
                        tokio::time::sleep(Duration::from_millis((1000.0 / rps) as u64)).await;
                    }
                }
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pipeline_domain::entities::StepType;
    use pipeline_domain::value_objects::StepKey;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingLoader {
        calls: AtomicUsize,
        fail_every: usize,
    }

    #[async_trait]
    impl Loader for CountingLoader {
        fn adapter_code(&self) -> &str {
            "counting"
        }

        async fn execute(
            &self,
            _step: &Step,
            records: Vec<Record>,
            _error_handling: &ErrorHandlingPolicy,
        ) -> Result<ExecutionResult, PipelineError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_every != 0 && call % self.fail_every == 0 {
                Ok(ExecutionResult::new(0, records.len() as u64))
            } else {
                Ok(ExecutionResult::new(records.len() as u64, 0))
            }
        }
    }

    fn step() -> Step {
        Step::new(StepKey::new("load1").unwrap(), "load", StepType::Load, Value::Null)
    }

    #[tokio::test]
    async fn batches_and_aggregates_ok_counts() {
        let records: Vec<Record> = (0..10).map(|_| Record::new()).collect();
        let loader = Arc::new(CountingLoader {
            calls: AtomicUsize::new(0),
            fail_every: 0,
        });
        let config = ThroughputConfig {
            batch_size: Some(3),
            concurrency: Some(2),
            ..Default::default()
        };
        let outcome = ThroughputController::run(&step(), records, &config, &ErrorHandlingPolicy::default(), loader, None)
            .await
            .unwrap();
        assert_eq!(outcome.result.ok, 10);
        assert_eq!(outcome.result.fail, 0);
    }

    #[tokio::test]
    async fn shed_drops_remaining_chunks_on_high_error_rate() {
        let records: Vec<Record> = (0..10).map(|_| Record::new()).collect();
        let loader = Arc::new(CountingLoader {
            calls: AtomicUsize::new(0),
            fail_every: 1,
        });
        let config = ThroughputConfig {
            batch_size: Some(2),
            concurrency: Some(1),
            pause_on_error_rate: Some(pipeline_domain::value_objects::PauseOnErrorRate {
                threshold: 0.5,
                interval_sec: 0,
            }),
            drain_strategy: Some(DrainStrategy::Shed),
            ..Default::default()
        };
        let outcome = ThroughputController::run(&step(), records, &config, &ErrorHandlingPolicy::default(), loader, None)
            .await
            .unwrap();
        assert!(outcome.dropped_records > 0);
        assert_eq!(outcome.result.ok + outcome.result.fail + outcome.dropped_records as u64, 10);
    }
}
