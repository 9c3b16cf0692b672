// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Prometheus metrics for the runtime: chunks processed, error ratio, and
//! checkpoint save latency, per SPEC_FULL's ambient metrics section.
//! Grounded in the teacher's `infrastructure::metrics::service` module, with
//! the entity-pipeline-specific counters (bytes, compression ratio) dropped
//! since this runtime has no file-chunk analogue.

use prometheus::core::Collector;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};
use std::sync::Arc;

const NAMESPACE: &str = "pipeline_engine";

/// Registers a metric, panicking only if the metric's own name/help text is
/// malformed — a programmer error caught at process startup, never at
/// runtime, so there is no `PipelineError` variant for it.
fn must_register<T: Collector + Clone + 'static>(registry: &Registry, metric: T) -> T {
    registry.register(Box::new(metric.clone())).expect("metric registration is infallible for well-formed names");
    metric
}

#[derive(Clone)]
pub struct MetricsService {
    registry: Arc<Registry>,
    records_processed_total: IntCounterVec,
    records_failed_total: IntCounterVec,
    chunks_processed_total: IntCounter,
    checkpoint_save_duration: Histogram,
    checkpoint_saves_total: IntCounter,
    checkpoint_save_failures_total: IntCounter,
}

impl MetricsService {
    pub fn new() -> Self {
        let registry = Registry::new();

        let records_processed_total = must_register(
            &registry,
            IntCounterVec::new(
                Opts::new("records_processed_total", "Records processed per step").namespace(NAMESPACE),
                &["step_key"],
            )
            .expect("well-formed metric"),
        );
        let records_failed_total = must_register(
            &registry,
            IntCounterVec::new(
                Opts::new("records_failed_total", "Records that failed per step").namespace(NAMESPACE),
                &["step_key"],
            )
            .expect("well-formed metric"),
        );
        let chunks_processed_total = must_register(
            &registry,
            IntCounter::with_opts(Opts::new("chunks_processed_total", "Batches processed by the throughput controller").namespace(NAMESPACE))
                .expect("well-formed metric"),
        );
        let checkpoint_save_duration = must_register(
            &registry,
            Histogram::with_opts(
                HistogramOpts::new("checkpoint_save_duration_seconds", "Checkpoint save latency")
                    .namespace(NAMESPACE)
                    .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
            )
            .expect("well-formed metric"),
        );
        let checkpoint_saves_total = must_register(
            &registry,
            IntCounter::with_opts(Opts::new("checkpoint_saves_total", "Successful checkpoint saves").namespace(NAMESPACE))
                .expect("well-formed metric"),
        );
        let checkpoint_save_failures_total = must_register(
            &registry,
            IntCounter::with_opts(Opts::new("checkpoint_save_failures_total", "Failed checkpoint saves").namespace(NAMESPACE))
                .expect("well-formed metric"),
        );

        Self {
            registry: Arc::new(registry),
            records_processed_total,
            records_failed_total,
            chunks_processed_total,
            checkpoint_save_duration,
            checkpoint_saves_total,
            checkpoint_save_failures_total,
        }
    }

    pub fn record_processed(&self, step_key: &str, count: u64) {
        self.records_processed_total.with_label_values(&[step_key]).inc_by(count);
    }

    pub fn record_failed(&self, step_key: &str, count: u64) {
        self.records_failed_total.with_label_values(&[step_key]).inc_by(count);
    }

    /// Ratio of failed to processed records across `step_key`, `0.0` when
    /// nothing has been recorded yet.
    pub fn error_ratio(&self, step_key: &str) -> f64 {
        let processed = self.records_processed_total.with_label_values(&[step_key]).get();
        let failed = self.records_failed_total.with_label_values(&[step_key]).get();
        let total = processed + failed;
        if total == 0 {
            0.0
        } else {
            failed as f64 / total as f64
        }
    }

    pub fn increment_chunks_processed(&self) {
        self.chunks_processed_total.inc();
    }

    pub fn observe_checkpoint_save(&self, seconds: f64, succeeded: bool) {
        self.checkpoint_save_duration.observe(seconds);
        if succeeded {
            self.checkpoint_saves_total.inc();
        } else {
            self.checkpoint_save_failures_total.inc();
        }
    }

    /// Renders the registry in Prometheus text-exposition format for
    /// scraping.
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let encoder = prometheus::TextEncoder::new();
        let families = self.registry.gather();
        encoder.encode_to_string(&families)
    }
}

impl Default for MetricsService {
    fn default() -> Self {
        Self::new()
    }
}
