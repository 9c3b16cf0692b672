// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `CheckpointManager` — one instance per run, owning the load/save/clear
//! lifecycle against a `CheckpointStore` (spec.md §4.5).

use std::sync::Arc;
use std::time::Instant;

use pipeline_domain::entities::{CheckpointData, ExecutorContext};
use pipeline_domain::repositories::checkpoint_store::CheckpointStore;
use pipeline_domain::value_objects::PipelineId;
use tracing::warn;

use crate::infrastructure::MetricsService;

pub struct CheckpointManager {
    store: Option<Arc<dyn CheckpointStore>>,
    metrics: Option<Arc<MetricsService>>,
}

impl CheckpointManager {
    pub fn new(store: Option<Arc<dyn CheckpointStore>>) -> Self {
        Self { store, metrics: None }
    }

    /// Registers a `MetricsService` to observe checkpoint save latency and
    /// outcome (SPEC_FULL's ambient metrics section).
    pub fn with_metrics(mut self, metrics: Arc<MetricsService>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Fetches existing checkpoint data for `pipeline_id`, leaving
    /// `ctx.cp_data = None` if no `pipeline_id` is given. A store failure is
    /// logged and treated as an empty checkpoint rather than aborting the
    /// run.
    pub async fn load_checkpoint(&self, ctx: &mut ExecutorContext, pipeline_id: Option<&PipelineId>) {
        let Some(pipeline_id) = pipeline_id else {
            ctx.cp_data = None;
            return;
        };
        let Some(store) = &self.store else {
            ctx.cp_data = Some(CheckpointData::empty());
            return;
        };
        match store.get_by_pipeline(pipeline_id).await {
            Ok(data) => ctx.cp_data = Some(data.unwrap_or_else(CheckpointData::empty)),
            Err(err) => {
                warn!(error = %err, "checkpoint load failed, continuing with an empty checkpoint");
                ctx.cp_data = Some(CheckpointData::empty());
            }
        }
    }

    pub async fn clear_checkpoint(&self, pipeline_id: Option<&PipelineId>) {
        let (Some(pipeline_id), Some(store)) = (pipeline_id, &self.store) else {
            return;
        };
        if let Err(err) = store.clear_for_pipeline(pipeline_id).await {
            warn!(error = %err, "checkpoint clear failed");
        }
    }

    /// Persists `ctx.cp_data` if it is dirty and non-null. A store failure
    /// is logged and not fatal to the run.
    pub async fn save_checkpoint(&self, ctx: &ExecutorContext, pipeline_id: Option<&PipelineId>) {
        if !ctx.is_dirty() {
            return;
        }
        let (Some(pipeline_id), Some(store), Some(data)) = (pipeline_id, &self.store, &ctx.cp_data) else {
            return;
        };
        let start = Instant::now();
        let succeeded = match store.set_for_pipeline(pipeline_id, data).await {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "checkpoint save failed");
                false
            }
        };
        if let Some(metrics) = &self.metrics {
            metrics.observe_checkpoint_save(start.elapsed().as_secs_f64(), succeeded);
        }
    }
}
