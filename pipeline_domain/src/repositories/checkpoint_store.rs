// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `CheckpointStore` — the persistence port consumed by the checkpoint
//! manager (spec.md §6). Out of scope per spec.md §1: concrete adapters
//! (in-memory, SQLite) live in the infrastructure layer.

use crate::entities::CheckpointData;
use crate::error::PipelineError;
use crate::value_objects::PipelineId;
use async_trait::async_trait;

#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// `None` when no checkpoint row exists for `pipeline_id`.
    async fn get_by_pipeline(&self, pipeline_id: &PipelineId) -> Result<Option<CheckpointData>, PipelineError>;

    /// Replaces the whole persisted document for `pipeline_id`.
    async fn set_for_pipeline(&self, pipeline_id: &PipelineId, data: &CheckpointData) -> Result<(), PipelineError>;

    async fn clear_for_pipeline(&self, pipeline_id: &PipelineId) -> Result<(), PipelineError>;
}
