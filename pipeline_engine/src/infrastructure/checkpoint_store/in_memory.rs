// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! An in-process `CheckpointStore` backed by a `HashMap`. Sample adapter,
//! sufficient to exercise the scheduler end-to-end in tests; not durable
//! across process restarts.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use pipeline_domain::entities::CheckpointData;
use pipeline_domain::error::PipelineError;
use pipeline_domain::repositories::checkpoint_store::CheckpointStore;
use pipeline_domain::value_objects::PipelineId;

#[derive(Default)]
pub struct InMemoryCheckpointStore {
    rows: RwLock<HashMap<PipelineId, CheckpointData>>,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn get_by_pipeline(&self, pipeline_id: &PipelineId) -> Result<Option<CheckpointData>, PipelineError> {
        Ok(self.rows.read().unwrap().get(pipeline_id).cloned())
    }

    async fn set_for_pipeline(&self, pipeline_id: &PipelineId, data: &CheckpointData) -> Result<(), PipelineError> {
        self.rows.write().unwrap().insert(pipeline_id.clone(), data.clone());
        Ok(())
    }

    async fn clear_for_pipeline(&self, pipeline_id: &PipelineId) -> Result<(), PipelineError> {
        self.rows.write().unwrap().remove(pipeline_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_checkpoint_data() {
        let store = InMemoryCheckpointStore::new();
        let pipeline_id = PipelineId::new();
        assert!(store.get_by_pipeline(&pipeline_id).await.unwrap().is_none());

        store.set_for_pipeline(&pipeline_id, &CheckpointData::empty()).await.unwrap();
        assert!(store.get_by_pipeline(&pipeline_id).await.unwrap().is_some());

        store.clear_for_pipeline(&pipeline_id).await.unwrap();
        assert!(store.get_by_pipeline(&pipeline_id).await.unwrap().is_none());
    }
}
