// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! A SQLite-backed `CheckpointStore`, grounded in the teacher's generic
//! `SqliteRepository` (connection setup, `INSERT OR REPLACE` upsert, JSON
//! column for the serialized payload), narrowed to the single
//! `(pipeline_id, data)` shape a checkpoint row needs.

use async_trait::async_trait;
use pipeline_domain::entities::CheckpointData;
use pipeline_domain::error::PipelineError;
use pipeline_domain::repositories::checkpoint_store::CheckpointStore;
use pipeline_domain::value_objects::PipelineId;
use sqlx::{Row, SqlitePool};

const TABLE: &str = "checkpoints";

pub struct SqliteCheckpointStore {
    pool: SqlitePool,
}

impl SqliteCheckpointStore {
    pub async fn new(pool: SqlitePool) -> Result<Self, PipelineError> {
        let store = Self { pool };
        store.ensure_table_exists().await?;
        Ok(store)
    }

    pub async fn from_file(database_path: &str) -> Result<Self, PipelineError> {
        let pool = SqlitePool::connect(database_path)
            .await
            .map_err(|e| PipelineError::InternalError(format!("failed to connect to database: {e}")))?;
        Self::new(pool).await
    }

    pub async fn in_memory() -> Result<Self, PipelineError> {
        let pool = SqlitePool::connect(":memory:")
            .await
            .map_err(|e| PipelineError::InternalError(format!("failed to create in-memory database: {e}")))?;
        Self::new(pool).await
    }

    async fn ensure_table_exists(&self) -> Result<(), PipelineError> {
        let schema = format!(
            "CREATE TABLE IF NOT EXISTS {TABLE} (
                pipeline_id TEXT PRIMARY KEY,
                data TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )"
        );
        sqlx::query(&schema)
            .execute(&self.pool)
            .await
            .map_err(|e| PipelineError::CheckpointError(format!("failed to create table: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl CheckpointStore for SqliteCheckpointStore {
    async fn get_by_pipeline(&self, pipeline_id: &PipelineId) -> Result<Option<CheckpointData>, PipelineError> {
        let query = format!("SELECT data FROM {TABLE} WHERE pipeline_id = ?");
        let row = sqlx::query(&query)
            .bind(pipeline_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| PipelineError::CheckpointError(format!("failed to query checkpoint: {e}")))?;

        match row {
            Some(row) => {
                let data: String = row.get("data");
                let parsed: CheckpointData = serde_json::from_str(&data)
                    .map_err(|e| PipelineError::SerializationError(format!("failed to deserialize checkpoint: {e}")))?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }

    async fn set_for_pipeline(&self, pipeline_id: &PipelineId, data: &CheckpointData) -> Result<(), PipelineError> {
        let serialized = serde_json::to_string(data)
            .map_err(|e| PipelineError::SerializationError(format!("failed to serialize checkpoint: {e}")))?;
        let now = chrono::Utc::now().to_rfc3339();

        let query = format!("INSERT OR REPLACE INTO {TABLE} (pipeline_id, data, updated_at) VALUES (?, ?, ?)");
        sqlx::query(&query)
            .bind(pipeline_id.to_string())
            .bind(serialized)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| PipelineError::CheckpointError(format!("failed to save checkpoint: {e}")))?;
        Ok(())
    }

    async fn clear_for_pipeline(&self, pipeline_id: &PipelineId) -> Result<(), PipelineError> {
        let query = format!("DELETE FROM {TABLE} WHERE pipeline_id = ?");
        sqlx::query(&query)
            .bind(pipeline_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| PipelineError::CheckpointError(format!("failed to clear checkpoint: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_checkpoint_data_through_sqlite() {
        let store = SqliteCheckpointStore::in_memory().await.unwrap();
        let pipeline_id = PipelineId::new();
        assert!(store.get_by_pipeline(&pipeline_id).await.unwrap().is_none());

        let mut data = CheckpointData::empty();
        data.set_sub_map(&pipeline_domain::value_objects::StepKey::new("extract").unwrap(), Default::default());
        store.set_for_pipeline(&pipeline_id, &data).await.unwrap();

        let loaded = store.get_by_pipeline(&pipeline_id).await.unwrap();
        assert!(loaded.is_some());

        store.clear_for_pipeline(&pipeline_id).await.unwrap();
        assert!(store.get_by_pipeline(&pipeline_id).await.unwrap().is_none());
    }
}
