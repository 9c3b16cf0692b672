// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `SeedExtractor` — an `Extractor` that returns the records given in its
//! own step config verbatim (`{ "adapterCode": "seed", "records": [...] }`).
//! Not one of the 20+ entity-specific handlers spec.md §1 places out of
//! scope; it exists so the scheduler can be exercised end-to-end without a
//! real upstream system.

use async_trait::async_trait;
use pipeline_domain::entities::{ExecutorContext, Step};
use pipeline_domain::error::PipelineError;
use pipeline_domain::record::{from_value, Record};
use pipeline_domain::repositories::callbacks::OnRecordError;
use pipeline_domain::repositories::extractor::Extractor;
use serde_json::Value;

pub struct SeedExtractor;

#[async_trait]
impl Extractor for SeedExtractor {
    fn adapter_code(&self) -> &str {
        "seed"
    }

    async fn extract(
        &self,
        step: &Step,
        _executor_ctx: &mut ExecutorContext,
        _on_record_error: Option<&dyn OnRecordError>,
    ) -> Result<Vec<Record>, PipelineError> {
        let records = step
            .config
            .get("records")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        Ok(records.into_iter().map(from_value).collect())
    }
}
