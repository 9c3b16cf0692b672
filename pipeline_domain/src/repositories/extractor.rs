// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `Extractor` — the port an EXTRACT step dispatches to (spec.md §4.3, §6).
//! Concrete handlers (the 20+ entity-specific adapters) are out of scope
//! per spec.md §1; this crate supplies only the contract and, in the
//! engine crate, a couple of sample adapters.

use crate::entities::{ExecutorContext, Step};
use crate::error::PipelineError;
use crate::record::Record;
use crate::repositories::callbacks::OnRecordError;
use async_trait::async_trait;

#[async_trait]
pub trait Extractor: Send + Sync {
    /// The adapter code this extractor registers under in the dispatch
    /// table (spec.md §4.3: "thin type-based dispatchers to a registry of
    /// handlers keyed by `adapterCode`").
    fn adapter_code(&self) -> &str;

    async fn extract(
        &self,
        step: &Step,
        executor_ctx: &mut ExecutorContext,
        on_record_error: Option<&dyn OnRecordError>,
    ) -> Result<Vec<Record>, PipelineError>;
}
