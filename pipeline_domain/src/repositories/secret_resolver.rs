// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `SecretResolver` — the port behind the `secrets.get(code)` operator
//! helper (spec.md §4.2, §6). Concrete backends (env vars, vaults) are out
//! of scope per spec.md §1.

use crate::error::PipelineError;
use async_trait::async_trait;

#[async_trait]
pub trait SecretResolver: Send + Sync {
    /// `None` when `code` has no registered secret.
    async fn resolve(&self, code: &str) -> Result<Option<String>, PipelineError>;
}
