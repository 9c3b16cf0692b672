// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `StepKey` — the unique identifier of a `Step` within one `PipelineDefinition`.

use crate::error::PipelineError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A step's unique key within its pipeline. Opaque; callers pass keys
/// straight through without interpreting their contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StepKey(String);

impl StepKey {
    /// Builds a `StepKey`, rejecting empty strings.
    pub fn new(key: impl Into<String>) -> Result<Self, PipelineError> {
        let key = key.into();
        if key.is_empty() {
            return Err(PipelineError::invalid_config("step key must not be empty"));
        }
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StepKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<StepKey> for String {
    fn from(value: StepKey) -> Self {
        value.0
    }
}

impl AsRef<str> for StepKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
