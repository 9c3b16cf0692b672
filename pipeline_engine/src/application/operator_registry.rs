// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Two-tier operator registry (spec.md §4.2): the built-in table is
//! consulted first, then a pluggable custom registry that callers populate
//! at startup. Unknown codes surface as `OperatorNotFound`.

use std::collections::HashMap;
use std::sync::Arc;

use pipeline_domain::error::PipelineError;
use pipeline_domain::repositories::operator::Operator;

use crate::application::operators;

pub struct OperatorRegistry {
    built_ins: HashMap<&'static str, Arc<dyn Operator>>,
    custom: HashMap<String, Arc<dyn Operator>>,
}

impl OperatorRegistry {
    pub fn new() -> Self {
        Self {
            built_ins: operators::built_in_table().into_iter().collect(),
            custom: HashMap::new(),
        }
    }

    /// Registers (or replaces) a custom operator under `code`. Custom
    /// registrations shadow a built-in of the same code.
    pub fn register(&mut self, code: impl Into<String>, operator: Arc<dyn Operator>) {
        self.custom.insert(code.into(), operator);
    }

    pub fn get(&self, code: &str, step_key: &str) -> Result<Arc<dyn Operator>, PipelineError> {
        if let Some(op) = self.custom.get(code) {
            return Ok(Arc::clone(op));
        }
        if let Some(op) = self.built_ins.get(code) {
            return Ok(Arc::clone(op));
        }
        Err(PipelineError::OperatorNotFound {
            step_key: step_key.to_string(),
            code: code.to_string(),
        })
    }
}

impl Default for OperatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pipeline_domain::record::Record;
    use pipeline_domain::repositories::operator::OperatorHelpers;
    use serde_json::Value;

    struct Noop;

    #[async_trait]
    impl Operator for Noop {
        async fn apply_one(
            &self,
            record: Record,
            _args: &Value,
            _helpers: &OperatorHelpers,
        ) -> Result<Option<Record>, PipelineError> {
            Ok(Some(record))
        }
    }

    #[test]
    fn resolves_built_ins() {
        let registry = OperatorRegistry::new();
        assert!(registry.get("map", "s1").is_ok());
    }

    #[test]
    fn unknown_code_is_an_error() {
        let registry = OperatorRegistry::new();
        assert!(matches!(
            registry.get("nonexistent", "s1"),
            Err(PipelineError::OperatorNotFound { .. })
        ));
    }

    #[test]
    fn custom_registration_shadows_built_in() {
        let mut registry = OperatorRegistry::new();
        registry.register("map", Arc::new(Noop));
        assert!(registry.get("map", "s1").is_ok());
    }
}
