// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Extract/Load dispatch tables (spec.md §4.3): thin type-based
//! dispatchers to a registry of handlers keyed by `adapterCode`. The
//! concrete entity-specific handler catalog is out of scope (spec.md §1);
//! callers register whatever `Extractor`/`Loader` adapters their
//! deployment needs, typically the infrastructure layer's sample adapters
//! plus any custom ones.
//!
//! An unknown `adapterCode` is not a fatal configuration error: spec.md
//! §4.3 has callers degrade gracefully (log a warning, treat the step as
//! producing nothing for extract or failing everything for load) rather
//! than aborting the run, so `get` returns `Option` instead of `Result`.

use std::collections::HashMap;
use std::sync::Arc;

use pipeline_domain::repositories::extractor::Extractor;
use pipeline_domain::repositories::loader::Loader;

#[derive(Default)]
pub struct ExtractorRegistry {
    handlers: HashMap<String, Arc<dyn Extractor>>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, extractor: Arc<dyn Extractor>) {
        self.handlers.insert(extractor.adapter_code().to_string(), extractor);
    }

    pub fn get(&self, code: &str) -> Option<Arc<dyn Extractor>> {
        self.handlers.get(code).cloned()
    }
}

#[derive(Default)]
pub struct LoaderRegistry {
    handlers: HashMap<String, Arc<dyn Loader>>,
}

impl LoaderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, loader: Arc<dyn Loader>) {
        self.handlers.insert(loader.adapter_code().to_string(), loader);
    }

    pub fn get(&self, code: &str) -> Option<Arc<dyn Loader>> {
        self.handlers.get(code).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pipeline_domain::entities::{ExecutionResult, ExecutorContext, Step};
    use pipeline_domain::error::PipelineError;
    use pipeline_domain::record::Record;
    use pipeline_domain::repositories::callbacks::OnRecordError;
    use pipeline_domain::value_objects::ErrorHandlingPolicy;

    struct NoopExtractor;

    #[async_trait]
    impl Extractor for NoopExtractor {
        fn adapter_code(&self) -> &str {
            "noop"
        }

        async fn extract(
            &self,
            _step: &Step,
            _ctx: &mut ExecutorContext,
            _on_record_error: Option<&dyn OnRecordError>,
        ) -> Result<Vec<Record>, PipelineError> {
            Ok(Vec::new())
        }
    }

    struct NoopLoader;

    #[async_trait]
    impl Loader for NoopLoader {
        fn adapter_code(&self) -> &str {
            "noop"
        }

        async fn execute(
            &self,
            _step: &Step,
            records: Vec<Record>,
            _error_handling: &ErrorHandlingPolicy,
        ) -> Result<ExecutionResult, PipelineError> {
            Ok(ExecutionResult::new(records.len() as u64, 0))
        }
    }

    #[test]
    fn registers_and_resolves_extractors() {
        let mut registry = ExtractorRegistry::new();
        registry.register(Arc::new(NoopExtractor));
        assert!(registry.get("noop").is_some());
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn registers_and_resolves_loaders() {
        let mut registry = LoaderRegistry::new();
        registry.register(Arc::new(NoopLoader));
        assert!(registry.get("noop").is_some());
        assert!(registry.get("missing").is_none());
    }
}
