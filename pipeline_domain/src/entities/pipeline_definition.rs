// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `PipelineDefinition` and its `context` (spec.md §3, §6).

use crate::entities::edge::Edge;
use crate::entities::step::Step;
use crate::error::PipelineError;
use crate::value_objects::{CheckpointingPolicy, ErrorHandlingPolicy, StepKey, ThroughputConfig};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineContext {
    #[serde(default, rename = "errorHandling")]
    pub error_handling: ErrorHandlingPolicy,
    #[serde(default)]
    pub checkpointing: CheckpointingPolicy,
    #[serde(default)]
    pub throughput: ThroughputConfig,
    #[serde(default, rename = "idempotencyKeyField", skip_serializing_if = "Option::is_none")]
    pub idempotency_key_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, rename = "contentLanguage", skip_serializing_if = "Option::is_none")]
    pub content_language: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDefinition {
    pub steps: Vec<Step>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub context: PipelineContext,
}

impl PipelineDefinition {
    /// A pipeline with edges is graph mode; an empty edge set is strictly
    /// linear (spec.md §3).
    pub fn is_graph(&self) -> bool {
        !self.edges.is_empty()
    }

    pub fn step(&self, key: &StepKey) -> Option<&Step> {
        self.steps.iter().find(|s| &s.key == key)
    }

    /// Structural validation run once before execution (spec.md §3
    /// invariants): unique step keys, edges reference only existing keys,
    /// and the graph is acyclic.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let mut seen = HashSet::new();
        for step in &self.steps {
            if !seen.insert(step.key.clone()) {
                return Err(PipelineError::DuplicateStepKey(step.key.to_string()));
            }
        }

        for edge in &self.edges {
            if self.step(&edge.from).is_none() {
                return Err(PipelineError::UnknownStepReference(edge.from.to_string()));
            }
            if self.step(&edge.to).is_none() {
                return Err(PipelineError::UnknownStepReference(edge.to.to_string()));
            }
        }

        if self.is_graph() {
            self.check_acyclic()?;
        }

        Ok(())
    }

    fn check_acyclic(&self) -> Result<(), PipelineError> {
        let mut successors: HashMap<&StepKey, Vec<&StepKey>> = HashMap::new();
        for edge in &self.edges {
            successors.entry(&edge.from).or_default().push(&edge.to);
        }

        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }
        let mut marks: HashMap<&StepKey, Mark> = HashMap::new();

        fn visit<'a>(
            key: &'a StepKey,
            successors: &HashMap<&'a StepKey, Vec<&'a StepKey>>,
            marks: &mut HashMap<&'a StepKey, Mark>,
        ) -> Result<(), PipelineError> {
            match marks.get(key) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::Visiting) => return Err(PipelineError::CyclicGraph(key.to_string())),
                None => {}
            }
            marks.insert(key, Mark::Visiting);
            if let Some(next) = successors.get(key) {
                for &succ in next {
                    visit(succ, successors, marks)?;
                }
            }
            marks.insert(key, Mark::Done);
            Ok(())
        }

        for step in &self.steps {
            visit(&step.key, &successors, &mut marks)?;
        }
        Ok(())
    }
}
