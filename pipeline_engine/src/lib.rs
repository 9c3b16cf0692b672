// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Engine
//!
//! The application and infrastructure layers that drive a `PipelineDefinition`
//! to completion: the scheduler (linear and graph execution, replay, dry-run),
//! the transform/operator subsystem (registry, chaining, validation, routing,
//! the safe expression evaluator), the throughput controller, and the
//! checkpoint manager — plus the infrastructure adapters (`CheckpointStore`,
//! `SecretResolver`, sample `Extractor`/`Loader` handlers) that satisfy the
//! ports `pipeline_domain` defines.
//!
//! Pure business rules (validation, routing, record utilities) live in
//! `pipeline_domain`; this crate owns everything that needs `tokio`, I/O, or
//! wall-clock time.

pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use application::scheduler::Scheduler;
