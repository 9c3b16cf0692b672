// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Infrastructure layer: configuration, logging, metrics, and the adapters
//! (`CheckpointStore`, `SecretResolver`, sample `Extractor`/`Loader`
//! handlers) that satisfy the ports `pipeline_domain` defines.

pub mod checkpoint_store;
pub mod config;
pub mod logging;
pub mod metrics;
pub mod sample_adapters;
pub mod secret_resolver;

pub use config::EngineConfig;
pub use metrics::MetricsService;
