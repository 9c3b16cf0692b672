// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `ThroughputConfig` — batching/concurrency/rate-limit/drain settings for a
//! LOAD-family step (spec.md §4.4). May be set at the step or the
//! definition; the step's value wins when both are present (see
//! [`ThroughputConfig::merged_with_default`]).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThroughputConfig {
    #[serde(default, rename = "rateLimitRps")]
    pub rate_limit_rps: Option<f64>,
    #[serde(default, rename = "batchSize")]
    pub batch_size: Option<usize>,
    #[serde(default)]
    pub concurrency: Option<usize>,
    #[serde(default, rename = "pauseOnErrorRate")]
    pub pause_on_error_rate: Option<PauseOnErrorRate>,
    #[serde(default, rename = "drainStrategy")]
    pub drain_strategy: Option<DrainStrategy>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PauseOnErrorRate {
    pub threshold: f64,
    #[serde(rename = "intervalSec")]
    pub interval_sec: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DrainStrategy {
    Backoff,
    Shed,
    Queue,
}

impl ThroughputConfig {
    /// Step-level values win; any field left unset falls back to the
    /// definition-level default.
    pub fn merged_with_default(&self, default: &ThroughputConfig) -> ThroughputConfig {
        ThroughputConfig {
            rate_limit_rps: self.rate_limit_rps.or(default.rate_limit_rps),
            batch_size: self.batch_size.or(default.batch_size),
            concurrency: self.concurrency.or(default.concurrency),
            pause_on_error_rate: self.pause_on_error_rate.or(default.pause_on_error_rate),
            drain_strategy: self.drain_strategy.or(default.drain_strategy),
        }
    }

    pub fn batch_size_or(&self, default: usize) -> usize {
        self.batch_size.unwrap_or(default)
    }

    pub fn concurrency_or(&self, default: usize) -> usize {
        self.concurrency.unwrap_or(default)
    }
}
