// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Sample `Extractor`/`Loader` adapters, sufficient to exercise the
//! scheduler end-to-end in tests and examples. Not the entity-specific
//! handler catalog spec.md §1 places out of scope.

pub mod collecting_loader;
pub mod seed_extractor;

pub use collecting_loader::CollectingLoader;
pub use seed_extractor::SeedExtractor;
