// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `chunk(arr, n)` from spec.md §4.8: splits a slice into contiguous pieces
//! of at most `n` elements, preserving order. The throughput controller uses
//! this to carve a batch into `batchSize` sub-batches before dispatch.

/// Splits `items` into owned chunks of at most `size` elements. `size == 0`
/// yields the whole input as a single chunk (mirrors "no limit").
pub fn chunk<T: Clone>(items: &[T], size: usize) -> Vec<Vec<T>> {
    if size == 0 || items.is_empty() {
        return if items.is_empty() {
            Vec::new()
        } else {
            vec![items.to_vec()]
        };
    }
    items.chunks(size).map(|c| c.to_vec()).collect()
}
