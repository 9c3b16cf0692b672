// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! LRU cache of compiled expressions (spec.md §4.7). Keyed by the
//! expression source plus the sorted set of context keys available at
//! compile time, since a path that resolves against one context's shape
//! may be meaningless against another's.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use serde_json::{Map, Value};

use super::ast::Expr;
use super::parser::Parser;

const DEFAULT_MAX_ENTRIES: usize = 500;
const EVICT_PERCENT: f64 = 0.1;

fn cache_key(expression: &str, context: &Map<String, Value>) -> String {
    let mut keys: Vec<&str> = context.keys().map(String::as_str).collect();
    keys.sort_unstable();
    format!("{expression}\u{0}{}", keys.join(","))
}

pub struct ScriptCache {
    inner: Mutex<LruCache<String, Arc<Expr>>>,
    max_entries: usize,
}

impl ScriptCache {
    pub fn new(max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries.max(1)).unwrap();
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
            max_entries: max_entries.max(1),
        }
    }

    /// Compiles `expression` or returns the cached AST, evicting
    /// `ceil(max_entries * EVICT_PERCENT)` entries whenever the cache is at
    /// capacity and the key being inserted is new.
    pub fn get_or_compile(&self, expression: &str, context: &Map<String, Value>) -> Result<Arc<Expr>, String> {
        let key = cache_key(expression, context);
        let mut cache = self.inner.lock();
        if let Some(expr) = cache.get(&key) {
            return Ok(Arc::clone(expr));
        }
        let expr = Arc::new(Parser::parse(expression)?);
        if cache.len() >= self.max_entries {
            let evict_count = ((self.max_entries as f64) * EVICT_PERCENT).ceil() as usize;
            for _ in 0..evict_count.max(1) {
                if cache.pop_lru().is_none() {
                    break;
                }
            }
        }
        cache.put(key, Arc::clone(&expr));
        Ok(expr)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}

impl Default for ScriptCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}
