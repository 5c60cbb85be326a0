// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Memoised invocation counts.
//!
//! Almost every metric divides by the number of invocations of the same
//! function, version and window, so the count is fetched once and reused.
//! Entries are never evicted: the cache lives as long as the client that owns
//! it, and its size is bounded by the distinct windows queried through it.

use crate::query::CacheKey;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

#[derive(Debug, Default)]
pub struct InvocationCache {
    store: RwLock<HashMap<CacheKey, u64>>,
}

impl InvocationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, key: &CacheKey) -> bool {
        self.store
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    pub fn get(&self, key: &CacheKey) -> Option<u64> {
        self.store
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .copied()
    }

    /// Stores `count` for `key`; a later write for the same key wins.
    pub fn set(&self, key: CacheKey, count: u64) {
        self.store
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, count);
    }

    pub fn len(&self) -> usize {
        self.store
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
