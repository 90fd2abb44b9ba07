// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Memoized serializations of empty sketches.
//!
//! Empty results are requested far more often than they change: every absent batch, every empty
//! merge and every query of an untouched accumulator answers with the same bytes. The cache builds
//! them once per `(lg_k, seed)`.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::OnceLock;

use parking_lot::RwLock;

use crate::codec::SerializedSketch;
use crate::config::AggregationConfig;

/// A cache of canonical empty-sketch serializations keyed by `(lg_k, seed)`.
///
/// Entries are created on first request and never invalidated. Threads racing on the same missing
/// key may each serialize an empty sketch; the first one stored wins and all callers observe it
/// afterwards. No sketch work happens while the lock is held.
///
/// # Examples
///
/// ```
/// # use cpc_aggregate::cache::EmptySketchCache;
/// # use cpc_aggregate::config::AggregationConfig;
/// let cache = EmptySketchCache::new();
/// let config = AggregationConfig::default();
/// let first = cache.get(config);
/// let second = cache.get(config);
/// assert_eq!(first, second);
/// assert_eq!(cache.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct EmptySketchCache {
    entries: RwLock<HashMap<(u8, u64), SerializedSketch>>,
}

impl EmptySketchCache {
    /// Creates an empty cache, isolated from every other instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cache shared by the whole process.
    pub fn global() -> Arc<EmptySketchCache> {
        static GLOBAL: OnceLock<Arc<EmptySketchCache>> = OnceLock::new();
        GLOBAL.get_or_init(Default::default).clone()
    }

    /// Returns the canonical serialization of an empty sketch built with `config`.
    pub fn get(&self, config: AggregationConfig) -> SerializedSketch {
        let key = (config.lg_k(), config.seed());
        if let Some(bytes) = self.entries.read().get(&key) {
            return bytes.clone();
        }

        let bytes = SerializedSketch::from(config.new_sketch().serialize());
        tracing::debug!(lg_k = key.0, seed = key.1, "cached empty sketch");
        self.entries.write().entry(key).or_insert(bytes).clone()
    }

    /// Returns the number of cached configurations.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
