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

//! Single-stage accumulation within one worker partition.

use std::sync::Arc;

use datasketches::cpc::CpcSketch;

use crate::cache::EmptySketchCache;
use crate::codec::SerializedSketch;
use crate::codec::SketchCodec;
use crate::config::AggregationConfig;
use crate::datum::Datum;
use crate::datum::RecordUpdater;
use crate::error::Error;

/// Builds one sketch from batches delivered one after another.
///
/// The accumulator starts empty, lazily creates its sketch on the first batch that carries data,
/// and returns to empty on [`reset`](Self::reset). It is owned by a single worker and is never
/// shared between threads while accumulating.
///
/// # Examples
///
/// ```
/// # use cpc_aggregate::accumulator::SketchAccumulator;
/// # use cpc_aggregate::config::AggregationConfig;
/// # use cpc_aggregate::datum::Datum;
/// let mut accumulator = SketchAccumulator::new(AggregationConfig::default());
/// let batch = vec![Datum::from("a"), Datum::from("b")];
/// accumulator.accumulate(Some(batch.as_slice())).unwrap();
/// accumulator.accumulate(Some(&batch[..1])).unwrap();
/// assert!(!accumulator.is_empty());
///
/// let bytes = accumulator.current_value();
/// accumulator.reset();
/// assert!(accumulator.is_empty());
/// # let _ = bytes;
/// ```
#[derive(Debug)]
pub struct SketchAccumulator {
    codec: SketchCodec,
    cache: Arc<EmptySketchCache>,
    sketch: Option<CpcSketch>,
    first_call: bool,
}

impl SketchAccumulator {
    /// Creates an accumulator backed by the process-wide empty-sketch cache.
    pub fn new(config: AggregationConfig) -> Self {
        Self::with_cache(config, EmptySketchCache::global())
    }

    /// Creates an accumulator backed by the given empty-sketch cache.
    pub fn with_cache(config: AggregationConfig, cache: Arc<EmptySketchCache>) -> Self {
        let empty = cache.get(config);
        Self {
            codec: SketchCodec::with_canonical_empty(config, empty.as_bytes()),
            cache,
            sketch: None,
            first_call: true,
        }
    }

    /// Return the config of this accumulator.
    pub fn config(&self) -> AggregationConfig {
        self.codec.config()
    }

    /// Returns true if no batch with data has been accumulated since creation or the last reset.
    pub fn is_empty(&self) -> bool {
        self.sketch.is_none()
    }

    /// Adds a batch of records to the sketch.
    ///
    /// An absent or empty batch is ignored and does not create a sketch.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::UnsupportedInputType`](crate::error::ErrorKind::UnsupportedInputType)
    /// if the batch holds a record that cannot be counted; the accumulated state is unchanged.
    pub fn accumulate(&mut self, batch: Option<&[Datum]>) -> Result<(), Error> {
        if self.first_call {
            tracing::info!("accumulator was used");
            self.first_call = false;
        }
        let Some(batch) = batch.filter(|batch| !batch.is_empty()) else {
            return Ok(());
        };

        match &mut self.sketch {
            Some(sketch) => sketch.update_batch(batch),
            None => {
                let mut sketch = self.codec.config().new_sketch();
                sketch.update_batch(batch)?;
                self.sketch = Some(sketch);
                Ok(())
            }
        }
    }

    /// Returns the serialized sketch built so far.
    ///
    /// Before any countable record arrived this is the cached canonical empty sketch.
    pub fn current_value(&self) -> SerializedSketch {
        match &self.sketch {
            Some(sketch) if !sketch.is_empty() => self.codec.encode(sketch),
            _ => self.cache.get(self.codec.config()),
        }
    }

    /// Discards the accumulated sketch.
    pub fn reset(&mut self) {
        self.sketch = None;
    }
}
