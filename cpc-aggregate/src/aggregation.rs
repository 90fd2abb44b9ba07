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

//! Entry point tying one configuration to every execution path.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use crate::accumulator::SketchAccumulator;
use crate::algebraic::FinalStage;
use crate::algebraic::InitialStage;
use crate::algebraic::IntermediateStage;
use crate::cache::EmptySketchCache;
use crate::codec::SerializedSketch;
use crate::codec::SketchCodec;
use crate::config::AggregationConfig;
use crate::datum::Datum;
use crate::datum::RecordUpdater;
use crate::error::Error;

/// A distinct-count aggregation producing serialized CPC sketches.
///
/// The host engine picks one of three execution paths:
///
/// - [`exec`](Self::exec) builds a sketch from a single batch;
/// - [`accumulator`](Self::accumulator) builds one sketch from a sequence of batches;
/// - [`initial`](Self::initial), [`intermediate`](Self::intermediate) and
///   [`final_stage`](Self::final_stage) combine partial results across a merge tree.
///
/// All of them share this aggregation's config and empty-sketch cache.
///
/// # Examples
///
/// ```
/// # use cpc_aggregate::CpcAggregation;
/// # use cpc_aggregate::Datum;
/// let aggregation = CpcAggregation::from_args(&["12"]).unwrap();
/// let initial = aggregation.initial();
/// let final_stage = aggregation.final_stage();
///
/// let left = initial.exec(Some(vec![Datum::from("a"), Datum::from("b")]));
/// let right = initial.exec(Some(vec![Datum::from("b"), Datum::from("c")]));
/// let bytes = final_stage.exec(Some(&[left, right])).unwrap();
///
/// let sketch = aggregation.codec().decode(bytes.as_bytes()).unwrap();
/// assert_eq!(sketch.lg_k(), 12);
/// assert!((sketch.estimate() - 3.0).abs() < 0.05);
/// ```
#[derive(Debug)]
pub struct CpcAggregation {
    codec: SketchCodec,
    cache: Arc<EmptySketchCache>,
    first_call: AtomicBool,
}

impl Default for CpcAggregation {
    fn default() -> Self {
        Self::new(AggregationConfig::default())
    }
}

impl CpcAggregation {
    /// Creates an aggregation backed by the process-wide empty-sketch cache.
    pub fn new(config: AggregationConfig) -> Self {
        Self::with_cache(config, EmptySketchCache::global())
    }

    /// Creates an aggregation backed by the given empty-sketch cache.
    pub fn with_cache(config: AggregationConfig, cache: Arc<EmptySketchCache>) -> Self {
        let empty = cache.get(config);
        Self {
            codec: SketchCodec::with_canonical_empty(config, empty.as_bytes()),
            cache,
            first_call: AtomicBool::new(true),
        }
    }

    /// Creates an aggregation from textual declaration arguments, see
    /// [`AggregationConfig::from_args`].
    pub fn from_args(args: &[&str]) -> Result<Self, Error> {
        AggregationConfig::from_args(args).map(Self::new)
    }

    /// Return the config of this aggregation.
    pub fn config(&self) -> AggregationConfig {
        self.codec.config()
    }

    /// Return the codec for sketches of this aggregation.
    pub fn codec(&self) -> &SketchCodec {
        &self.codec
    }

    /// Builds a sketch from one batch and serializes it.
    ///
    /// An absent or empty batch yields the canonical empty sketch.
    pub fn exec(&self, batch: Option<&[Datum]>) -> Result<SerializedSketch, Error> {
        if self.first_call.swap(false, Ordering::Relaxed) {
            tracing::info!("exec was used");
        }
        let config = self.config();
        let Some(batch) = batch.filter(|batch| !batch.is_empty()) else {
            return Ok(self.cache.get(config));
        };

        let mut sketch = config.new_sketch();
        sketch.update_batch(batch)?;
        if sketch.is_empty() {
            return Ok(self.cache.get(config));
        }
        Ok(self.codec.encode(&sketch))
    }

    /// Returns a fresh accumulator.
    pub fn accumulator(&self) -> SketchAccumulator {
        SketchAccumulator::with_cache(self.config(), self.cache.clone())
    }

    /// Returns the initial stage.
    pub fn initial(&self) -> InitialStage {
        InitialStage::new(self.config(), self.cache.clone())
    }

    /// Returns an intermediate stage.
    pub fn intermediate(&self) -> IntermediateStage {
        IntermediateStage::new(self.config(), self.cache.clone())
    }

    /// Returns the final stage.
    pub fn final_stage(&self) -> FinalStage {
        FinalStage::new(self.config(), self.cache.clone())
    }
}
