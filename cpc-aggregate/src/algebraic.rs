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

//! The three-stage combiner used by engines that pre-aggregate before shuffling.
//!
//! The host engine decides the shape of the merge tree: it may call [`InitialStage`] once per
//! record or once per partition, insert any number of [`IntermediateStage`] levels, and finish with
//! a single [`FinalStage`]. Every shape yields the same coupon set and therefore the same estimate,
//! because sketch updates and unions are commutative and associative.
//!
//! ```text
//! batch ─► Initial ─► RawBatch ──┐
//! batch ─► Initial ─► RawBatch ──┴─► Intermediate ─► Serialized ──┐
//! batch ─► Initial ─► RawBatch ───────────────────────────────────┴─► Final ─► bytes
//! ```
//!
//! All stages are stateless: each call is independent, so a task may be abandoned and retried at
//! any point.

use std::sync::Arc;

use datasketches::cpc::CpcSketch;

use crate::cache::EmptySketchCache;
use crate::codec::SerializedSketch;
use crate::codec::SketchCodec;
use crate::config::AggregationConfig;
use crate::datum::Datum;
use crate::datum::RecordUpdater;
use crate::error::Error;

/// A partial result travelling between stages of the merge tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Partial {
    /// Raw records forwarded untouched by the initial stage.
    RawBatch(Vec<Datum>),
    /// A sketch serialized by a lower merge level.
    Serialized(SerializedSketch),
    /// A serialized sketch wrapped one level deeper, as some engines re-wrap intermediate output
    /// before feeding it to the next level.
    Nested(SerializedSketch),
}

impl Partial {
    fn resolve(&self) -> Resolved<'_> {
        match self {
            Partial::RawBatch(batch) => Resolved::Records(batch),
            Partial::Serialized(bytes) | Partial::Nested(bytes) => {
                Resolved::Sketch(bytes.as_bytes())
            }
        }
    }
}

enum Resolved<'a> {
    Records(&'a [Datum]),
    Sketch(&'a [u8]),
}

/// What every stage needs to build and emit sketches for one config.
#[derive(Debug, Clone)]
struct StageContext {
    codec: SketchCodec,
    cache: Arc<EmptySketchCache>,
}

impl StageContext {
    fn new(config: AggregationConfig, cache: Arc<EmptySketchCache>) -> Self {
        let empty = cache.get(config);
        Self {
            codec: SketchCodec::with_canonical_empty(config, empty.as_bytes()),
            cache,
        }
    }

    fn config(&self) -> AggregationConfig {
        self.codec.config()
    }

    fn empty(&self) -> SerializedSketch {
        self.cache.get(self.config())
    }

    /// Unions every partial into one sketch.
    ///
    /// Raw batches are all applied to one fresh sketch; serialized partials are decoded and
    /// unioned with it.
    fn merge(&self, partials: &[Partial]) -> Result<CpcSketch, Error> {
        let config = self.config();
        let mut records = config.new_sketch();
        let mut union = config.new_union();
        for partial in partials {
            match partial.resolve() {
                Resolved::Records(batch) => records.update_batch(batch)?,
                Resolved::Sketch(bytes) => union.update(&self.codec.decode(bytes)?)?,
            }
        }
        union.update(&records)?;
        Ok(union.to_sketch())
    }

    /// Serializes a merged sketch, substituting the canonical bytes for any empty result.
    ///
    /// An empty sketch decoded from a merged source serializes without the HIP flag and would
    /// otherwise differ from the canonical empty bytes.
    fn emit(&self, sketch: &CpcSketch) -> SerializedSketch {
        if sketch.is_empty() {
            self.empty()
        } else {
            self.codec.encode(sketch)
        }
    }
}

/// The first stage: forwards each raw batch unchanged.
#[derive(Debug, Clone)]
pub struct InitialStage {
    context: StageContext,
}

impl InitialStage {
    /// Creates the initial stage for `config`.
    pub fn new(config: AggregationConfig, cache: Arc<EmptySketchCache>) -> Self {
        Self {
            context: StageContext::new(config, cache),
        }
    }

    /// Return the config of this stage.
    pub fn config(&self) -> AggregationConfig {
        self.context.config()
    }

    /// Wraps a batch for forwarding. No sketch is built here.
    ///
    /// An absent or empty batch is forwarded as the canonical empty sketch.
    pub fn exec(&self, batch: Option<Vec<Datum>>) -> Partial {
        match batch {
            Some(batch) if !batch.is_empty() => Partial::RawBatch(batch),
            _ => Partial::Serialized(self.context.empty()),
        }
    }
}

/// A merge level: unions partials into one serialized sketch meant for further merging.
#[derive(Debug, Clone)]
pub struct IntermediateStage {
    context: StageContext,
}

impl IntermediateStage {
    /// Creates an intermediate stage for `config`.
    pub fn new(config: AggregationConfig, cache: Arc<EmptySketchCache>) -> Self {
        Self {
            context: StageContext::new(config, cache),
        }
    }

    /// Return the config of this stage.
    pub fn config(&self) -> AggregationConfig {
        self.context.config()
    }

    /// Unions the partials into a [`Partial::Serialized`] that can feed another intermediate
    /// level or the final stage.
    ///
    /// # Errors
    ///
    /// - [`UnsupportedInputType`] if a raw batch holds a record that cannot be counted.
    /// - [`ConfigurationMismatch`] if a serialized partial was built with another seed.
    /// - [`MalformedSerializedSketch`] if a serialized partial cannot be decoded.
    ///
    /// [`UnsupportedInputType`]: crate::error::ErrorKind::UnsupportedInputType
    /// [`ConfigurationMismatch`]: crate::error::ErrorKind::ConfigurationMismatch
    /// [`MalformedSerializedSketch`]: crate::error::ErrorKind::MalformedSerializedSketch
    pub fn exec(&self, partials: Option<&[Partial]>) -> Result<Partial, Error> {
        let partials = partials.unwrap_or_default();
        if partials.is_empty() {
            return Ok(Partial::Serialized(self.context.empty()));
        }
        let sketch = self.context.merge(partials)?;
        tracing::debug!(
            partials = partials.len(),
            empty = sketch.is_empty(),
            "intermediate stage merged"
        );
        Ok(Partial::Serialized(self.context.emit(&sketch)))
    }
}

/// The root of the merge tree: unions partials into the terminal serialized sketch.
#[derive(Debug, Clone)]
pub struct FinalStage {
    context: StageContext,
}

impl FinalStage {
    /// Creates the final stage for `config`.
    pub fn new(config: AggregationConfig, cache: Arc<EmptySketchCache>) -> Self {
        Self {
            context: StageContext::new(config, cache),
        }
    }

    /// Return the config of this stage.
    pub fn config(&self) -> AggregationConfig {
        self.context.config()
    }

    /// Unions the partials into the final serialized sketch.
    ///
    /// Fails exactly like [`IntermediateStage::exec`].
    pub fn exec(&self, partials: Option<&[Partial]>) -> Result<SerializedSketch, Error> {
        let partials = partials.unwrap_or_default();
        if partials.is_empty() {
            return Ok(self.context.empty());
        }
        let sketch = self.context.merge(partials)?;
        tracing::debug!(
            partials = partials.len(),
            lg_k = sketch.lg_k(),
            estimate = sketch.estimate(),
            "final stage merged"
        );
        Ok(self.context.emit(&sketch))
    }
}
