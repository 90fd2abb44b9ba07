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

//! # Mergeable CPC distinct-count aggregation
//!
//! This crate computes approximate distinct counts over partitioned data with Compressed
//! Probabilistic Counting sketches from the Apache DataSketches library. It provides the pieces a
//! dataflow engine needs to fold records into sketches and to combine partial sketches produced by
//! independent workers:
//!
//! - [`datum`]: input records and how each one updates a sketch;
//! - [`accumulator`]: a single mutable sketch fed batch after batch within one partition;
//! - [`algebraic`]: the initial / intermediate / final stages of a merge tree;
//! - [`cache`]: memoized serializations of empty sketches;
//! - [`codec`]: the byte boundary between stages, with seed checking.
//!
//! Whatever merge tree the engine chooses, the final estimate is the same as if every record had
//! been merged at once.
//!
//! # Usage
//!
//! ```rust
//! # use cpc_aggregate::CpcAggregation;
//! # use cpc_aggregate::Datum;
//! # use cpc_aggregate::Partial;
//! let aggregation = CpcAggregation::default();
//!
//! // Two workers pre-combine their partitions...
//! let intermediate = aggregation.intermediate();
//! let left = intermediate
//!     .exec(Some(&[Partial::RawBatch(vec![Datum::from("a"), Datum::from(1i64)])]))
//!     .unwrap();
//! let right = intermediate
//!     .exec(Some(&[Partial::RawBatch(vec![Datum::from("a"), Datum::from(2.5f64)])]))
//!     .unwrap();
//!
//! // ...and a reducer merges them.
//! let bytes = aggregation.final_stage().exec(Some(&[left, right])).unwrap();
//! let sketch = aggregation.codec().decode(bytes.as_bytes()).unwrap();
//! assert!((sketch.estimate() - 3.0).abs() < 0.05);
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]

pub mod accumulator;
pub mod algebraic;
pub mod cache;
pub mod codec;
pub mod config;
pub mod datum;
pub mod error;

mod aggregation;

pub use self::aggregation::CpcAggregation;
pub use self::algebraic::Partial;
pub use self::codec::SerializedSketch;
pub use self::config::AggregationConfig;
pub use self::datum::Datum;
pub use self::error::Error;
pub use self::error::ErrorKind;
pub use datasketches::cpc::CpcSketch;
