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

use std::sync::Arc;

use cpc_aggregate::AggregationConfig;
use cpc_aggregate::CpcAggregation;
use cpc_aggregate::CpcSketch;
use cpc_aggregate::Datum;
use cpc_aggregate::SerializedSketch;
use cpc_aggregate::cache::EmptySketchCache;

#[allow(dead_code)] // false-positive
pub const RELATIVE_ERROR_FOR_LG_K_11: f64 = 0.02;

/// An aggregation with its own cache, isolated from other tests.
#[allow(dead_code)] // false-positive
pub fn isolated(config: AggregationConfig) -> CpcAggregation {
    CpcAggregation::with_cache(config, Arc::new(EmptySketchCache::new()))
}

#[allow(dead_code)] // false-positive
pub fn text_batch(values: &[&str]) -> Vec<Datum> {
    values.iter().copied().map(Datum::from).collect()
}

#[allow(dead_code)] // false-positive
pub fn long_batch(values: impl IntoIterator<Item = i64>) -> Vec<Datum> {
    values.into_iter().map(Datum::from).collect()
}

#[allow(dead_code)] // false-positive
pub fn decode(aggregation: &CpcAggregation, bytes: &SerializedSketch) -> CpcSketch {
    aggregation.codec().decode(bytes.as_bytes()).unwrap()
}
