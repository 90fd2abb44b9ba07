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

//! Properties the merge tree must hold for any input and any grouping.

mod common;

use common::decode;
use common::isolated;
use cpc_aggregate::AggregationConfig;
use cpc_aggregate::CpcAggregation;
use cpc_aggregate::Datum;
use cpc_aggregate::Partial;
use proptest::prelude::*;

fn arb_datum() -> impl Strategy<Value = Datum> {
    prop_oneof![
        1 => Just(Datum::Null),
        3 => (0i64..500).prop_map(Datum::Long),
        2 => (0i32..500).prop_map(Datum::Int),
        2 => (-100.0f64..100.0).prop_map(Datum::Double),
        3 => "[a-z]{1,4}".prop_map(Datum::Text),
        1 => proptest::collection::vec(any::<u8>(), 0..4).prop_map(Datum::Bytes),
    ]
}

/// Records plus an arbitrary permutation of them.
fn arb_permuted_records() -> impl Strategy<Value = (Vec<Datum>, Vec<Datum>)> {
    proptest::collection::vec(arb_datum(), 0..300).prop_flat_map(|records| {
        let shuffled = Just(records.clone()).prop_shuffle();
        (Just(records), shuffled)
    })
}

/// Records plus cut points splitting them into consecutive groups.
fn arb_grouped_records() -> impl Strategy<Value = (Vec<Datum>, Vec<usize>)> {
    proptest::collection::vec(arb_datum(), 0..300).prop_flat_map(|records| {
        let len = records.len();
        (
            Just(records),
            proptest::collection::vec(0..=len, 0..6).prop_map(|mut cuts| {
                cuts.sort_unstable();
                cuts
            }),
        )
    })
}

fn split(records: &[Datum], cuts: &[usize]) -> Vec<Vec<Datum>> {
    let mut groups = Vec::new();
    let mut start = 0;
    for &cut in cuts.iter().chain(std::iter::once(&records.len())) {
        groups.push(records[start..cut].to_vec());
        start = cut;
    }
    groups
}

fn final_estimate(aggregation: &CpcAggregation, partials: &[Partial]) -> f64 {
    let bytes = aggregation.final_stage().exec(Some(partials)).unwrap();
    decode(aggregation, &bytes).estimate()
}

proptest! {
    #[test]
    fn prop_order_independent((records, shuffled) in arb_permuted_records()) {
        let aggregation = isolated(AggregationConfig::default());

        let original = final_estimate(&aggregation, &[Partial::RawBatch(records)]);
        let permuted = final_estimate(&aggregation, &[Partial::RawBatch(shuffled)]);
        prop_assert_eq!(original, permuted);
    }

    #[test]
    fn prop_grouping_independent((records, cuts) in arb_grouped_records()) {
        let aggregation = isolated(AggregationConfig::default());
        let intermediate = aggregation.intermediate();
        let groups = split(&records, &cuts);

        let whole = final_estimate(&aggregation, &[Partial::RawBatch(records.clone())]);

        // one pre-combination level, then the final merge
        let combined = groups
            .iter()
            .map(|group| {
                intermediate
                    .exec(Some(&[Partial::RawBatch(group.clone())]))
                    .unwrap()
            })
            .collect::<Vec<_>>();
        prop_assert_eq!(final_estimate(&aggregation, &combined), whole);

        // nested levels with wrapped partials
        let nested = combined
            .into_iter()
            .map(|partial| match partial {
                Partial::Serialized(bytes) => Partial::Nested(bytes),
                other => other,
            })
            .collect::<Vec<_>>();
        let level2 = intermediate.exec(Some(&nested)).unwrap();
        prop_assert_eq!(final_estimate(&aggregation, &[level2]), whole);

        // single pass through the accumulator agrees within the error bound
        let mut accumulator = aggregation.accumulator();
        for group in &groups {
            accumulator.accumulate(Some(group)).unwrap();
        }
        let serial = decode(&aggregation, &accumulator.current_value()).estimate();
        prop_assert!((serial - whole).abs() <= whole * 0.05 + 1e-9);
    }
}
