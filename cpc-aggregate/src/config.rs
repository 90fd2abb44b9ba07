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

//! Aggregation configuration shared by every stage of one pipeline.

use std::str::FromStr;

use datasketches::cpc::CpcSketch;
use datasketches::cpc::CpcUnion;

use crate::error::Error;

/// Default log2 of K, matching the CPC sketch default.
pub const DEFAULT_LG_K: u8 = 11;
/// Min log2 of K.
pub const MIN_LG_K: u8 = 4;
/// Max log2 of K.
pub const MAX_LG_K: u8 = 26;
/// The well-known default hash seed of the DataSketches family.
pub const DEFAULT_SEED: u64 = 9001;

/// The `(lg_k, seed)` pair every sketch of one aggregation is built with.
///
/// All three algebraic stages, the accumulator and the empty-sketch cache of one aggregation must
/// see the same value; it never changes after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AggregationConfig {
    lg_k: u8,
    seed: u64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            lg_k: DEFAULT_LG_K,
            seed: DEFAULT_SEED,
        }
    }
}

impl AggregationConfig {
    /// Creates a config with the given `lg_k` and `seed`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidArgument`](crate::error::ErrorKind::InvalidArgument) if `lg_k`
    /// is not in `[4, 26]`, or if `seed` hashes to the reserved seed hash of zero.
    pub fn new(lg_k: u8, seed: u64) -> Result<Self, Error> {
        if !(MIN_LG_K..=MAX_LG_K).contains(&lg_k) {
            return Err(Error::invalid_argument(format!(
                "lg_k must be in [{MIN_LG_K}, {MAX_LG_K}]; got {lg_k}"
            )));
        }
        CpcSketch::with_seed(lg_k, seed).map_err(|err| {
            Error::invalid_argument(err.message()).with_context("seed", seed)
        })?;
        Ok(Self { lg_k, seed })
    }

    /// Creates a config with the given `lg_k` and the default seed.
    pub fn with_lg_k(lg_k: u8) -> Result<Self, Error> {
        Self::new(lg_k, DEFAULT_SEED)
    }

    /// Builds a config from textual declaration arguments: `[]`, `[lg_k]` or `[lg_k, seed]`.
    ///
    /// Seeds may be written as unsigned or as signed 64-bit integers; a negative seed keeps its
    /// two's complement bit pattern.
    ///
    /// # Examples
    ///
    /// ```
    /// # use cpc_aggregate::config::AggregationConfig;
    /// let config = AggregationConfig::from_args(&["10", "123"]).unwrap();
    /// assert_eq!(config.lg_k(), 10);
    /// assert_eq!(config.seed(), 123);
    ///
    /// let negative = AggregationConfig::from_args(&["12", "-1"]).unwrap();
    /// assert_eq!(negative.seed(), u64::MAX);
    /// ```
    pub fn from_args(args: &[&str]) -> Result<Self, Error> {
        match args {
            [] => Ok(Self::default()),
            [lg_k] => Self::with_lg_k(parse_lg_k(lg_k)?),
            [lg_k, seed] => Self::new(parse_lg_k(lg_k)?, parse_seed(seed)?),
            _ => Err(Error::invalid_argument(format!(
                "expected at most 2 arguments (lg_k, seed); got {}",
                args.len()
            ))),
        }
    }

    /// Return the parameter lg_k.
    pub fn lg_k(&self) -> u8 {
        self.lg_k
    }

    /// Return the hash seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Creates an empty sketch with this config.
    pub(crate) fn new_sketch(&self) -> CpcSketch {
        // lg_k and seed were accepted by `new`, the only way to build a non-default config
        CpcSketch::with_seed(self.lg_k, self.seed).expect("validated config")
    }

    /// Creates an empty union with this config.
    pub(crate) fn new_union(&self) -> CpcUnion {
        CpcUnion::with_seed(self.lg_k, self.seed).expect("validated config")
    }
}

impl FromStr for AggregationConfig {
    type Err = Error;

    /// Parses `"lg_k"` or `"lg_k,seed"`; an empty string yields the default config.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Self::default());
        }
        let args = s.split(',').map(str::trim).collect::<Vec<_>>();
        Self::from_args(&args)
    }
}

fn parse_lg_k(text: &str) -> Result<u8, Error> {
    text.trim().parse::<u8>().map_err(|err| {
        Error::invalid_argument(format!("lg_k is not a valid integer: {err}"))
            .with_context("lg_k", text)
    })
}

fn parse_seed(text: &str) -> Result<u64, Error> {
    let text = text.trim();
    if let Ok(seed) = text.parse::<u64>() {
        return Ok(seed);
    }
    text.parse::<i64>().map(|seed| seed as u64).map_err(|err| {
        Error::invalid_argument(format!("seed is not a valid 64-bit integer: {err}"))
            .with_context("seed", text)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_defaults() {
        let config = AggregationConfig::default();
        assert_eq!(config.lg_k(), DEFAULT_LG_K);
        assert_eq!(config.seed(), DEFAULT_SEED);
        assert_eq!(AggregationConfig::from_args(&[]).unwrap(), config);
        assert_eq!("".parse::<AggregationConfig>().unwrap(), config);
    }

    #[test]
    fn test_from_args() {
        let config = AggregationConfig::from_args(&["10"]).unwrap();
        assert_eq!(config.lg_k(), 10);
        assert_eq!(config.seed(), DEFAULT_SEED);

        let config = "12, 123".parse::<AggregationConfig>().unwrap();
        assert_eq!(config.lg_k(), 12);
        assert_eq!(config.seed(), 123);

        let config = AggregationConfig::from_args(&["4", "-2"]).unwrap();
        assert_eq!(config.seed(), (-2i64) as u64);
    }

    #[test]
    fn test_rejects_bad_args() {
        for args in [
            &["3"][..],
            &["27"],
            &["abc"],
            &["11", "seed"],
            &["11", "18446744073709551616"],
            &["11", "1", "2"],
        ] {
            let err = AggregationConfig::from_args(args).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument, "{args:?}");
        }
    }

    #[test]
    fn test_rejects_seed_with_zero_hash() {
        // 50541 hashes to a 16-bit seed hash of 0, which serialized sketches reserve
        let err = AggregationConfig::new(11, 50541).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(err.to_string().contains("50541"), "{err}");

        let err = AggregationConfig::from_args(&["11", "50541"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        let err = "4,50541".parse::<AggregationConfig>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let config = AggregationConfig::new(11, 123).unwrap();
        assert!(config.new_sketch().is_empty());
    }
}
