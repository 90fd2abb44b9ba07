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

//! The byte boundary sketches cross between stages.
//!
//! Serialized sketches are forwarded unchanged and only decoded when they must be unioned. Before
//! handing bytes to the sketch library, the fixed CPC preamble is read to tell a sketch built with
//! another seed ([`ErrorKind::ConfigurationMismatch`]) apart from corrupt input
//! ([`ErrorKind::MalformedSerializedSketch`]).
//!
//! [`ErrorKind::ConfigurationMismatch`]: crate::error::ErrorKind::ConfigurationMismatch
//! [`ErrorKind::MalformedSerializedSketch`]: crate::error::ErrorKind::MalformedSerializedSketch

use std::fmt;
use std::io::Cursor;
use std::sync::Arc;

use byteorder::LE;
use byteorder::ReadBytesExt;
use datasketches::cpc::CpcSketch;

use crate::config::AggregationConfig;
use crate::error::Error;

/// Family ID of CPC sketches.
const CPC_FAMILY_ID: u8 = 16;
/// Byte offset of the 16-bit seed hash within the preamble.
const SEED_HASH_OFFSET: usize = 6;

/// An immutable serialized sketch.
///
/// Clones share the underlying buffer, so the canonical empty sketch can be handed out repeatedly
/// without copying.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SerializedSketch(Arc<[u8]>);

impl SerializedSketch {
    /// Returns the serialized bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the number of serialized bytes.
    #[allow(clippy::len_without_is_empty)] // a serialized sketch is never zero bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Copies the bytes into an owned vector.
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl AsRef<[u8]> for SerializedSketch {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for SerializedSketch {
    fn from(bytes: Vec<u8>) -> Self {
        SerializedSketch(bytes.into())
    }
}

impl From<&[u8]> for SerializedSketch {
    fn from(bytes: &[u8]) -> Self {
        SerializedSketch(bytes.into())
    }
}

impl fmt::Debug for SerializedSketch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SerializedSketch")
            .field(&format_args!("{} bytes", self.0.len()))
            .finish()
    }
}

/// The leading fields of a serialized CPC sketch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Preamble {
    pub(crate) lg_k: u8,
    pub(crate) seed_hash: u16,
}

impl Preamble {
    pub(crate) fn read(bytes: &[u8]) -> Result<Self, Error> {
        fn make_error(tag: &'static str) -> impl FnOnce(std::io::Error) -> Error {
            move |_| Error::truncated(tag)
        }

        let mut cursor = Cursor::new(bytes);
        cursor.read_u8().map_err(make_error("preamble_ints"))?;
        cursor.read_u8().map_err(make_error("serial_version"))?;
        let family_id = cursor.read_u8().map_err(make_error("family_id"))?;
        if family_id != CPC_FAMILY_ID {
            return Err(Error::malformed(format!(
                "invalid family: expected {CPC_FAMILY_ID} (CPC), got {family_id}"
            )));
        }
        let lg_k = cursor.read_u8().map_err(make_error("lg_k"))?;
        cursor
            .read_u8()
            .map_err(make_error("first_interesting_column"))?;
        cursor.read_u8().map_err(make_error("flags"))?;
        debug_assert_eq!(cursor.position() as usize, SEED_HASH_OFFSET);
        let seed_hash = cursor.read_u16::<LE>().map_err(make_error("seed_hash"))?;
        Ok(Preamble { lg_k, seed_hash })
    }
}

/// Encodes and decodes sketches of one [`AggregationConfig`].
#[derive(Debug, Clone)]
pub struct SketchCodec {
    config: AggregationConfig,
    seed_hash: u16,
}

impl SketchCodec {
    /// Creates a codec for the given config.
    pub fn new(config: AggregationConfig) -> Self {
        let empty = config.new_sketch().serialize();
        Self::with_canonical_empty(config, &empty)
    }

    /// Creates a codec whose expected seed hash is read from an already serialized empty sketch of
    /// the same config, avoiding a second serialization.
    pub(crate) fn with_canonical_empty(config: AggregationConfig, empty: &[u8]) -> Self {
        let seed_hash = u16::from_le_bytes([empty[SEED_HASH_OFFSET], empty[SEED_HASH_OFFSET + 1]]);
        Self { config, seed_hash }
    }

    /// Return the config of this codec.
    pub fn config(&self) -> AggregationConfig {
        self.config
    }

    /// Serializes a sketch.
    pub fn encode(&self, sketch: &CpcSketch) -> SerializedSketch {
        SerializedSketch::from(sketch.serialize())
    }

    /// Deserializes a sketch, checking that it was built with the configured seed.
    ///
    /// # Errors
    ///
    /// - [`ConfigurationMismatch`] if the embedded seed hash differs from the configured seed's.
    /// - [`MalformedSerializedSketch`] if the bytes are truncated, not a CPC sketch, or rejected
    ///   by the sketch library.
    ///
    /// [`ConfigurationMismatch`]: crate::error::ErrorKind::ConfigurationMismatch
    /// [`MalformedSerializedSketch`]: crate::error::ErrorKind::MalformedSerializedSketch
    pub fn decode(&self, bytes: &[u8]) -> Result<CpcSketch, Error> {
        let preamble = Preamble::read(bytes)?;
        if preamble.seed_hash != self.seed_hash {
            return Err(Error::seed_mismatch(self.seed_hash, preamble.seed_hash)
                .with_context("seed", self.config.seed()));
        }
        let sketch = CpcSketch::deserialize_with_seed(bytes, self.config.seed())
            .map_err(|err| Error::from(err).with_context("lg_k", preamble.lg_k))?;
        Ok(sketch)
    }
}
