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

//! Input records and the routing of each record into a sketch update.

use datasketches::cpc::CpcSketch;
use datasketches::hash::value::canonical_float;

use crate::error::Error;

/// One scalar value contributed by an input record.
///
/// The host engine may hand over any of its scalar kinds; only `Null`, the integer, floating
/// point, byte and text variants can be counted. The remaining variants exist so that a record of
/// an unexpected type surfaces as an error instead of being dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    /// An absent value. Skipped, never counted.
    Null,
    /// 8-bit integer.
    Byte(i8),
    /// 32-bit integer.
    Int(i32),
    /// 64-bit integer.
    Long(i64),
    /// 32-bit floating point.
    Float(f32),
    /// 64-bit floating point.
    Double(f64),
    /// Opaque byte sequence.
    Bytes(Vec<u8>),
    /// UTF-8 text.
    Text(String),
    /// Boolean. Not countable.
    Boolean(bool),
    /// Milliseconds since the epoch. Not countable.
    DateTime(i64),
    /// Arbitrary precision integer. Not countable.
    BigInteger(i128),
    /// A nested record. Not countable.
    Tuple(Vec<Datum>),
}

impl Datum {
    /// The host-engine name of this value's type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Datum::Null => "NULL",
            Datum::Byte(_) => "BYTE",
            Datum::Int(_) => "INTEGER",
            Datum::Long(_) => "LONG",
            Datum::Float(_) => "FLOAT",
            Datum::Double(_) => "DOUBLE",
            Datum::Bytes(_) => "BYTEARRAY",
            Datum::Text(_) => "CHARARRAY",
            Datum::Boolean(_) => "BOOLEAN",
            Datum::DateTime(_) => "DATETIME",
            Datum::BigInteger(_) => "BIGINTEGER",
            Datum::Tuple(_) => "TUPLE",
        }
    }

    /// Returns true if this value can be fed to a sketch (or skipped, for `Null`).
    pub fn is_supported(&self) -> bool {
        !matches!(
            self,
            Datum::Boolean(_) | Datum::DateTime(_) | Datum::BigInteger(_) | Datum::Tuple(_)
        )
    }
}

impl From<i8> for Datum {
    fn from(value: i8) -> Self {
        Datum::Byte(value)
    }
}

impl From<i32> for Datum {
    fn from(value: i32) -> Self {
        Datum::Int(value)
    }
}

impl From<i64> for Datum {
    fn from(value: i64) -> Self {
        Datum::Long(value)
    }
}

impl From<f32> for Datum {
    fn from(value: f32) -> Self {
        Datum::Float(value)
    }
}

impl From<f64> for Datum {
    fn from(value: f64) -> Self {
        Datum::Double(value)
    }
}

impl From<&str> for Datum {
    fn from(value: &str) -> Self {
        Datum::Text(value.to_string())
    }
}

impl From<String> for Datum {
    fn from(value: String) -> Self {
        Datum::Text(value)
    }
}

impl From<Vec<u8>> for Datum {
    fn from(value: Vec<u8>) -> Self {
        Datum::Bytes(value)
    }
}

impl From<&[u8]> for Datum {
    fn from(value: &[u8]) -> Self {
        Datum::Bytes(value.to_vec())
    }
}

impl<T: Into<Datum>> From<Option<T>> for Datum {
    fn from(value: Option<T>) -> Self {
        value.map_or(Datum::Null, Into::into)
    }
}

/// Routes records into sketch updates.
///
/// Integers of every width are widened to 64 bits, so `1i8`, `1i32` and `1i64` count as the same
/// distinct value. Floats are hashed through their canonical `f64` bit pattern, so signed zeros, all
/// NaNs and equal `f32`/`f64` values each count once. Text is hashed in
/// its native UTF-8 form without re-encoding.
pub trait RecordUpdater {
    /// Updates with a single record.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::UnsupportedInputType`](crate::error::ErrorKind::UnsupportedInputType)
    /// if the record is not countable.
    fn update_datum(&mut self, datum: &Datum) -> Result<(), Error>;

    /// Updates with every record of a batch.
    ///
    /// The whole batch is checked before the first update, so a batch holding an unsupported
    /// record leaves the receiver untouched.
    fn update_batch(&mut self, batch: &[Datum]) -> Result<(), Error> {
        if let Some(datum) = batch.iter().find(|datum| !datum.is_supported()) {
            return Err(Error::unsupported_input_type(datum.type_name()));
        }
        for datum in batch {
            self.update_datum(datum)?;
        }
        Ok(())
    }
}

impl RecordUpdater for CpcSketch {
    fn update_datum(&mut self, datum: &Datum) -> Result<(), Error> {
        match datum {
            Datum::Null => {}
            Datum::Byte(v) => self.update(*v as i64),
            Datum::Int(v) => self.update(*v as i64),
            Datum::Long(v) => self.update(*v),
            Datum::Float(v) => self.update(canonical_float::from_f32(*v)),
            Datum::Double(v) => self.update(canonical_float::from_f64(*v)),
            Datum::Bytes(v) => self.update(v.as_slice()),
            Datum::Text(v) => self.update(v.as_str()),
            other => return Err(Error::unsupported_input_type(other.type_name())),
        }
        Ok(())
    }
}
