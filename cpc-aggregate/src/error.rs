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

//! Error types for CPC aggregation.

use std::fmt;

/// ErrorKind is all kinds of Error of the aggregation core.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A configuration argument is malformed or out of range.
    InvalidArgument,
    /// A record holds a value the sketch cannot be updated with.
    UnsupportedInputType,
    /// A sketch was built with a different seed than the aggregation.
    ConfigurationMismatch,
    /// Serialized sketch bytes are corrupt or truncated.
    MalformedSerializedSketch,
}

impl ErrorKind {
    /// Convert this error kind instance into static str.
    pub const fn into_static(self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "InvalidArgument",
            ErrorKind::UnsupportedInputType => "UnsupportedInputType",
            ErrorKind::ConfigurationMismatch => "ConfigurationMismatch",
            ErrorKind::MalformedSerializedSketch => "MalformedSerializedSketch",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.into_static())
    }
}

/// Error is the error struct returned by every fallible aggregation operation.
///
/// All kinds are fatal for the stage invocation that raised them; the host engine decides whether
/// the task is retried.
///
/// # Examples
///
/// ```
/// # use cpc_aggregate::error::Error;
/// # use cpc_aggregate::error::ErrorKind;
/// let err = Error::new(ErrorKind::InvalidArgument, "bad lg_k");
/// assert_eq!(err.kind(), ErrorKind::InvalidArgument);
/// assert_eq!(err.message(), "bad lg_k");
/// ```
pub struct Error {
    kind: ErrorKind,
    message: String,
    context: Vec<(&'static str, String)>,
}

impl Error {
    /// Create a new Error with error kind and message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: vec![],
        }
    }

    /// Add more context in error.
    pub fn with_context(mut self, key: &'static str, value: impl ToString) -> Self {
        self.context.push((key, value.to_string()));
        self
    }

    /// Return error's kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Return error's message.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

impl Error {
    pub(crate) fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, msg)
    }

    pub(crate) fn unsupported_input_type(type_name: &'static str) -> Self {
        Self::new(
            ErrorKind::UnsupportedInputType,
            format!(
                "record value must be one of NULL, BYTE, INTEGER, LONG, FLOAT, DOUBLE, \
                 BYTEARRAY or CHARARRAY; got {type_name}"
            ),
        )
        .with_context("type", type_name)
    }

    pub(crate) fn seed_mismatch(expected: u16, actual: u16) -> Self {
        Self::new(
            ErrorKind::ConfigurationMismatch,
            format!(
                "incompatible sketch configuration: seed hash expected {expected}, got {actual}"
            ),
        )
    }

    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedSerializedSketch, msg)
    }

    pub(crate) fn truncated(field: &'static str) -> Self {
        Self::malformed(format!("insufficient data: {field}"))
    }
}

impl From<datasketches::error::Error> for Error {
    fn from(err: datasketches::error::Error) -> Self {
        Error::malformed(err.message()).with_context("source", err.kind())
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // If alternate has been specified, we will print like Debug.
        if f.alternate() {
            let mut de = f.debug_struct("Error");
            de.field("kind", &self.kind);
            de.field("message", &self.message);
            de.field("context", &self.context);
            return de.finish();
        }

        write!(f, "{}", self.kind)?;
        if !self.message.is_empty() {
            write!(f, " => {}", self.message)?;
        }
        writeln!(f)?;

        if !self.context.is_empty() {
            writeln!(f)?;
            writeln!(f, "Context:")?;
            for (k, v) in self.context.iter() {
                writeln!(f, "   {k}: {v}")?;
            }
        }

        Ok(())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;

        if !self.context.is_empty() {
            write!(f, ", context: {{ ")?;
            for (i, (k, v)) in self.context.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}: {}", k, v)?;
            }
            write!(f, " }}")?;
        }

        if !self.message.is_empty() {
            write!(f, " => {}", self.message)?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {}
