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

//! Error types for sketch operations

use std::fmt;
use std::io;

/// ErrorKind is all kinds of Error a sketch operation can fail with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A construction argument is out of range.
    InvalidParameter,
    /// The requested dimensions would overflow or exceed the cell ceiling.
    CapacityExceeded,
    /// Two sketches with different shapes were combined.
    DimensionMismatch,
    /// A binary stream ended before the payload its header declares.
    TruncatedInput,
    /// The sketch data being deserialized is malformed.
    MalformedDeserializeData,
    /// The structured encoder failed.
    EncodeFailed,
    /// The underlying reader, writer or file failed.
    Io,
}

impl ErrorKind {
    /// Convert this error kind instance into static str.
    pub const fn into_static(self) -> &'static str {
        match self {
            ErrorKind::InvalidParameter => "InvalidParameter",
            ErrorKind::CapacityExceeded => "CapacityExceeded",
            ErrorKind::DimensionMismatch => "DimensionMismatch",
            ErrorKind::TruncatedInput => "TruncatedInput",
            ErrorKind::MalformedDeserializeData => "MalformedDeserializeData",
            ErrorKind::EncodeFailed => "EncodeFailed",
            ErrorKind::Io => "Io",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.into_static())
    }
}

/// Error is the error struct returned by all fallible sketch functions.
pub struct Error {
    kind: ErrorKind,
    message: String,
    context: Vec<(&'static str, String)>,
    source: Option<anyhow::Error>,
}

impl Error {
    /// Create a new Error with error kind and message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: Vec::default(),
            source: None,
        }
    }

    /// Add more context in error.
    pub fn with_context(mut self, key: &'static str, value: impl ToString) -> Self {
        self.context.push((key, value.to_string()));
        self
    }

    /// Set source for error.
    ///
    /// # Panics
    ///
    /// Panics if the source has been set.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::error::Error as _;
    /// use countminsketch::error::{Error, ErrorKind};
    ///
    /// let mut error = Error::new(ErrorKind::Io, "failed to read sketch");
    /// assert!(error.source().is_none());
    /// error = error.set_source(std::io::Error::new(std::io::ErrorKind::Other, "IO error"));
    /// assert!(error.source().is_some());
    /// ```
    pub fn set_source(mut self, src: impl Into<anyhow::Error>) -> Self {
        assert!(self.source.is_none(), "the source error has been set");
        self.source = Some(src.into());
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

// Constructors for the failures raised inside the crate.
impl Error {
    pub(crate) fn invalid_parameter(name: &'static str, value: impl ToString) -> Self {
        Self::new(
            ErrorKind::InvalidParameter,
            format!("{name} is out of range"),
        )
        .with_context(name, value)
    }

    pub(crate) fn capacity_exceeded(depth: usize, width: usize, max_cells: usize) -> Self {
        Self::new(
            ErrorKind::CapacityExceeded,
            format!("depth * width exceeds the limit of {max_cells} cells"),
        )
        .with_context("depth", depth)
        .with_context("width", width)
    }

    pub(crate) fn dimension_mismatch(expected: (usize, usize), found: (usize, usize)) -> Self {
        Self::new(
            ErrorKind::DimensionMismatch,
            "cannot merge sketches with different dimensions",
        )
        .with_context("expected", format!("{}x{}", expected.0, expected.1))
        .with_context("found", format!("{}x{}", found.0, found.1))
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedDeserializeData, message)
    }

    /// Maps a failed read of `field`. End of stream becomes `TruncatedInput`,
    /// anything else is reported as `Io` with the cause attached.
    pub(crate) fn read_failed(field: &'static str, err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Self::new(
                ErrorKind::TruncatedInput,
                format!("stream ended while reading {field}"),
            )
        } else {
            Self::new(ErrorKind::Io, format!("failed to read {field}")).set_source(err)
        }
    }

    pub(crate) fn io(message: impl Into<String>, err: io::Error) -> Self {
        Self::new(ErrorKind::Io, message).set_source(err)
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
            de.field("source", &self.source);
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

        if let Some(source) = &self.source {
            writeln!(f)?;
            writeln!(f, "Source:")?;
            writeln!(f, "   {source:#}")?;
        }

        Ok(())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;

        if !self.context.is_empty() {
            write!(f, ", context: {{ ")?;
            write!(
                f,
                "{}",
                self.context
                    .iter()
                    .map(|(k, v)| format!("{k}: {v}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            )?;
            write!(f, " }}")?;
        }

        if !self.message.is_empty() {
            write!(f, " => {}", self.message)?;
        }

        if let Some(source) = &self.source {
            write!(f, ", source: {source}")?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|v| v.as_ref())
    }
}
