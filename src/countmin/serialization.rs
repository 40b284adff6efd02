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

//! Fixed-width binary codec.
//!
//! Layout, all integers unsigned 64-bit big-endian:
//!
//! ```text
//! [depth][width][counter(0, 0) .. counter(0, w-1)] .. [counter(d-1, 0) .. counter(d-1, w-1)]
//! ```

use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Read;
use std::io::Write;
use std::path::Path;

use byteorder::BigEndian;
use byteorder::ByteOrder;
use byteorder::ReadBytesExt;
use byteorder::WriteBytesExt;

use super::CountMinSketch;
use crate::error::Error;
use crate::error::ErrorKind;

/// Size in bytes of the `[depth][width]` header.
pub const HEADER_BYTES: usize = 16;
/// Size in bytes of one serialized counter.
pub const COUNTER_BYTES: usize = 8;

impl CountMinSketch {
    /// Returns the exact size of the binary form of this sketch.
    pub fn serialized_size(&self) -> usize {
        HEADER_BYTES + COUNTER_BYTES * self.counters().len()
    }

    /// Serializes this sketch into its binary form.
    ///
    /// # Examples
    ///
    /// ```
    /// # use countminsketch::countmin::CountMinSketch;
    /// let sketch = CountMinSketch::new(1, 2).unwrap();
    /// let bytes = sketch.serialize();
    /// assert_eq!(bytes.len(), 32);
    /// assert_eq!(&bytes[..16], &[0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 2]);
    /// assert!(bytes[16..].iter().all(|&b| b == 0));
    /// ```
    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = vec![0u8; self.serialized_size()];
        let (header, body) = bytes.split_at_mut(HEADER_BYTES);
        BigEndian::write_u64(&mut header[..8], self.depth() as u64);
        BigEndian::write_u64(&mut header[8..], self.width() as u64);
        BigEndian::write_u64_into(self.counters(), body);
        bytes
    }

    /// Deserializes a sketch from a complete binary payload.
    ///
    /// # Errors
    ///
    /// Fails like [`decode_binary`](Self::decode_binary), and additionally with
    /// [`ErrorKind::MalformedDeserializeData`] if bytes remain after the counters.
    ///
    /// [`ErrorKind::MalformedDeserializeData`]: crate::error::ErrorKind::MalformedDeserializeData
    pub fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        let mut slice = bytes;
        let sketch = Self::decode_binary(&mut slice)?;
        if !slice.is_empty() {
            return Err(trailing_bytes(slice.len()));
        }
        Ok(sketch)
    }

    /// Writes the binary form of this sketch to `writer`, returning the number of
    /// bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Io`] if the writer fails.
    ///
    /// [`ErrorKind::Io`]: crate::error::ErrorKind::Io
    pub fn encode_binary<W: Write>(&self, mut writer: W) -> Result<u64, Error> {
        writer
            .write_u64::<BigEndian>(self.depth() as u64)
            .map_err(|err| Error::io("failed to write depth", err))?;
        writer
            .write_u64::<BigEndian>(self.width() as u64)
            .map_err(|err| Error::io("failed to write width", err))?;

        let mut row = vec![0u8; COUNTER_BYTES * self.width()];
        for counters in self.counters().chunks(self.width()) {
            BigEndian::write_u64_into(counters, &mut row);
            writer
                .write_all(&row)
                .map_err(|err| Error::io("failed to write counters", err))?;
        }
        writer
            .flush()
            .map_err(|err| Error::io("failed to flush sketch", err))?;

        Ok(self.serialized_size() as u64)
    }

    /// Reads a sketch in binary form from `reader`.
    ///
    /// Exactly `16 + 8 * depth * width` bytes are consumed; anything after that is
    /// left in the reader. The counter array is allocated from the decoded header.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::TruncatedInput`] if the stream ends early.
    /// - [`ErrorKind::Io`] if the reader fails.
    /// - [`ErrorKind::InvalidParameter`] or [`ErrorKind::CapacityExceeded`] if the
    ///   header holds dimensions [`new`](Self::new) would reject.
    ///
    /// [`ErrorKind::TruncatedInput`]: crate::error::ErrorKind::TruncatedInput
    /// [`ErrorKind::Io`]: crate::error::ErrorKind::Io
    /// [`ErrorKind::InvalidParameter`]: crate::error::ErrorKind::InvalidParameter
    /// [`ErrorKind::CapacityExceeded`]: crate::error::ErrorKind::CapacityExceeded
    pub fn decode_binary<R: Read>(mut reader: R) -> Result<Self, Error> {
        let depth = reader
            .read_u64::<BigEndian>()
            .map_err(|err| Error::read_failed("depth", err))?;
        let width = reader
            .read_u64::<BigEndian>()
            .map_err(|err| Error::read_failed("width", err))?;

        let depth = header_dimension("depth", depth)?;
        let width = header_dimension("width", width)?;
        let mut sketch = Self::new(depth, width)?;
        reader
            .read_u64_into::<BigEndian>(sketch.counters_mut())
            .map_err(|err| Error::read_failed("counters", err))?;
        Ok(sketch)
    }

    /// Writes the binary form of this sketch to the file at `path`, returning the
    /// number of bytes written.
    ///
    /// The data goes to a temporary file in the same directory that is synced and
    /// then renamed over `path`, so `path` either keeps its old content or holds the
    /// complete new sketch.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Io`] if any file operation fails.
    ///
    /// [`ErrorKind::Io`]: crate::error::ErrorKind::Io
    pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<u64, Error> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|err| {
            Error::io("failed to create temporary file", err)
                .with_context("path", path.display())
        })?;
        let written = self.encode_binary(BufWriter::new(tmp.as_file_mut()))?;
        tmp.as_file()
            .sync_all()
            .map_err(|err| Error::io("failed to sync sketch file", err))?;
        tmp.persist(path).map_err(|err| {
            Error::io("failed to move sketch file into place", err.error)
                .with_context("path", path.display())
        })?;

        tracing::debug!(path = %path.display(), bytes = written, "saved count-min sketch");
        Ok(written)
    }

    /// Reads a sketch from a file holding exactly one binary payload.
    ///
    /// # Errors
    ///
    /// Fails like [`decode_binary`](Self::decode_binary), with
    /// [`ErrorKind::Io`] if the file cannot be opened, and with
    /// [`ErrorKind::MalformedDeserializeData`] if the file continues past the
    /// counters.
    ///
    /// [`ErrorKind::Io`]: crate::error::ErrorKind::Io
    /// [`ErrorKind::MalformedDeserializeData`]: crate::error::ErrorKind::MalformedDeserializeData
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|err| {
            Error::io("failed to open sketch file", err).with_context("path", path.display())
        })?;
        let mut reader = BufReader::new(file);

        let sketch = Self::decode_binary(&mut reader)
            .map_err(|err| err.with_context("path", path.display()))?;

        let rest = reader
            .fill_buf()
            .map_err(|err| {
                Error::io("failed to read sketch file", err).with_context("path", path.display())
            })?;
        if !rest.is_empty() {
            return Err(Error::malformed("unexpected bytes after the sketch counters")
                .with_context("path", path.display()));
        }

        tracing::debug!(
            path = %path.display(),
            depth = sketch.depth(),
            width = sketch.width(),
            "loaded count-min sketch"
        );
        Ok(sketch)
    }
}

fn header_dimension(name: &'static str, value: u64) -> Result<usize, Error> {
    usize::try_from(value).map_err(|_| {
        Error::new(
            ErrorKind::CapacityExceeded,
            format!("{name} does not fit in memory"),
        )
        .with_context(name, value)
    })
}

fn trailing_bytes(len: usize) -> Error {
    Error::malformed("unexpected bytes after the sketch counters").with_context("trailing", len)
}
