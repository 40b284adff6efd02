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

use std::error::Error as _;
use std::fs;
use std::io;
use std::io::Read;
use std::io::Write;

use countminsketch::countmin::CountMinSketch;
use countminsketch::countmin::HEADER_BYTES;
use countminsketch::error::ErrorKind;
use googletest::assert_that;
use googletest::prelude::contains_substring;
use serde::Deserialize;
use serde::Serialize;

/// Accepts `budget` bytes, then fails every write.
struct BrokenWriter {
    budget: usize,
    written: Vec<u8>,
}

impl Write for BrokenWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.budget == 0 {
            return Err(io::Error::other("disk full"));
        }
        let n = buf.len().min(self.budget);
        self.budget -= n;
        self.written.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Serves the first `budget` bytes of `data`, then fails every read.
struct BrokenReader<'a> {
    data: &'a [u8],
    budget: usize,
}

impl Read for BrokenReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.budget == 0 {
            return Err(io::Error::other("connection reset"));
        }
        let n = buf.len().min(self.budget).min(self.data.len());
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        self.budget -= n;
        Ok(n)
    }
}

fn populated_sketch() -> CountMinSketch {
    let mut sketch = CountMinSketch::new_with_estimates(0.01, 0.99).unwrap();
    for i in 1..2000u64 {
        sketch.update(i.to_string(), i % 50);
    }
    sketch
}

#[test]
fn test_binary_layout() {
    let mut sketch = CountMinSketch::new(2, 3).unwrap();
    sketch.update("abc", 0x0102);

    let bytes = sketch.serialize();
    assert_eq!(bytes.len(), HEADER_BYTES + 8 * 6);
    assert_eq!(bytes[..8], 2u64.to_be_bytes());
    assert_eq!(bytes[8..16], 3u64.to_be_bytes());

    let counters: Vec<u64> = bytes[HEADER_BYTES..]
        .chunks(8)
        .map(|chunk| u64::from_be_bytes(chunk.try_into().unwrap()))
        .collect();
    assert_eq!(counters, sketch.counters());
    // One cell per row, row-major.
    for row in counters.chunks(3) {
        assert_eq!(row.iter().sum::<u64>(), 0x0102);
    }
}

#[test]
fn test_binary_round_trip() {
    let sketch = populated_sketch();
    let bytes = sketch.serialize();
    assert_eq!(bytes.len(), 16 + 8 * sketch.depth() * sketch.width());

    let restored = CountMinSketch::deserialize(&bytes).unwrap();
    assert_eq!(restored, sketch);
    for i in 1..2000u64 {
        let key = i.to_string();
        assert_eq!(restored.estimate(&key), sketch.estimate(&key));
    }
}

#[test]
fn test_stream_round_trip() {
    let sketch = populated_sketch();
    let mut buf = Vec::new();
    let written = sketch.encode_binary(&mut buf).unwrap();
    assert_eq!(written, buf.len() as u64);

    let restored = CountMinSketch::decode_binary(buf.as_slice()).unwrap();
    assert_eq!(restored, sketch);
}

#[test]
fn test_truncated_input() {
    let sketch = populated_sketch();
    let bytes = sketch.serialize();

    for len in [0, 7, 8, 15, 16, bytes.len() - 1] {
        let err = CountMinSketch::deserialize(&bytes[..len]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TruncatedInput, "prefix of {len} bytes");
    }
}

#[test]
fn test_encode_binary_writer_failure() {
    let sketch = populated_sketch();

    for budget in [0, 8, HEADER_BYTES + 100] {
        let mut writer = BrokenWriter {
            budget,
            written: Vec::new(),
        };
        let err = sketch.encode_binary(&mut writer).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io, "budget of {budget} bytes");
        assert!(err.source().is_some());
        assert_eq!(writer.written.len(), budget);
    }
}

#[test]
fn test_decode_binary_reader_failure() {
    let bytes = populated_sketch().serialize();

    let reader = BrokenReader {
        data: &bytes,
        budget: HEADER_BYTES + 20,
    };
    let err = CountMinSketch::decode_binary(reader).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    let message = err.to_string();
    assert_that!(message.as_str(), contains_substring("failed to read counters"));
    let source = err.source().unwrap().to_string();
    assert_that!(source.as_str(), contains_substring("connection reset"));

    let reader = BrokenReader {
        data: &bytes,
        budget: 4,
    };
    let err = CountMinSketch::decode_binary(reader).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    let message = err.to_string();
    assert_that!(message.as_str(), contains_substring("failed to read depth"));
}

#[test]
fn test_trailing_bytes_rejected() {
    let mut bytes = CountMinSketch::new(2, 2).unwrap().serialize();
    bytes.push(0);
    let err = CountMinSketch::deserialize(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedDeserializeData);
}

#[test]
fn test_header_over_capacity_is_rejected_before_reading_counters() {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&(1u64 << 20).to_be_bytes());
    bytes.extend_from_slice(&(1u64 << 20).to_be_bytes());
    let err = CountMinSketch::deserialize(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CapacityExceeded);
}

#[test]
fn test_structured_round_trip() {
    let sketch = populated_sketch();
    let json = sketch.encode_structured().unwrap();
    let restored = CountMinSketch::decode_structured(&json).unwrap();
    assert_eq!(restored, sketch);
}

#[test]
fn test_structured_then_update() {
    let mut sketch = CountMinSketch::new(4, 20).unwrap();
    sketch.update("abc", 10);

    let json = sketch.encode_structured().unwrap();
    let mut sketch = CountMinSketch::decode_structured(&json).unwrap();
    sketch.update("abc", 10);
    assert_eq!(sketch.estimate("abc"), 20);
}

#[test]
fn test_structured_and_binary_agree() {
    let sketch = populated_sketch();
    let from_json = CountMinSketch::decode_structured(&sketch.encode_structured().unwrap()).unwrap();
    let from_binary = CountMinSketch::deserialize(&sketch.serialize()).unwrap();
    assert_eq!(from_json.serialize(), from_binary.serialize());
    assert_eq!(
        from_json.encode_structured().unwrap(),
        from_binary.encode_structured().unwrap()
    );
}

#[test]
fn test_structured_malformed() {
    for payload in [
        &b"not json"[..],
        br#"{"d":1,"w":1}"#,
        br#"{"d":1,"w":1,"count":[1],"extra":true}"#,
        br#"{"d":1,"w":2,"count":[1]}"#,
        br#"{"d":1,"w":0,"count":[]}"#,
    ] {
        let err = CountMinSketch::decode_structured(payload).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedDeserializeData);
    }
}

#[test]
fn test_embedded_in_serde_struct() {
    #[derive(Serialize, Deserialize)]
    struct Snapshot {
        name: String,
        sketch: CountMinSketch,
    }

    let mut sketch = CountMinSketch::new(3, 10).unwrap();
    sketch.update("page", 4);
    let snapshot = Snapshot {
        name: "views".to_string(),
        sketch,
    };

    let text = serde_json::to_string(&snapshot).unwrap();
    let restored: Snapshot = serde_json::from_str(&text).unwrap();
    assert_eq!(restored.name, "views");
    assert_eq!(restored.sketch, snapshot.sketch);
}

#[test]
fn test_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sketch.bin");

    let sketch = populated_sketch();
    let written = sketch.save_to_path(&path).unwrap();
    assert_eq!(written, sketch.serialized_size() as u64);
    assert_eq!(fs::metadata(&path).unwrap().len(), written);

    let restored = CountMinSketch::load_from_path(&path).unwrap();
    assert_eq!(restored, sketch);
}

#[test]
fn test_save_replaces_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sketch.bin");
    fs::write(&path, vec![0xff; 4096]).unwrap();

    let mut sketch = CountMinSketch::new(2, 2).unwrap();
    sketch.update("a", 1);
    sketch.save_to_path(&path).unwrap();

    assert_eq!(fs::read(&path).unwrap(), sketch.serialize());
    // Only the sketch file is left behind.
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_save_into_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("sketch.bin");
    let err = CountMinSketch::new(1, 1).unwrap().save_to_path(&path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(!path.exists());
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = CountMinSketch::load_from_path(dir.path().join("absent.bin")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    let rendered = err.to_string();
    assert_that!(rendered.as_str(), contains_substring("absent.bin"));
}

#[test]
fn test_load_truncated_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("short.bin");
    let bytes = populated_sketch().serialize();
    fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

    let err = CountMinSketch::load_from_path(&path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TruncatedInput);
}

#[test]
fn test_load_file_with_trailing_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("long.bin");
    let mut bytes = CountMinSketch::new(2, 2).unwrap().serialize();
    bytes.extend_from_slice(b"junk");
    fs::write(&path, bytes).unwrap();

    let err = CountMinSketch::load_from_path(&path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedDeserializeData);
}
