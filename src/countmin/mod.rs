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

//! Count-Min sketch implementation for frequency estimation.
//!
//! The Count-Min sketch provides approximate frequency counts for streaming data
//! with configurable error and confidence bounds. Estimates never undercount; with
//! probability `1 - (1/2)^depth` they overcount by at most `2N / width`.
//!
//! # Usage
//!
//! ```rust
//! use countminsketch::countmin::CountMinSketch;
//!
//! let mut sketch = CountMinSketch::new(5, 256).unwrap();
//!
//! sketch.update("apple", 1);
//! sketch.update(b"banana", 3);
//!
//! let banana = sketch.estimate("banana");
//! assert!(banana >= 3);
//! ```
//!
//! # Configuration Helpers
//!
//! ```rust
//! use countminsketch::countmin::CountMinSketch;
//!
//! let width = CountMinSketch::suggest_width(0.01).unwrap();
//! let depth = CountMinSketch::suggest_depth(0.99).unwrap();
//!
//! let _sketch = CountMinSketch::new(depth, width).unwrap();
//! ```
//!
//! # Serialization
//!
//! Two encodings carry the same content. The binary form is
//! `[depth u64 BE][width u64 BE][depth * width counters, u64 BE, row-major]`;
//! the structured form is a JSON object with the fields `d`, `w` and `count`.
//!
//! ```rust
//! use countminsketch::countmin::CountMinSketch;
//!
//! let mut sketch = CountMinSketch::new(4, 20).unwrap();
//! sketch.update("abc", 10);
//!
//! let bytes = sketch.serialize();
//! assert_eq!(bytes.len(), 16 + 8 * 4 * 20);
//! assert_eq!(CountMinSketch::deserialize(&bytes).unwrap(), sketch);
//!
//! let json = sketch.encode_structured().unwrap();
//! assert_eq!(CountMinSketch::decode_structured(&json).unwrap(), sketch);
//! ```

mod serde;
mod serialization;

mod sketch;
pub use self::serialization::COUNTER_BYTES;
pub use self::serialization::HEADER_BYTES;
pub use self::sketch::CountMinSketch;
