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

//! Structured codec for count-min sketches.
//!
//! A sketch is represented as an object with three fields: `d` (depth), `w` (width)
//! and `count`, the counters in row-major order. Deserialization runs the same
//! checks as [`CountMinSketch::new`] and rejects a `count` array whose length is not
//! `d * w`. No hasher state is stored; it is derived from the dimensions.

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::de::Error as _;

use super::CountMinSketch;
use crate::error::Error;
use crate::error::ErrorKind;

#[derive(Serialize)]
struct SketchRef<'a> {
    d: usize,
    w: usize,
    count: &'a [u64],
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SketchOwned {
    d: usize,
    w: usize,
    count: Vec<u64>,
}

impl Serialize for CountMinSketch {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        SketchRef {
            d: self.depth(),
            w: self.width(),
            count: self.counters(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CountMinSketch {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let SketchOwned { d, w, count } = SketchOwned::deserialize(deserializer)?;
        CountMinSketch::from_parts(d, w, count).map_err(D::Error::custom)
    }
}

impl CountMinSketch {
    /// Encodes this sketch in its structured (JSON) form.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::EncodeFailed`] if the encoder fails.
    ///
    /// # Examples
    ///
    /// ```
    /// # use countminsketch::countmin::CountMinSketch;
    /// let mut sketch = CountMinSketch::new(1, 3).unwrap();
    /// sketch.update("k", 2);
    ///
    /// let json = sketch.encode_structured().unwrap();
    /// let text = String::from_utf8(json).unwrap();
    /// assert!(text.starts_with(r#"{"d":1,"w":3,"count":["#));
    /// ```
    pub fn encode_structured(&self) -> Result<Vec<u8>, Error> {
        serde_json::to_vec(self).map_err(|err| {
            Error::new(ErrorKind::EncodeFailed, "failed to encode sketch").set_source(err)
        })
    }

    /// Decodes a sketch from its structured (JSON) form.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::MalformedDeserializeData`] if the payload is not valid
    /// JSON, misses a field, carries an unknown field, declares dimensions that
    /// [`new`](Self::new) would reject, or holds the wrong number of counters.
    ///
    /// # Examples
    ///
    /// ```
    /// # use countminsketch::countmin::CountMinSketch;
    /// let sketch = CountMinSketch::decode_structured(br#"{"d":1,"w":2,"count":[4,0]}"#).unwrap();
    /// assert_eq!(sketch.depth(), 1);
    /// assert_eq!(sketch.width(), 2);
    /// assert_eq!(sketch.counters(), &[4, 0]);
    /// ```
    pub fn decode_structured(bytes: &[u8]) -> Result<Self, Error> {
        serde_json::from_slice(bytes).map_err(|err| {
            Error::new(
                ErrorKind::MalformedDeserializeData,
                "failed to decode structured sketch",
            )
            .set_source(err)
        })
    }
}
