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

//! A Count-Min sketch for approximate frequency estimation.
//!
//! The sketch ingests a stream of `(key, increment)` events into a fixed-size counter
//! matrix and answers point queries with a one-sided error: an estimate is never lower
//! than the true frequency, and with probability `1 - (1/2)^depth` it exceeds the true
//! frequency by at most `2N / width`, where `N` is the total inserted weight.
//!
//! ```rust
//! use countminsketch::countmin::CountMinSketch;
//!
//! let mut sketch = CountMinSketch::new_with_estimates(0.1, 0.9).unwrap();
//! assert_eq!(sketch.depth(), 4);
//! assert_eq!(sketch.width(), 20);
//!
//! sketch.update("abc", 10);
//! assert!(sketch.estimate("abc") >= 10);
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod countmin;
pub mod error;
pub mod hash;
