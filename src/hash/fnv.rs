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

use std::hash::Hasher;

const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const PRIME: u64 = 0x100000001b3;

/// The 64-bit FNV-1 hash: multiply by the prime, then xor in each byte.
///
/// This is the plain FNV-1 variant (not FNV-1a). The digest fixes where every key
/// lands in a sketch, so changing it invalidates all persisted sketches.
#[derive(Debug, Clone, Copy)]
pub struct Fnv1Hasher64 {
    state: u64,
}

impl Fnv1Hasher64 {
    /// Creates a hasher in its initial state.
    pub const fn new() -> Self {
        Fnv1Hasher64 {
            state: OFFSET_BASIS,
        }
    }

    /// Returns the digest of `bytes` in one call.
    pub fn hash_bytes(bytes: &[u8]) -> u64 {
        let mut hasher = Self::new();
        hasher.write(bytes);
        hasher.finish()
    }
}

impl Default for Fnv1Hasher64 {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher for Fnv1Hasher64 {
    fn finish(&self) -> u64 {
        self.state
    }

    fn write(&mut self, bytes: &[u8]) {
        let mut hash = self.state;
        for &byte in bytes {
            hash = hash.wrapping_mul(PRIME);
            hash ^= u64::from(byte);
        }
        self.state = hash;
    }
}
