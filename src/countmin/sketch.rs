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

use crate::error::Error;
use crate::hash::Fnv1Hasher64;

/// Count-Min sketch for estimating item frequencies.
///
/// The sketch is a `depth x width` matrix of `u64` counters stored row-major in one
/// flat array. Each key maps to one bucket per row; updates add to those buckets and
/// estimates take the minimum over them.
///
/// Counters wrap on overflow. Size the workload so that no single bucket can
/// accumulate more than `u64::MAX`.
///
/// See the [module documentation](super) for more details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountMinSketch {
    depth: usize,
    width: usize,
    counters: Vec<u64>,
}

impl CountMinSketch {
    /// The largest number of cells (`depth * width`) a sketch may hold.
    ///
    /// Every constructor and decoder enforces this ceiling, so untrusted dimensions
    /// can never request more than 4 GiB of counters.
    pub const MAX_CELLS: usize = 1 << 29;

    /// Creates a sketch with `depth` rows of `width` buckets each.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidParameter`] if either dimension is zero, and
    /// [`ErrorKind::CapacityExceeded`] if `depth * width` overflows or is larger than
    /// [`MAX_CELLS`](Self::MAX_CELLS).
    ///
    /// [`ErrorKind::InvalidParameter`]: crate::error::ErrorKind::InvalidParameter
    /// [`ErrorKind::CapacityExceeded`]: crate::error::ErrorKind::CapacityExceeded
    ///
    /// # Examples
    ///
    /// ```
    /// # use countminsketch::countmin::CountMinSketch;
    /// # use countminsketch::error::ErrorKind;
    /// let sketch = CountMinSketch::new(4, 20).unwrap();
    /// assert_eq!(sketch.depth(), 4);
    /// assert_eq!(sketch.width(), 20);
    ///
    /// let err = CountMinSketch::new(0, 20).unwrap_err();
    /// assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    /// ```
    pub fn new(depth: usize, width: usize) -> Result<Self, Error> {
        let num_cells = Self::checked_num_cells(depth, width)?;
        Ok(CountMinSketch {
            depth,
            width,
            counters: vec![0; num_cells],
        })
    }

    /// Creates a sketch sized for an error factor `epsilon` and a confidence `delta`.
    ///
    /// The width is `ceil(2 / epsilon)` and the depth is
    /// `ceil(ln(1 - delta) / ln(1/2))`: an estimate exceeds the true count by more
    /// than `epsilon * N` with probability at most `1 - delta`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidParameter`] if `epsilon` or `delta` is not in the
    /// open interval `(0, 1)`, or if `delta` is so small that no row would be needed.
    /// `delta` is never clamped. Capacity errors from [`new`](Self::new) propagate.
    ///
    /// [`ErrorKind::InvalidParameter`]: crate::error::ErrorKind::InvalidParameter
    ///
    /// # Examples
    ///
    /// ```
    /// # use countminsketch::countmin::CountMinSketch;
    /// let sketch = CountMinSketch::new_with_estimates(0.1, 0.9).unwrap();
    /// assert_eq!(sketch.depth(), 4);
    /// assert_eq!(sketch.width(), 20);
    /// ```
    pub fn new_with_estimates(epsilon: f64, delta: f64) -> Result<Self, Error> {
        let width = Self::suggest_width(epsilon)?;
        let depth = Self::suggest_depth(delta)?;
        tracing::debug!(epsilon, delta, depth, width, "sizing count-min sketch");
        Self::new(depth, width)
    }

    /// Suggests the number of buckets per row for an error factor `epsilon`.
    pub fn suggest_width(epsilon: f64) -> Result<usize, Error> {
        if !(epsilon > 0.0 && epsilon < 1.0) {
            return Err(Error::invalid_parameter("epsilon", epsilon));
        }
        // The cast saturates for tiny epsilon; `new` then rejects the capacity.
        Ok((2.0 / epsilon).ceil() as usize)
    }

    /// Suggests the number of rows for a confidence `delta`.
    pub fn suggest_depth(delta: f64) -> Result<usize, Error> {
        if !(delta > 0.0 && delta < 1.0) {
            return Err(Error::invalid_parameter("delta", delta));
        }
        let depth = ((1.0 - delta).ln() / 0.5f64.ln()).ceil();
        if depth < 1.0 {
            return Err(Error::invalid_parameter("delta", delta));
        }
        Ok(depth as usize)
    }

    fn checked_num_cells(depth: usize, width: usize) -> Result<usize, Error> {
        if depth == 0 {
            return Err(Error::invalid_parameter("depth", depth));
        }
        if width == 0 {
            return Err(Error::invalid_parameter("width", width));
        }
        match depth.checked_mul(width) {
            Some(num_cells) if num_cells <= Self::MAX_CELLS => Ok(num_cells),
            _ => Err(Error::capacity_exceeded(depth, width, Self::MAX_CELLS)),
        }
    }

    /// Rebuilds a sketch from decoded parts, applying the same dimension checks as
    /// [`new`](Self::new) and requiring exactly `depth * width` counters.
    pub(super) fn from_parts(depth: usize, width: usize, counters: Vec<u64>) -> Result<Self, Error> {
        let num_cells = Self::checked_num_cells(depth, width)?;
        if counters.len() != num_cells {
            return Err(Error::malformed(format!(
                "expected {num_cells} counters for a {depth}x{width} sketch, found {}",
                counters.len()
            )));
        }
        Ok(CountMinSketch {
            depth,
            width,
            counters,
        })
    }

    /// Returns the number of rows (hash functions).
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns the number of buckets per row.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the counters in row-major order.
    pub fn counters(&self) -> &[u64] {
        &self.counters
    }

    pub(super) fn counters_mut(&mut self) -> &mut [u64] {
        &mut self.counters
    }

    /// Returns the total weight inserted so far.
    ///
    /// Every update adds its amount to exactly one bucket of each row, so the sum of
    /// the first row is the total stream weight (modulo counter wraparound).
    pub fn total_weight(&self) -> u64 {
        self.counters[..self.width]
            .iter()
            .fold(0u64, |acc, &c| acc.wrapping_add(c))
    }

    /// Returns true if no weight has been inserted.
    pub fn is_empty(&self) -> bool {
        self.counters.iter().all(|&c| c == 0)
    }

    /// Returns the error factor `2 / width` of this sketch.
    pub fn relative_error(&self) -> f64 {
        2.0 / self.width as f64
    }

    /// Returns the probability `1 - (1/2)^depth` that an estimate stays within
    /// [`error_bound`](Self::error_bound).
    pub fn confidence(&self) -> f64 {
        1.0 - 0.5f64.powi(self.depth.min(i32::MAX as usize) as i32)
    }

    /// Returns the additive error bound `2N / width` for the current total weight,
    /// rounded down and saturated at `u64::MAX`.
    pub fn error_bound(&self) -> u64 {
        let bound = u128::from(self.total_weight()) * 2 / self.width as u128;
        u64::try_from(bound).unwrap_or(u64::MAX)
    }

    /// Updates the frequency of `key` by `amount`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use countminsketch::countmin::CountMinSketch;
    /// let mut sketch = CountMinSketch::new(4, 20).unwrap();
    /// sketch.update("abc", 10);
    /// sketch.update(String::from("abc"), 10);
    /// assert_eq!(sketch.estimate(b"abc"), 20);
    /// ```
    pub fn update(&mut self, key: impl AsRef<[u8]>, amount: u64) {
        let (h1, h2) = base_hashes(key.as_ref());
        for row in 0..self.depth {
            let idx = self.cell_index(row, h1, h2);
            self.counters[idx] = self.counters[idx].wrapping_add(amount);
        }
    }

    /// Returns the estimated frequency of `key`.
    ///
    /// The estimate is never lower than the true frequency.
    pub fn estimate(&self, key: impl AsRef<[u8]>) -> u64 {
        let (h1, h2) = base_hashes(key.as_ref());
        (0..self.depth)
            .map(|row| self.counters[self.cell_index(row, h1, h2)])
            .min()
            .unwrap_or(0)
    }

    /// Returns a lower bound on the true frequency of `key` that holds with
    /// probability [`confidence`](Self::confidence).
    pub fn lower_bound(&self, key: impl AsRef<[u8]>) -> u64 {
        self.estimate(key).saturating_sub(self.error_bound())
    }

    /// Merges another sketch into this one by adding the counters cell by cell.
    ///
    /// The result is the sketch that would have been built from both streams.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::DimensionMismatch`] if the sketches differ in depth or
    /// width. Neither sketch is modified in that case.
    ///
    /// [`ErrorKind::DimensionMismatch`]: crate::error::ErrorKind::DimensionMismatch
    ///
    /// # Examples
    ///
    /// ```
    /// # use countminsketch::countmin::CountMinSketch;
    /// let mut left = CountMinSketch::new(4, 64).unwrap();
    /// let mut right = CountMinSketch::new(4, 64).unwrap();
    /// left.update("a", 2);
    /// right.update("a", 3);
    ///
    /// left.merge(&right).unwrap();
    /// assert!(left.estimate("a") >= 5);
    /// ```
    pub fn merge(&mut self, other: &CountMinSketch) -> Result<(), Error> {
        if self.depth != other.depth || self.width != other.width {
            return Err(Error::dimension_mismatch(
                (self.depth, self.width),
                (other.depth, other.width),
            ));
        }
        for (c, &o) in self.counters.iter_mut().zip(&other.counters) {
            *c = c.wrapping_add(o);
        }
        tracing::trace!(depth = self.depth, width = self.width, "merged count-min sketch");
        Ok(())
    }

    /// Resets every counter to zero, keeping the dimensions.
    pub fn reset(&mut self) {
        self.counters.fill(0);
    }

    /// Returns the bucket `key` maps to in each row, in row order.
    pub fn locations(&self, key: impl AsRef<[u8]>) -> Vec<usize> {
        let (h1, h2) = base_hashes(key.as_ref());
        (0..self.depth)
            .map(|row| location(h1, h2, row, self.width))
            .collect()
    }

    #[inline]
    fn cell_index(&self, row: usize, h1: u32, h2: u32) -> usize {
        row * self.width + location(h1, h2, row, self.width)
    }
}

/// Splits the FNV-1 digest of `key` into `(h1, h2)`: the low and high 32 bits.
#[inline]
fn base_hashes(key: &[u8]) -> (u32, u32) {
    let digest = Fnv1Hasher64::hash_bytes(key);
    (digest as u32, (digest >> 32) as u32)
}

/// Double hashing: `(h1 + h2 * row) mod width`.
#[inline]
fn location(h1: u32, h2: u32, row: usize, width: usize) -> usize {
    let hash = u64::from(h1).wrapping_add(u64::from(h2).wrapping_mul(row as u64));
    (hash % width as u64) as usize
}
