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

use countminsketch::countmin::CountMinSketch;

fn main() {
    for (epsilon, delta) in [(0.1, 0.9), (0.0001, 0.9999)] {
        let sketch = CountMinSketch::new_with_estimates(epsilon, delta).unwrap();
        println!(
            "epsilon: {epsilon}, delta: {delta} -> depth: {}, width: {}",
            sketch.depth(),
            sketch.width()
        );
    }

    let key = "abc";
    let mut sketch = CountMinSketch::new_with_estimates(0.0001, 0.9999).unwrap();
    sketch.update(key, 1);
    println!("{key}: {}", sketch.estimate(key));

    // Persist to a file and load it back.
    println!("\nSaving sketch...");
    sketch.update(key, 2);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sketch.bin");
    let written = sketch.save_to_path(&path).unwrap();
    println!("Wrote {written} bytes to {}", path.display());

    let loaded = CountMinSketch::load_from_path(&path).unwrap();
    println!("{key}: {}", loaded.estimate(key));

    // Structured round trip.
    println!("\nStructured form:");
    let mut sketch = CountMinSketch::new_with_estimates(0.1, 0.9).unwrap();
    sketch.update(key, 10);
    let json = sketch.encode_structured().unwrap();
    println!("{}", String::from_utf8_lossy(&json));

    let mut sketch = CountMinSketch::decode_structured(&json).unwrap();
    sketch.update(key, 10);
    println!("{key}: {}", sketch.estimate(key));
}
