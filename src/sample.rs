/*
 * Copyright 2019 The Regents of the University of California
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 *
 */

//!
//! The analysis window
//!
//! IQ byte-to-complex conversion lives in `sofi_sample_source` (see
//! `sofi_sample_source::read_samples`), the only place it's actually performed on the hot path;
//! this module does not keep its own copy.
//!

use num_complex::Complex32;
use std::f32::consts::PI;

/// Returns a Hamming window of the given length
///
/// `w[i] = 0.53836 - 0.46164 * cos(2*pi*i / (len - 1))`
///
/// # Panics
///
/// Panics if `len < 2` (the window is undefined for shorter lengths).
pub fn hamming(len: usize) -> Vec<f32> {
    assert!(len >= 2, "Hamming window requires a length of at least 2");
    const ALPHA: f32 = 0.53836;
    const BETA: f32 = 1.0 - ALPHA;
    let denom = (len - 1) as f32;
    (0..len)
        .map(|i| {
            let phi = (2.0 * PI * i as f32) / denom;
            ALPHA - BETA * phi.cos()
        })
        .collect()
}

/// Multiplies a complex sample by a real window value
#[inline]
pub fn apply_window(sample: Complex32, window_value: f32) -> Complex32 {
    Complex32::new(sample.re * window_value, sample.im * window_value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hamming_endpoints() {
        let w = hamming(8);
        assert_eq!(w.len(), 8);
        // Both ends should equal alpha - beta = 2*alpha - 1
        let expected_end = 2.0 * 0.53836 - 1.0;
        assert!((w[0] - expected_end).abs() < 1e-5);
        assert!((w[7] - expected_end).abs() < 1e-5);
        // Non-negative everywhere
        assert!(w.iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn test_hamming_peak_at_center() {
        let w = hamming(9);
        let max_index = w
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(max_index, 4);
    }
}
