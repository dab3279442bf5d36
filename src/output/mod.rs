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

//! Optional debug dump sinks for a [`crate::pipeline::Pipeline`]'s output
//!
//! Not part of the Core API: spec.md §6 calls the dump format out-of-contract, exposable as an
//! optional sink. Grounded on the teacher's `output/mod.rs` (`WriteOutput` trait) and
//! `output/stdio.rs`; the wire layout (fftshift order, phases before magnitude) is grounded on
//! `original_source/backend/combiner.c`'s `write_flipped_fft_halves`/`cb_run`.

pub mod stdio;

use std::error::Error;

pub use self::stdio::StdioDebugSink;

/// A sink that receives one combined output frame per [`crate::pipeline::Pipeline::step`] call
pub trait DebugSink {
    /// Writes one pair's phase spectrum, in fftshift order (upper half of bins first)
    fn write_phase(&mut self, phase: &[f32]) -> Result<(), Box<dyn Error + Send>>;

    /// Writes the combined magnitude spectrum, in fftshift order
    ///
    /// Called once per output frame, after every pair's phase has been written, matching
    /// `cb_run`'s write order (all phases, then the magnitude).
    fn write_magnitude(&mut self, mag: &[f32]) -> Result<(), Box<dyn Error + Send>>;

    /// Flushes any buffered output
    fn flush(&mut self) -> Result<(), Box<dyn Error + Send>>;
}

/// Writes one full output frame (every pair's phase, then the magnitude) to a sink
pub fn write_frame(
    sink: &mut dyn DebugSink,
    mag: &[f32],
    phases: &[Vec<f32>],
) -> Result<(), Box<dyn Error + Send>> {
    for phase in phases {
        sink.write_phase(phase)?;
    }
    sink.write_magnitude(mag)?;
    sink.flush()
}

/// Reorders a spectrum so the upper half of bins (Nyquist-to-top, the "negative frequency" half
/// in a standard FFT layout) comes first, matching `write_flipped_fft_halves`'s "top before
/// bottom" order
///
/// `buf.len()` must be even.
pub fn fftshift(buf: &[f32], out: &mut Vec<f32>) {
    assert_eq!(buf.len() % 2, 0, "fftshift requires an even-length buffer");
    let half = buf.len() / 2;
    out.clear();
    out.extend_from_slice(&buf[half..]);
    out.extend_from_slice(&buf[..half]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fftshift_swaps_halves() {
        let buf = vec![0.0, 1.0, 2.0, 3.0];
        let mut out = Vec::new();
        fftshift(&buf, &mut out);
        assert_eq!(out, vec![2.0, 3.0, 0.0, 1.0]);
    }
}
