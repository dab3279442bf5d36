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

//! A single slot in a worker's frame ring
//!
//! A [`Frame`] owns an input buffer (filled by the producer from the Sample Source), an output
//! buffer (the result of the forward FFT), and the FFT plan that transforms one into the other.
//! Frame metadata (`frame_no`, `consumers_remaining`) lives in `crate::ring::RingState`, not
//! here: the buffers are free-standing so the ring's lock only ever guards small integers.

use num_complex::Complex32;
use num_traits::Zero;

use crate::fft::ForwardFft;

/// One FFT frame slot: input buffer, output buffer, and the plan that connects them
pub struct Frame {
    input: Vec<Complex32>,
    output: Vec<Complex32>,
    fft: ForwardFft,
}

impl Frame {
    /// Creates a frame with zeroed buffers of the given FFT length
    pub fn new(fft_size: usize) -> Self {
        Frame {
            input: vec![Complex32::zero(); fft_size],
            output: vec![Complex32::zero(); fft_size],
            fft: ForwardFft::new(fft_size),
        }
    }

    /// Returns a mutable reference to the input buffer, to be filled before [`Frame::transform`]
    pub fn input_mut(&mut self) -> &mut [Complex32] {
        &mut self.input
    }

    /// Runs the forward FFT, reading the input buffer and writing the output buffer
    pub fn transform(&mut self) {
        self.fft.process(&mut self.input, &mut self.output);
    }

    /// Returns the frequency-domain output of the most recent [`Frame::transform`] call
    pub fn output(&self) -> &[Complex32] {
        &self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_produces_flat_spectrum_for_impulse() {
        let mut frame = Frame::new(8);
        frame.input_mut()[0] = Complex32::new(1.0, 0.0);
        frame.transform();
        for bin in frame.output() {
            assert!((bin.norm() - 1.0).abs() < 1e-4);
        }
    }
}
