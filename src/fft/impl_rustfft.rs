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
//! FFT implementations backed by rustfft (used when the `fftw` feature is disabled)
//!

use std::sync::Arc;

use num_complex::Complex32;
use rustfft::{FFTplanner, FFT};

/// Forward complex FFT using rustfft
pub struct RustFftForward {
    fft: Arc<dyn FFT<f32>>,
}

impl RustFftForward {
    pub fn new(size: usize) -> Self {
        RustFftForward {
            fft: FFTplanner::new(false).plan_fft(size),
        }
    }

    pub fn process(&mut self, input: &mut [Complex32], output: &mut [Complex32]) {
        self.fft.process(input, output);
    }
}

/// Inverse complex FFT using rustfft
pub struct RustFftInverse {
    fft: Arc<dyn FFT<f32>>,
}

impl RustFftInverse {
    pub fn new(size: usize) -> Self {
        RustFftInverse {
            fft: FFTplanner::new(true).plan_fft(size),
        }
    }

    pub fn process(&mut self, input: &mut [Complex32], output: &mut [Complex32]) {
        self.fft.process(input, output);
    }
}
