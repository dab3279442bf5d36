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
//! FFT implementations backed by the system FFTW library
//!

use fftw::array::AlignedVec;
use fftw::plan::{C2CPlan, C2CPlan32};
use fftw::types::{Flag, Sign};
use num_complex::Complex32;

/// Forward complex FFT using FFTW
pub struct FftwForward {
    fft: C2CPlan32,
    scratch_in: AlignedVec<Complex32>,
    scratch_out: AlignedVec<Complex32>,
}

impl FftwForward {
    pub fn new(size: usize) -> Self {
        let fft = C2CPlan32::aligned(&[size], Sign::Forward, Flag::MEASURE)
            .expect("FFTW forward plan setup failed");
        FftwForward {
            fft,
            scratch_in: AlignedVec::new(size),
            scratch_out: AlignedVec::new(size),
        }
    }

    pub fn process(&mut self, input: &mut [Complex32], output: &mut [Complex32]) {
        self.scratch_in.copy_from_slice(input);
        self.fft
            .c2c(&mut self.scratch_in, &mut self.scratch_out)
            .expect("FFTW forward transform failed");
        output.copy_from_slice(&self.scratch_out);
    }
}

/// Inverse complex FFT using FFTW
pub struct FftwInverse {
    fft: C2CPlan32,
    scratch_in: AlignedVec<Complex32>,
    scratch_out: AlignedVec<Complex32>,
}

impl FftwInverse {
    pub fn new(size: usize) -> Self {
        let fft = C2CPlan32::aligned(&[size], Sign::Backward, Flag::MEASURE)
            .expect("FFTW inverse plan setup failed");
        FftwInverse {
            fft,
            scratch_in: AlignedVec::new(size),
            scratch_out: AlignedVec::new(size),
        }
    }

    pub fn process(&mut self, input: &mut [Complex32], output: &mut [Complex32]) {
        self.scratch_in.copy_from_slice(input);
        self.fft
            .c2c(&mut self.scratch_in, &mut self.scratch_out)
            .expect("FFTW inverse transform failed");
        output.copy_from_slice(&self.scratch_out);
    }
}
