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

//! Forward and inverse complex FFTs, feature-gated between FFTW and rustfft
//!
//! The FFT Worker (`crate::worker`) uses [`ForwardFft`] to transform windowed IQ blocks into the
//! frequency domain. The Synchronizer (`crate::sync`) uses [`InverseFft`] on the conjugate
//! product of two receivers' spectra to locate the cross-correlation peak.

#[cfg(feature = "fftw")]
mod impl_fftw;
#[cfg(not(feature = "fftw"))]
mod impl_rustfft;

#[cfg(feature = "fftw")]
use self::impl_fftw::{FftwForward, FftwInverse};
#[cfg(not(feature = "fftw"))]
use self::impl_rustfft::{RustFftForward, RustFftInverse};

use num_complex::Complex32;

#[cfg(feature = "fftw")]
type ForwardImpl = FftwForward;
#[cfg(not(feature = "fftw"))]
type ForwardImpl = RustFftForward;

#[cfg(feature = "fftw")]
type InverseImpl = FftwInverse;
#[cfg(not(feature = "fftw"))]
type InverseImpl = RustFftInverse;

/// A forward complex FFT of a fixed length
pub struct ForwardFft {
    inner: ForwardImpl,
}

impl ForwardFft {
    /// Creates a forward FFT plan for vectors of length `size`
    pub fn new(size: usize) -> Self {
        ForwardFft {
            inner: ForwardImpl::new(size),
        }
    }

    /// Runs the forward transform, writing `input`'s spectrum into `output`
    ///
    /// `input` and `output` must both have the length this plan was created with.
    pub fn process(&mut self, input: &mut [Complex32], output: &mut [Complex32]) {
        self.inner.process(input, output)
    }
}

/// An inverse complex FFT of a fixed length (unnormalized, matching FFTW/rustfft convention)
pub struct InverseFft {
    inner: InverseImpl,
}

impl InverseFft {
    /// Creates an inverse FFT plan for vectors of length `size`
    pub fn new(size: usize) -> Self {
        InverseFft {
            inner: InverseImpl::new(size),
        }
    }

    /// Runs the inverse transform, writing `input`'s time-domain result into `output`
    pub fn process(&mut self, input: &mut [Complex32], output: &mut [Complex32]) {
        self.inner.process(input, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::Zero;

    #[test]
    fn test_impulse_is_flat_spectrum() {
        let n = 8;
        let mut fft = ForwardFft::new(n);
        let mut input = vec![Complex32::zero(); n];
        input[0] = Complex32::new(1.0, 0.0);
        let mut output = vec![Complex32::zero(); n];
        fft.process(&mut input, &mut output);
        for bin in &output {
            assert!((bin.norm() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_forward_then_inverse_recovers_impulse_shape() {
        let n = 16;
        let mut fwd = ForwardFft::new(n);
        let mut inv = InverseFft::new(n);
        let mut input = vec![Complex32::zero(); n];
        input[3] = Complex32::new(1.0, 0.0);
        let mut spectrum = vec![Complex32::zero(); n];
        fwd.process(&mut input, &mut spectrum);
        let mut time = vec![Complex32::zero(); n];
        inv.process(&mut spectrum, &mut time);
        // Unnormalized round trip scales every sample by n; the peak should stay at index 3
        let (peak_index, _) = time
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.norm().partial_cmp(&b.norm()).unwrap())
            .unwrap();
        assert_eq!(peak_index, 3);
    }
}
