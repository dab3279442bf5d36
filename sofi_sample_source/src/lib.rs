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
//! The Sample Source adapter: a peek/commit/seek byte-stream interface over interleaved (I, Q)
//! u8 pairs, independent of where the bytes ultimately come from (an SDR device node, a named
//! pipe, a plain file, or a synthetic generator for tests).
//!

mod file;
mod synthetic;

pub use crate::file::FileSampleSource;
pub use crate::synthetic::SyntheticSampleSource;

use std::io;

/// One sample is two bytes: in-phase then quadrature
pub const BYTES_PER_SAMPLE: usize = 2;

/// A byte-stream source of interleaved IQ samples
///
/// Implementations may return fewer bytes than requested from [`SampleSource::peek`]; callers
/// must loop until they have collected as many samples as they need. A failed `peek` or `seek`
/// is treated as fatal by callers (see `sofi::worker`): there is no retry.
pub trait SampleSource {
    /// Returns up to `max_bytes` bytes without consuming them
    ///
    /// Returns a non-empty slice on success. Implementations should return as many bytes as are
    /// immediately available, up to `max_bytes`, rather than waiting to fill the whole request.
    fn peek(&mut self, max_bytes: usize) -> io::Result<&[u8]>;

    /// Confirms that all bytes returned by the most recent `peek` call have been consumed
    ///
    /// Calling this without a preceding `peek` is a no-op.
    fn commit(&mut self) -> io::Result<()>;

    /// Advances the read cursor forward by `delta_samples` samples, discarding them
    fn seek(&mut self, delta_samples: i64) -> io::Result<()>;
}

// Blanket impl so `Box<dyn SampleSource>` (used to erase the concrete source type in
// `sofi::pipeline`) composes naturally, the way `sparsdr_sample_parser::Parser` does for
// `Box<P>`.
impl<S> SampleSource for Box<S>
where
    S: SampleSource + ?Sized,
{
    fn peek(&mut self, max_bytes: usize) -> io::Result<&[u8]> {
        (**self).peek(max_bytes)
    }

    fn commit(&mut self) -> io::Result<()> {
        (**self).commit()
    }

    fn seek(&mut self, delta_samples: i64) -> io::Result<()> {
        (**self).seek(delta_samples)
    }
}

/// Reads exactly `count` complex samples from `source`, converting IQ byte pairs as they arrive
///
/// This is the loop spec.md §4.1 requires of callers: `peek` may return short, so collection
/// continues until `count` samples have been gathered.
pub fn read_samples(
    source: &mut dyn SampleSource,
    count: usize,
    out: &mut Vec<num_complex::Complex32>,
) -> io::Result<()> {
    out.clear();
    while out.len() < count {
        let need_bytes = (count - out.len()) * BYTES_PER_SAMPLE;
        let bytes = source.peek(need_bytes)?;
        if bytes.is_empty() {
            // No data available right now; let the caller decide whether to retry or fail.
            continue;
        }
        let usable_bytes = bytes.len() - (bytes.len() % BYTES_PER_SAMPLE);
        for pair in bytes[..usable_bytes].chunks_exact(BYTES_PER_SAMPLE) {
            out.push(num_complex::Complex32::new(
                byte_to_float(pair[0]),
                byte_to_float(pair[1]),
            ));
        }
        source.commit()?;
    }
    Ok(())
}

#[inline]
fn byte_to_float(byte: u8) -> f32 {
    (f32::from(byte) - 127.5) / 127.5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_samples_from_synthetic_source() {
        let mut source = SyntheticSampleSource::from_complex(vec![
            num_complex::Complex32::new(1.0, 0.0),
            num_complex::Complex32::new(0.0, 1.0),
        ]);
        let mut out = Vec::new();
        read_samples(&mut source, 2, &mut out).unwrap();
        assert_eq!(out.len(), 2);
        assert!((out[0].re - 1.0).abs() < 0.02);
        assert!((out[1].im - 1.0).abs() < 0.02);
    }
}
