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

//! An in-memory [`SampleSource`] used by tests and by the CLI's `--simulate` mode, standing in
//! for a real SDR device node the way `original_source/backend/sdr_simulation.c` stands in for
//! `sdr.c`'s V4L2 device access.

use std::io;

use num_complex::Complex32;

use crate::{SampleSource, BYTES_PER_SAMPLE};

/// A Sample Source backed by an in-memory byte buffer
///
/// When the buffer is exhausted, `peek` returns an empty slice (as a real device would when no
/// new data has arrived) instead of erroring; set [`SyntheticSampleSource::set_repeat`] to wrap
/// around instead, which is convenient for exercising the Combiner's steady state.
pub struct SyntheticSampleSource {
    bytes: Vec<u8>,
    position: usize,
    /// Bytes returned by the most recent `peek`, not yet confirmed by `commit`
    peeked_len: usize,
    repeat: bool,
}

impl SyntheticSampleSource {
    /// Builds a source directly from interleaved IQ bytes
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        SyntheticSampleSource {
            bytes,
            position: 0,
            peeked_len: 0,
            repeat: false,
        }
    }

    /// Builds a source by converting complex samples back into IQ byte pairs
    ///
    /// This inverts `(byte - 127.5) / 127.5`, rounding to the nearest representable byte, so
    /// round-tripping through a `SyntheticSampleSource` and `crate::read_samples`'s own
    /// byte-to-complex conversion recovers the original samples to within the granularity of a
    /// `u8`.
    pub fn from_complex(samples: Vec<Complex32>) -> Self {
        let mut bytes = Vec::with_capacity(samples.len() * BYTES_PER_SAMPLE);
        for sample in samples {
            bytes.push(float_to_byte(sample.re));
            bytes.push(float_to_byte(sample.im));
        }
        SyntheticSampleSource::from_bytes(bytes)
    }

    /// If `true`, exhausting the buffer wraps the read cursor back to the start instead of
    /// returning no data
    pub fn set_repeat(&mut self, repeat: bool) {
        self.repeat = repeat;
    }

    /// Builds a repeating, multi-tone synthetic receiver with a given sample delay applied up
    /// front, standing in for a receiver antenna when no hardware is attached
    ///
    /// The waveform is the same for every call (three tones summed at fixed bin fractions of a
    /// 4096-sample period), so two `simulate` sources differing only in `delay_samples` behave
    /// like two antennas observing one real signal with a fixed lag between them — enough for
    /// `crate::sync`/the Combiner to exercise their alignment and combination logic without a
    /// receiver attached.
    pub fn simulate(delay_samples: i64) -> Self {
        const PERIOD: usize = 4096;
        let samples: Vec<Complex32> = (0..PERIOD)
            .map(|i| {
                let t = i as f32 / PERIOD as f32;
                let tone = |cycles: f32, phase: f32| {
                    let angle = 2.0 * std::f32::consts::PI * cycles * t + phase;
                    Complex32::new(angle.cos(), angle.sin())
                };
                (tone(3.0, 0.0) + tone(11.0, 1.0) + tone(29.0, 2.5)) * (1.0 / 3.0)
            })
            .collect();
        let mut source = SyntheticSampleSource::from_complex(samples);
        source.set_repeat(true);
        if delay_samples != 0 {
            let _ = source.seek(delay_samples);
        }
        source
    }
}

fn float_to_byte(value: f32) -> u8 {
    let scaled = (value * 127.5 + 127.5).round();
    scaled.clamp(0.0, 255.0) as u8
}

impl SampleSource for SyntheticSampleSource {
    fn peek(&mut self, max_bytes: usize) -> io::Result<&[u8]> {
        if self.peeked_len == 0 {
            if self.position >= self.bytes.len() {
                if self.repeat && !self.bytes.is_empty() {
                    self.position = 0;
                } else {
                    return Ok(&[]);
                }
            }
            let end = (self.position + max_bytes).min(self.bytes.len());
            self.peeked_len = end - self.position;
        }
        Ok(&self.bytes[self.position..self.position + self.peeked_len])
    }

    fn commit(&mut self) -> io::Result<()> {
        self.position += self.peeked_len;
        self.peeked_len = 0;
        Ok(())
    }

    fn seek(&mut self, delta_samples: i64) -> io::Result<()> {
        self.peeked_len = 0;
        let delta_bytes = delta_samples * BYTES_PER_SAMPLE as i64;
        let new_position = self.position as i64 + delta_bytes;
        self.position = new_position.max(0) as usize;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulate_repeats_and_applies_delay() {
        let mut plain = SyntheticSampleSource::simulate(0);
        let mut delayed = SyntheticSampleSource::simulate(5);
        let mut out_plain = Vec::new();
        let mut out_delayed = Vec::new();
        crate::read_samples(&mut plain, 4096 + 5, &mut out_plain).unwrap();
        crate::read_samples(&mut delayed, 4096, &mut out_delayed).unwrap();
        // The delayed source, read from its own start, matches the plain source five samples in
        // (both repeat with the same 4096-sample period).
        for i in 0..4096 {
            assert!((out_plain[5 + i] - out_delayed[i]).norm() < 1e-3);
        }
    }

    #[test]
    fn test_round_trip_complex_samples() {
        let samples = vec![Complex32::new(1.0, -1.0), Complex32::new(0.0, 0.5)];
        let mut source = SyntheticSampleSource::from_complex(samples.clone());
        let bytes = source.peek(4).unwrap().to_vec();
        assert_eq!(bytes.len(), 4);
        let recovered_0 = (f32::from(bytes[0]) - 127.5) / 127.5;
        assert!((recovered_0 - samples[0].re).abs() < 0.02);
    }

    #[test]
    fn test_exhausted_without_repeat_returns_empty() {
        let mut source = SyntheticSampleSource::from_bytes(vec![1, 2]);
        source.seek(1).unwrap();
        let empty: &[u8] = &[];
        assert_eq!(source.peek(8).unwrap(), empty);
    }

    #[test]
    fn test_repeat_wraps_around() {
        let mut source = SyntheticSampleSource::from_bytes(vec![1, 2, 3, 4]);
        source.set_repeat(true);
        source.seek(2).unwrap(); // consume both samples
        let wrapped = source.peek(2).unwrap().to_vec();
        assert_eq!(wrapped, vec![1, 2]);
    }
}
