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

//! Cross-correlation-based time alignment of receivers against receiver 0
//!
//! Grounded on `original_source/synchronize.c`'s conjugate-product / inverse-FFT / peak-search
//! shape, with the sign convention spec.md §4.3 states explicitly (the opposite of the C
//! source's): left half of the inverse transform is negative (leading) lag, right half is
//! positive (trailing) lag.

use num_complex::Complex32;

use crate::error::{Error, Result};
use crate::fft::InverseFft;
use crate::worker::Worker;

/// A candidate lag and the correlation magnitude that produced it
#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate {
    lag: i64,
    magnitude: f32,
}

impl Candidate {
    /// Picks the larger-magnitude candidate; ties broken by smaller absolute lag, then by sign
    /// `+` (spec.md §4.3)
    fn better(self, other: Candidate) -> Candidate {
        if self.magnitude != other.magnitude {
            return if self.magnitude > other.magnitude { self } else { other };
        }
        if self.lag.abs() != other.lag.abs() {
            return if self.lag.abs() < other.lag.abs() { self } else { other };
        }
        if self.lag >= 0 {
            self
        } else {
            other
        }
    }
}

/// The result of one [`Synchronizer::iterate`] call
#[derive(Debug, Clone)]
pub struct SyncReport {
    /// Per-receiver shift relative to the slowest receiver (`shifts[0] == 0` always)
    pub shifts: Vec<i64>,
    /// True once every shift is zero, for `t >= 1`
    pub synced: bool,
}

/// One-shot routine that drives all receivers' sample lags relative to receiver 0 to zero
///
/// Owns no state across calls beyond its scratch buffers (spec.md §3: "the synchronizer's
/// buffers are created and destroyed in a single `sync()` call").
pub struct Synchronizer {
    inverse: InverseFft,
    fft_size: usize,
    /// Window used at analysis time, for the `|y_k[i]|² / w[i]` de-bias (spec.md §4.3). `None`
    /// disables the de-bias (equivalent to a rectangular window of all ones).
    window: Option<Vec<f32>>,
}

impl Synchronizer {
    /// Creates a synchronizer for FFT frames of the given length
    pub fn new(fft_size: usize, window: Option<Vec<f32>>) -> Self {
        Synchronizer {
            inverse: InverseFft::new(fft_size),
            fft_size,
            window,
        }
    }

    /// Runs one iteration: fetches frame `t` from every worker, estimates each receiver's lag
    /// relative to receiver 0, queues the seeks (except at `t == 0`), and reports whether every
    /// receiver is now aligned
    ///
    /// Nonzero shifts are queued on the matching `Worker` via [`Worker::request_seek`], but only
    /// for `t >= 1` (spec.md §4.3 discards `t == 0` shifts because the sample rate may still be
    /// settling during the first captured frame). The returned [`SyncReport`] always carries the
    /// computed per-receiver shifts, including at `t == 0`, so callers can log or test them even
    /// though they are not acted on.
    pub fn iterate<W: std::borrow::Borrow<Worker>>(&mut self, t: u64, workers: &[W]) -> Result<SyncReport> {
        if workers.len() < 2 {
            return Err(Error::InvalidArgument("synchronizer requires at least 2 receivers".into()));
        }

        let handles: Vec<_> = workers
            .iter()
            .map(|w| w.borrow().get_frame(t).ok_or(Error::Stopped))
            .collect::<Result<Vec<_>>>()?;

        let reference = handles[0].output().to_vec();
        let mut lags = vec![0i64; workers.len()];
        for k in 1..workers.len() {
            lags[k] = self.estimate_lag(&reference, handles[k].output());
        }

        let min_lag = lags.iter().copied().min().unwrap_or(0);
        let shifts: Vec<i64> = lags.iter().map(|&l| l - min_lag).collect();

        // Only release frames after seeks have been queued, so the producer cannot race into
        // newly skipped bytes (spec.md §4.3).
        if t >= 1 {
            for (k, &shift) in shifts.iter().enumerate() {
                if shift != 0 {
                    workers[k].borrow().request_seek(shift);
                }
            }
        }
        drop(handles);

        let synced = t >= 1 && shifts.iter().all(|&s| s == 0);
        if synced {
            log::info!("receiver offset calibration: all {} receivers aligned at t={}", workers.len(), t);
        } else {
            log::info!("receiver offset calibration: shifts={:?} at t={}", shifts, t);
        }
        Ok(SyncReport { shifts, synced })
    }

    /// Estimates the signed lag of `target` relative to `reference`, per spec.md §4.3
    fn estimate_lag(&mut self, reference: &[Complex32], target: &[Complex32]) -> i64 {
        let n = self.fft_size;
        let mut product: Vec<Complex32> = (0..n).map(|i| reference[i] * target[i].conj()).collect();
        let mut time = vec![Complex32::new(0.0, 0.0); n];
        self.inverse.process(&mut product, &mut time);

        let half = n / 2;
        let mut best: Option<Candidate> = None;
        for i in 0..n {
            let power = time[i].norm_sqr();
            let debiased = match &self.window {
                Some(w) if w[i] > 0.0 => power / w[i],
                Some(_) => continue,
                None => power,
            };
            let lag = if i < half { -(i as i64) } else { (n - i) as i64 };
            let candidate = Candidate {
                lag,
                magnitude: debiased,
            };
            best = Some(match best {
                Some(current) => current.better(candidate),
                None => candidate,
            });
        }
        best.map(|c| c.lag).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sofi_sample_source::SyntheticSampleSource;

    /// A single-period impulse source that wraps around indefinitely, so a test can run the
    /// producer arbitrarily far ahead of the synchronizer (including the extra samples a seek
    /// consumes) without running out of data.
    fn impulse_source(n: usize, delay: usize) -> SyntheticSampleSource {
        let mut samples = vec![Complex32::new(0.0, 0.0); n];
        samples[delay % n] = Complex32::new(1.0, 0.0);
        let mut source = SyntheticSampleSource::from_complex(samples);
        source.set_repeat(true);
        source
    }

    #[test]
    fn test_scenario_1_two_sample_delay_reports_lag_2() {
        // spec.md §8 scenario 1: N=8, R=2, D=1. Receiver 0: impulse at 0; receiver 1: impulse at
        // 2. First iteration must report s_1 = 2; after the seek is applied, a later iteration
        // must report 0.
        let workers = [Worker::new(4, 8, 1, None).unwrap(), Worker::new(4, 8, 1, None).unwrap()];
        let source0 = impulse_source(8, 0);
        let source1 = impulse_source(8, 2);

        crossbeam_utils::thread::scope(|scope| {
            scope.spawn(|_| {
                let _ = workers[0].run(source0);
            });
            scope.spawn(|_| {
                let _ = workers[1].run(source1);
            });

            let mut sync = Synchronizer::new(8, None);
            let mut reported = vec![];
            let mut t = 0;
            loop {
                let report = sync.iterate(t, &workers).unwrap();
                reported.push(report.shifts[1]);
                t += 1;
                if report.synced || t > 6 {
                    break;
                }
            }
            assert_eq!(reported[0], 2);
            assert_eq!(*reported.last().unwrap(), 0);
            workers[0].stop();
            workers[1].stop();
        })
        .unwrap();
    }

    #[test]
    fn test_candidate_better_prefers_larger_magnitude() {
        let a = Candidate { lag: -1, magnitude: 2.0 };
        let b = Candidate { lag: 3, magnitude: 1.0 };
        assert_eq!(a.better(b), a);
    }

    #[test]
    fn test_candidate_better_tie_prefers_smaller_abs_lag() {
        let a = Candidate { lag: -2, magnitude: 1.0 };
        let b = Candidate { lag: 1, magnitude: 1.0 };
        assert_eq!(a.better(b), b);
    }

    #[test]
    fn test_candidate_better_tie_prefers_positive_sign() {
        let a = Candidate { lag: -2, magnitude: 1.0 };
        let b = Candidate { lag: 2, magnitude: 1.0 };
        assert_eq!(a.better(b), b);
    }
}
