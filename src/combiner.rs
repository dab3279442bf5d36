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

//! The steady-state Combiner: pairwise cross-spectrum accumulation and decimated output
//!
//! Grounded on `original_source/backend/combiner.c`/`combiner.h`'s `cb_run`/pair-enumeration
//! shape; the accumulation itself sums complex vectors coherently rather than averaging wrapped
//! phases (spec.md §4.4/§9), replacing the C source's `CB_WEIGHT_OLD` moving average.

use num_complex::Complex32;

use crate::error::{Error, Result};
use crate::worker::Worker;

/// An unordered pair of receiver indices, `a < b`
pub type Pair = (usize, usize);

/// Returns the fixed pair enumeration for `r` receivers: `(a,b)` with `a<b`, lexicographic in
/// `a` then `b` (spec.md §3)
pub fn enumerate_pairs(r: usize) -> Vec<Pair> {
    let mut pairs = Vec::with_capacity(r * r.saturating_sub(1) / 2);
    for a in 0..r {
        for b in (a + 1)..r {
            pairs.push((a, b));
        }
    }
    pairs
}

/// The steady-state consumer: accumulates per-pair cross-spectra over `D` input frames and emits
/// a combined magnitude spectrum plus one phase spectrum per pair every `D`-th frame
pub struct Combiner {
    fft_size: usize,
    decimation: u64,
    pairs: Vec<Pair>,
    /// `accumulators[p]` is the complex cross-spectrum accumulator for `pairs[p]`
    accumulators: Vec<Vec<Complex32>>,
    frames_accumulated: u64,
}

impl Combiner {
    /// Creates a combiner for `r` receivers, FFT length `fft_size`, decimation factor `decimation`
    pub fn new(fft_size: usize, r: usize, decimation: u64) -> Result<Self> {
        if r < 2 {
            return Err(Error::InvalidArgument("combiner requires at least 2 receivers".into()));
        }
        if decimation < 1 {
            return Err(Error::InvalidArgument("decimation factor must be at least 1".into()));
        }
        let pairs = enumerate_pairs(r);
        let accumulators = pairs
            .iter()
            .map(|_| vec![Complex32::new(0.0, 0.0); fft_size])
            .collect();
        Ok(Combiner {
            fft_size,
            decimation,
            pairs,
            accumulators,
            frames_accumulated: 0,
        })
    }

    /// Number of receiver pairs `E = R(R-1)/2`
    pub fn pair_count(&self) -> usize {
        self.pairs.len()
    }

    /// The fixed pair enumeration, `(a,b)` with `a<b`
    pub fn pairs(&self) -> &[Pair] {
        &self.pairs
    }

    /// Consumes one input frame at index `t` from every worker, accumulating each pair's
    /// cross-spectrum
    ///
    /// Returns `Some((mag, phases))` once every `decimation`-th frame has been accumulated, where
    /// `mag` has length `fft_size` and `phases` has one length-`fft_size` vector per pair, in
    /// `self.pairs()` order. Returns `None` on intermediate frames (spec.md §4.4: "emits one
    /// output frame every `D` input frames").
    pub fn step<W: std::borrow::Borrow<Worker>>(
        &mut self,
        t: u64,
        workers: &[W],
    ) -> Result<Option<(Vec<f32>, Vec<Vec<f32>>)>> {
        let handles: Vec<_> = workers
            .iter()
            .map(|w| w.borrow().get_frame(t).ok_or(Error::Stopped))
            .collect::<Result<Vec<_>>>()?;

        for (p, &(a, b)) in self.pairs.iter().enumerate() {
            let spec_a = handles[a].output();
            let spec_b = handles[b].output();
            let accumulator = &mut self.accumulators[p];
            for i in 0..self.fft_size {
                accumulator[i] += spec_a[i] * spec_b[i].conj();
            }
        }
        drop(handles);

        self.frames_accumulated += 1;
        if self.frames_accumulated % self.decimation != 0 {
            return Ok(None);
        }

        let e = self.pairs.len() as f32;
        let scale = 1.0 / (self.decimation as f32 * e);
        let mut mag = vec![0.0f32; self.fft_size];
        let mut phases = Vec::with_capacity(self.pairs.len());
        for accumulator in &mut self.accumulators {
            let mut phase = vec![0.0f32; self.fft_size];
            for i in 0..self.fft_size {
                let a = accumulator[i];
                mag[i] += a.norm_sqr();
                phase[i] = a.im.atan2(a.re);
            }
            phases.push(phase);
            accumulator.iter_mut().for_each(|c| *c = Complex32::new(0.0, 0.0));
        }
        for m in mag.iter_mut() {
            *m *= scale;
        }
        Ok(Some((mag, phases)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sofi_sample_source::SyntheticSampleSource;

    #[test]
    fn test_enumerate_pairs_four_receivers() {
        // spec.md §8 scenario 4
        assert_eq!(
            enumerate_pairs(4),
            vec![(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]
        );
    }

    #[test]
    fn test_scenario_2_identical_receivers_combine() {
        // spec.md §8 scenario 2: N=4, R=2, D=2. Both receivers emit F=[1,0,0,0] every frame.
        // Applying §4.4's algorithm literally: the pair accumulator after D=2 frames is 2+0i at
        // bin 0, so out_mag[0] = |2+0i|^2 / (D*E) = 4/2 = 2 (the worked arithmetic in spec.md's
        // §8 text divides by an extra factor of D and gets 1; that arithmetic does not square
        // with its own §4.4 algorithm text, so the algorithm text is what's implemented here).
        let workers = [Worker::new(4, 4, 1, None).unwrap(), Worker::new(4, 4, 1, None).unwrap()];
        let mut source_a = SyntheticSampleSource::from_complex(vec![Complex32::new(1.0, 0.0); 4]);
        source_a.set_repeat(true);
        let mut source_b = SyntheticSampleSource::from_complex(vec![Complex32::new(1.0, 0.0); 4]);
        source_b.set_repeat(true);

        crossbeam_utils::thread::scope(|scope| {
            scope.spawn(|_| {
                let _ = workers[0].run(source_a);
            });
            scope.spawn(|_| {
                let _ = workers[1].run(source_b);
            });

            let mut combiner = Combiner::new(4, 2, 2).unwrap();
            let mut output = None;
            for t in 0..2u64 {
                output = combiner.step(t, &workers).unwrap();
            }
            let (mag, phases) = output.expect("decimation boundary reached at t=1");
            assert!((mag[0] - 2.0).abs() < 1e-4);
            for &m in &mag[1..] {
                assert!(m.abs() < 1e-6);
            }
            assert_eq!(phases.len(), 1);
            for &p in &phases[0] {
                assert!(p.abs() < 1e-4);
            }
            workers[0].stop();
            workers[1].stop();
        })
        .unwrap();
    }

    #[test]
    fn test_zero_input_does_not_produce_nan() {
        let workers = [Worker::new(2, 4, 1, None).unwrap(), Worker::new(2, 4, 1, None).unwrap()];
        let mut source_a = SyntheticSampleSource::from_complex(vec![Complex32::new(0.0, 0.0); 4]);
        source_a.set_repeat(true);
        let mut source_b = SyntheticSampleSource::from_complex(vec![Complex32::new(0.0, 0.0); 4]);
        source_b.set_repeat(true);

        crossbeam_utils::thread::scope(|scope| {
            scope.spawn(|_| {
                let _ = workers[0].run(source_a);
            });
            scope.spawn(|_| {
                let _ = workers[1].run(source_b);
            });

            let mut combiner = Combiner::new(4, 2, 1).unwrap();
            let (mag, phases) = combiner.step(0, &workers).unwrap().expect("D=1 emits every frame");
            assert!(mag.iter().all(|&m| m == 0.0));
            assert!(phases[0].iter().all(|p| !p.is_nan()));
            workers[0].stop();
            workers[1].stop();
        })
        .unwrap();
    }

    #[test]
    fn test_intermediate_frames_return_none() {
        let workers = [Worker::new(4, 4, 1, None).unwrap(), Worker::new(4, 4, 1, None).unwrap()];
        let mut source_a = SyntheticSampleSource::from_complex(vec![Complex32::new(1.0, 0.0); 4]);
        source_a.set_repeat(true);
        let mut source_b = SyntheticSampleSource::from_complex(vec![Complex32::new(1.0, 0.0); 4]);
        source_b.set_repeat(true);

        crossbeam_utils::thread::scope(|scope| {
            scope.spawn(|_| {
                let _ = workers[0].run(source_a);
            });
            scope.spawn(|_| {
                let _ = workers[1].run(source_b);
            });

            let mut combiner = Combiner::new(4, 2, 3).unwrap();
            assert!(combiner.step(0, &workers).unwrap().is_none());
            assert!(combiner.step(1, &workers).unwrap().is_none());
            assert!(combiner.step(2, &workers).unwrap().is_some());
            workers[0].stop();
            workers[1].stop();
        })
        .unwrap();
    }
}
