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

//! The Core API facade: owns the receivers' workers end to end, runs synchronization once at
//! construction, then drives the steady-state Combiner on demand from [`Pipeline::step`].
//!
//! Grounded on spec.md §6's Core API (`pipeline_new`/`pipeline_pair_count`/`pipeline_step`/
//! `pipeline_destroy`) and `sparsdr_reconstruct_c/src/lib.rs`'s `Context` handle pattern
//! (Rust-side, ahead of `sofi_ffi`'s C ABI wrapper).

use std::sync::Arc;
use std::thread::JoinHandle;

use sofi_sample_source::SampleSource;

use crate::combiner::Combiner;
use crate::error::{Error, Result};
use crate::sample::hamming;
use crate::sync::Synchronizer;
use crate::worker::Worker;

/// A Sample Source erased to a trait object so a pipeline's receivers need not share one
/// concrete type
pub type BoxedSource = Box<dyn SampleSource + Send>;

type WorkerThread = JoinHandle<Result<BoxedSource>>;

/// A running signal-processing core, one per set of `R` receivers
///
/// Construction performs the one-shot synchronization pass (spec.md §4.3) before returning, so a
/// successfully constructed `Pipeline` is always in the steady state, ready for [`Pipeline::step`].
/// Each receiver's producer thread is unscoped (`std::thread::spawn`, not
/// `crossbeam_utils::thread::scope`) because it must outlive the call to `Pipeline::new` and run
/// for the pipeline's whole lifetime, across many external `step` calls — a scope cannot do that,
/// since it joins its threads before returning.
pub struct Pipeline {
    workers: Vec<Arc<Worker>>,
    threads: Vec<WorkerThread>,
    combiner: Combiner,
    fft_size: usize,
    next_frame: u64,
}

impl Pipeline {
    /// Opens and aligns `sources.len()` receivers and starts the steady-state combiner
    ///
    /// `fft_size` is `N`, `ring_depth` is `B`, `decimation` is `D`. Runs the Synchronizer to
    /// completion before returning, matching spec.md §6's `pipeline_new` contract ("runs
    /// synchronization, starts workers, constructs the combiner").
    pub fn new(fft_size: usize, ring_depth: usize, decimation: u64, sources: Vec<BoxedSource>) -> Result<Self> {
        let r = sources.len();
        if r < 2 {
            return Err(Error::InvalidArgument("pipeline requires at least 2 receivers".into()));
        }
        let window = hamming(fft_size);

        log::info!("starting synchronization pass for {} receivers", r);
        let (sync_workers, sync_threads) = spawn_generation(fft_size, ring_depth, 1, Some(window.clone()), sources)?;
        let mut synchronizer = Synchronizer::new(fft_size, Some(window.clone()));
        let mut t = 0u64;
        loop {
            let report = synchronizer.iterate(t, &sync_workers)?;
            t += 1;
            if report.synced {
                break;
            }
        }
        for worker in &sync_workers {
            worker.stop();
        }
        let mut recovered_sources = Vec::with_capacity(r);
        for handle in sync_threads {
            recovered_sources.push(join_worker_thread(handle)?);
        }
        drop(sync_workers);

        log::info!("synchronization complete, entering steady state");
        let (workers, threads) = spawn_generation(fft_size, ring_depth, 1, Some(window), recovered_sources)?;
        let combiner = Combiner::new(fft_size, r, decimation)?;

        Ok(Pipeline {
            workers,
            threads,
            combiner,
            fft_size,
            next_frame: 0,
        })
    }

    /// Number of receiver pairs `E = R(R-1)/2`
    pub fn pair_count(&self) -> usize {
        self.combiner.pair_count()
    }

    /// The FFT length `N` this pipeline was built with
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Blocks until one output frame is ready, writing the combined magnitude spectrum into
    /// `out_mag` and each pair's phase spectrum into the matching entry of `out_phase`
    ///
    /// `out_mag.len()` must equal `N` and `out_phase.len()` must equal
    /// [`Pipeline::pair_count`]; each `out_phase` entry is replaced with a length-`N` vector.
    /// Returns `Ok(true)` once an output frame was written; errors (not a bare `false`, unlike
    /// spec.md §6's C-shaped signature) propagate the failure kind, since that's what idiomatic
    /// Rust does with a `Result` return — `sofi_ffi` flattens this back to the boolean contract
    /// at the C ABI boundary.
    pub fn step(&mut self, out_mag: &mut [f32], out_phase: &mut Vec<Vec<f32>>) -> Result<bool> {
        if out_mag.len() != self.fft_size {
            return Err(Error::InvalidArgument("out_mag length must equal the FFT size".into()));
        }
        loop {
            let t = self.next_frame;
            self.next_frame += 1;
            if let Some((mag, phases)) = self.combiner.step(t, &self.workers)? {
                out_mag.copy_from_slice(&mag);
                *out_phase = phases;
                return Ok(true);
            }
        }
    }

    /// Stops every worker, joins its producer thread, and releases the rings
    ///
    /// Matches spec.md §6's `pipeline_destroy`: consumes `self`, so a destroyed pipeline cannot
    /// be stepped again. Fails with [`Error::Busy`] if a worker still has an outstanding frame
    /// reference (should not happen in normal use: `step` always releases its frames before
    /// returning).
    pub fn destroy(self) -> Result<()> {
        for worker in &self.workers {
            worker.stop();
        }
        if !self.workers.iter().all(|w| w.is_quiescent()) {
            return Err(Error::Busy);
        }
        for handle in self.threads {
            join_worker_thread(handle)?;
        }
        Ok(())
    }
}

/// Builds one `Worker` per source sharing `ring_depth`/`consumers`/`window`, and spawns one
/// producer thread per worker
fn spawn_generation(
    fft_size: usize,
    ring_depth: usize,
    consumers: usize,
    window: Option<Vec<f32>>,
    sources: Vec<BoxedSource>,
) -> Result<(Vec<Arc<Worker>>, Vec<WorkerThread>)> {
    let mut workers = Vec::with_capacity(sources.len());
    for _ in 0..sources.len() {
        workers.push(Arc::new(Worker::new(ring_depth, fft_size, consumers, window.clone())?));
    }
    let mut threads = Vec::with_capacity(sources.len());
    for (worker, source) in workers.iter().cloned().zip(sources.into_iter()) {
        threads.push(std::thread::spawn(move || worker.run(source)));
    }
    Ok((workers, threads))
}

fn join_worker_thread(handle: WorkerThread) -> Result<BoxedSource> {
    match handle.join() {
        Ok(result) => result,
        Err(_) => Err(Error::ResourceExhausted("worker thread panicked".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex32;
    use sofi_sample_source::SyntheticSampleSource;

    fn boxed(samples: Vec<Complex32>) -> BoxedSource {
        let mut source = SyntheticSampleSource::from_complex(samples);
        source.set_repeat(true);
        Box::new(source)
    }

    #[test]
    fn test_pair_count_for_four_receivers() {
        let sources: Vec<BoxedSource> = (0..4)
            .map(|_| boxed(vec![Complex32::new(1.0, 0.0); 4]))
            .collect();
        let pipeline = Pipeline::new(4, 4, 1, sources).unwrap();
        assert_eq!(pipeline.pair_count(), 6);
        pipeline.destroy().unwrap();
    }

    #[test]
    fn test_step_produces_decimated_output_for_identical_receivers() {
        let sources: Vec<BoxedSource> = vec![
            boxed(vec![Complex32::new(1.0, 0.0); 4]),
            boxed(vec![Complex32::new(1.0, 0.0); 4]),
        ];
        let mut pipeline = Pipeline::new(4, 4, 2, sources).unwrap();
        let mut mag = vec![0.0f32; 4];
        let mut phase = Vec::new();
        let produced = pipeline.step(&mut mag, &mut phase).unwrap();
        assert!(produced);
        assert_eq!(phase.len(), 1);
        pipeline.destroy().unwrap();
    }

    #[test]
    fn test_new_rejects_fewer_than_two_receivers() {
        let sources: Vec<BoxedSource> = vec![boxed(vec![Complex32::new(1.0, 0.0); 4])];
        assert!(matches!(Pipeline::new(4, 4, 1, sources), Err(Error::InvalidArgument(_))));
    }
}
