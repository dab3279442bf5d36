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

//! The FFT Worker: one producer thread per receiver, pulling samples from a
//! [`SampleSource`], windowing, transforming, and publishing into a [`Ring`].
//!
//! Mirrors `original_source/backend/fft_thread.c`'s `ft_get_input`/`ft_run_fft` producer loop,
//! run on a scoped thread the way `decompress.rs` runs its stage threads.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use num_complex::Complex32;
use sofi_sample_source::{read_samples, SampleSource};

use crate::error::{Error, Result};
use crate::ring::{FrameHandle, Ring};

/// Shared stop flag, checked by the producer loop at each iteration boundary
struct StopFlag(AtomicBool);

impl StopFlag {
    fn new() -> Self {
        StopFlag(AtomicBool::new(false))
    }

    fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn set(&self) {
        self.0.store(true, Ordering::Release);
    }
}

/// A running FFT Worker: the producer side plus a handle consumers use to fetch frames
///
/// One `Worker` owns one [`Ring`] and is driven by a caller-supplied closure run on a scoped
/// thread (`crate::worker::Worker::run`), matching spec.md §4.2's "one thread per worker" model
/// without this crate owning thread lifetime management itself (that belongs to
/// `crate::pipeline`, which has an overall `crossbeam_utils::thread::scope`).
pub struct Worker {
    ring: Ring,
    stop: StopFlag,
    /// Window applied to every input sample, or `None` for no windowing (spec.md §4.2: "if a
    /// window is configured")
    window: Option<Vec<f32>>,
    fft_size: usize,
    /// Samples the producer must seek its Sample Source by before reading the next frame,
    /// accumulated by `crate::sync::Synchronizer` and drained by the producer loop
    pending_seek: Mutex<i64>,
}

impl Worker {
    /// Creates a worker with a ring of the given depth, FFT length, and declared consumer count
    pub fn new(ring_depth: usize, fft_size: usize, consumers: usize, window: Option<Vec<f32>>) -> Result<Self> {
        if fft_size == 0 {
            return Err(Error::InvalidArgument("FFT size must be nonzero".into()));
        }
        if let Some(w) = &window {
            if w.len() != fft_size {
                return Err(Error::InvalidArgument(format!(
                    "window length {} does not match FFT size {}",
                    w.len(),
                    fft_size
                )));
            }
        }
        Ok(Worker {
            ring: Ring::new(ring_depth, fft_size, consumers),
            stop: StopFlag::new(),
            window,
            fft_size,
            pending_seek: Mutex::new(0),
        })
    }

    /// Queues a forward seek of `delta_samples` samples, to be applied by the producer before it
    /// reads its next frame's worth of input
    ///
    /// Called by `crate::sync::Synchronizer` during the alignment phase. Deltas accumulate if the
    /// producer has not yet drained a previously queued seek.
    pub fn request_seek(&self, delta_samples: i64) {
        let mut pending = self.pending_seek.lock().expect("pending_seek mutex poisoned");
        *pending += delta_samples;
    }

    /// The FFT length this worker was built for
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Runs the producer loop on the calling thread until told to stop or the source fails
    ///
    /// Intended to be called as the body of a thread spawned by `crate::pipeline`, which needs
    /// the Sample Source back afterward (to hand to a fresh `Worker` for the steady-state phase
    /// once the Synchronizer has finished seeking it) — hence `source` is returned on every
    /// non-error exit rather than dropped. Reads exactly `fft_size` samples per frame from
    /// `source`, applies the configured window, transforms, and publishes with a strictly
    /// increasing `frame_no` starting at 0, per spec.md §4.2.
    pub fn run<S: SampleSource>(&self, mut source: S) -> Result<S> {
        let mut samples: Vec<Complex32> = Vec::with_capacity(self.fft_size);
        let mut frame_no: u64 = 0;
        loop {
            if self.stop.is_set() {
                log::debug!("worker stopping at frame {}", frame_no);
                return Ok(source);
            }
            let idx = match self.ring.wait_for_free_slot() {
                Some(idx) => idx,
                None => return Ok(source),
            };
            let seek_delta = {
                let mut pending = self.pending_seek.lock().expect("pending_seek mutex poisoned");
                std::mem::replace(&mut *pending, 0)
            };
            if let Err(e) = read_frame_input(&mut source, seek_delta, self.fft_size, &mut samples) {
                log::error!("worker stopping after source failure at frame {}: {}", frame_no, e);
                self.stop();
                return Err(e);
            }
            let window = &self.window;
            self.ring.fill_and_transform(idx, |input| {
                input.copy_from_slice(&samples);
                if let Some(w) = window {
                    for (dst, weight) in input.iter_mut().zip(w.iter()) {
                        *dst = crate::sample::apply_window(*dst, *weight);
                    }
                }
            });
            self.ring.publish(idx, frame_no);
            frame_no += 1;
        }
    }

    /// Fetches the frame at `frame_no`, blocking until it is published or the worker stops
    pub fn get_frame(&self, frame_no: u64) -> Option<FrameHandle<'_>> {
        self.ring.get_frame(frame_no)
    }

    /// Requests the producer stop at the next iteration boundary and wakes any waiters
    pub fn stop(&self) {
        self.stop.set();
        self.ring.stop();
    }

    /// True if the worker has been asked to stop
    pub fn is_stopped(&self) -> bool {
        self.stop.is_set()
    }

    /// True if no slot has an outstanding consumer reference, i.e. safe to tear down
    pub fn is_quiescent(&self) -> bool {
        self.ring.is_quiescent()
    }

    /// Tears down the worker, failing with [`Error::Busy`] if any frame reference is outstanding
    pub fn destroy(self) -> Result<()> {
        if !self.ring.is_quiescent() {
            return Err(Error::Busy);
        }
        Ok(())
    }
}

/// Applies a pending seek (if any) and reads one frame's worth of samples from `source`
///
/// Factored out of [`Worker::run`] so the producer loop has a single fallible step to guard:
/// either sub-operation failing is fatal to the worker (spec.md §7), and the caller is
/// responsible for stopping the ring before propagating the error.
fn read_frame_input<S: SampleSource>(
    source: &mut S,
    seek_delta: i64,
    fft_size: usize,
    samples: &mut Vec<Complex32>,
) -> Result<()> {
    if seek_delta != 0 {
        source.seek(seek_delta)?;
    }
    read_samples(source, fft_size, samples)?;
    Ok(())
}

/// A shared, thread-safe owner of a [`Worker`], used when the producer thread and the consumer
/// (Synchronizer or Combiner) run concurrently
pub type SharedWorker = Arc<Worker>;
