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

//! The bounded, multi-consumer frame ring at the heart of one FFT Worker
//!
//! `B` slots hold [`crate::frame::Frame`]s. One producer thread fills slots and publishes them;
//! `C` consumers each fetch a published frame by `frame_no`, read it, and release it. A slot is
//! free exactly when its `consumers_remaining` has reached zero, which couples the producer to
//! the slowest consumer: the bound is the backpressure (see spec.md §9, "Bounded ring and
//! backpressure" — do not paper over it with an unbounded queue).
//!
//! Only slot *metadata* (`frame_no`, `consumers_remaining`) is guarded by the ring's mutex. The
//! per-slot buffers are written by the producer while a slot is free and read by consumers while
//! it is published; the metadata transition from `Published(C)` at publish time and to `Free`
//! once the last consumer releases is the release/acquire barrier that makes this safe without
//! locking the buffers themselves on every access.

use std::cell::UnsafeCell;
use std::sync::{Condvar, Mutex};

use crate::frame::Frame;

/// Per-slot metadata, guarded by the ring's mutex
struct SlotMeta {
    /// `None` until this slot has been published at least once
    frame_no: Option<u64>,
    /// Number of consumers that still owe a `release_frame` call for this slot's `frame_no`
    ///
    /// The slot is free iff this is zero.
    consumers_remaining: usize,
}

struct RingState {
    meta: Vec<SlotMeta>,
    /// True once the worker has been asked to stop; wakes every waiter so they observe `None`
    stopped: bool,
}

/// A bounded ring of `B` FFT frame slots shared between one producer and `C` consumers
///
/// `Ring` is `Sync`: the slot buffers are accessed through [`std::cell::UnsafeCell`], and the
/// metadata mutex enforces that the producer only touches a slot while it is free and consumers
/// only touch a slot while it is published, per the protocol above.
pub struct Ring {
    slots: Vec<UnsafeCell<Frame>>,
    state: Mutex<RingState>,
    condvar: Condvar,
    /// Declared consumer count `C`: the number of distinct callers that will call `get_frame`
    /// exactly once per `frame_no`
    consumers: usize,
}

// SAFETY: access to `slots[i]` is serialized by the `Free`/`Published` protocol documented above,
// which `state`'s mutex enforces: a slot is mutated by the producer only while its metadata shows
// `consumers_remaining == 0`, and read by consumers only while it shows `consumers_remaining > 0`
// with a matching `frame_no`. No two threads ever access the same slot in an overlapping way.
unsafe impl Sync for Ring {}

impl Ring {
    /// Creates a ring with `depth` slots (`B`), each holding an FFT frame of length `fft_size`,
    /// declaring `consumers` (`C`) downstream readers per frame.
    ///
    /// # Panics
    ///
    /// Panics if `depth < 2` or `consumers == 0`; both are caller bugs, not runtime conditions
    /// (construction-time argument validation happens one level up, in `crate::worker`, which
    /// turns these into `Error::InvalidArgument`).
    pub fn new(depth: usize, fft_size: usize, consumers: usize) -> Self {
        assert!(depth >= 2, "ring depth must be at least 2");
        assert!(consumers >= 1, "ring must have at least one consumer");
        let slots = (0..depth)
            .map(|_| UnsafeCell::new(Frame::new(fft_size)))
            .collect();
        let meta = (0..depth)
            .map(|_| SlotMeta {
                frame_no: None,
                consumers_remaining: 0,
            })
            .collect();
        Ring {
            slots,
            state: Mutex::new(RingState {
                meta,
                stopped: false,
            }),
            condvar: Condvar::new(),
            consumers,
        }
    }

    /// Number of slots in this ring (`B`)
    pub fn depth(&self) -> usize {
        self.slots.len()
    }

    /// Blocks until a free slot (`consumers_remaining == 0`) is available, or the ring is
    /// stopped, and returns its index
    ///
    /// Returns `None` if the ring was stopped while waiting. Called by the producer only.
    pub fn wait_for_free_slot(&self) -> Option<usize> {
        let mut state = self.state.lock().expect("ring mutex poisoned");
        loop {
            if state.stopped {
                return None;
            }
            if let Some(idx) = state.meta.iter().position(|m| m.consumers_remaining == 0) {
                return Some(idx);
            }
            state = self.condvar.wait(state).expect("ring mutex poisoned");
        }
    }

    /// Returns a mutable reference to the slot's frame
    ///
    /// # Safety
    ///
    /// The caller (the producer) must only call this for a slot index returned by
    /// [`Ring::wait_for_free_slot`] that has not yet been published via [`Ring::publish`].
    #[allow(clippy::mut_from_ref)]
    unsafe fn frame_mut(&self, idx: usize) -> &mut Frame {
        &mut *self.slots[idx].get()
    }

    /// Fills and transforms the slot at `idx` using `fill`, then runs its forward FFT
    ///
    /// Called by the producer, outside the ring lock, between `wait_for_free_slot` and
    /// `publish`.
    pub fn fill_and_transform(&self, idx: usize, fill: impl FnOnce(&mut [num_complex::Complex32])) {
        // SAFETY: idx was just returned by wait_for_free_slot and has not been published yet, so
        // no consumer holds a reference to it.
        let frame = unsafe { self.frame_mut(idx) };
        fill(frame.input_mut());
        frame.transform();
    }

    /// Publishes the slot at `idx` as `frame_no`, charging all `C` consumers, and wakes waiters
    pub fn publish(&self, idx: usize, frame_no: u64) {
        let mut state = self.state.lock().expect("ring mutex poisoned");
        state.meta[idx] = SlotMeta {
            frame_no: Some(frame_no),
            consumers_remaining: self.consumers,
        };
        self.condvar.notify_all();
    }

    /// Blocks until `frame_no` is published, or the ring stops, and returns a handle to it
    ///
    /// The handle keeps this slot's reference charged until it is dropped (which is what
    /// `release_frame` does, see `crate::worker::WorkerHandle::release_frame`).
    pub fn get_frame(&self, frame_no: u64) -> Option<FrameHandle<'_>> {
        let mut state = self.state.lock().expect("ring mutex poisoned");
        loop {
            if let Some(idx) = state
                .meta
                .iter()
                .position(|m| m.consumers_remaining > 0 && m.frame_no == Some(frame_no))
            {
                return Some(FrameHandle {
                    ring: self,
                    slot: idx,
                    frame_no,
                });
            }
            if state.stopped {
                return None;
            }
            state = self.condvar.wait(state).expect("ring mutex poisoned");
        }
    }

    /// Decrements the reference count of the slot currently holding `frame_no` and wakes waiters
    fn release(&self, slot: usize) {
        let mut state = self.state.lock().expect("ring mutex poisoned");
        let meta = &mut state.meta[slot];
        debug_assert!(meta.consumers_remaining > 0, "released an already-free slot");
        meta.consumers_remaining = meta.consumers_remaining.saturating_sub(1);
        self.condvar.notify_all();
    }

    /// Marks this ring as stopped, waking any waiting producer or consumers so they observe
    /// `None`
    pub fn stop(&self) {
        let mut state = self.state.lock().expect("ring mutex poisoned");
        state.stopped = true;
        self.condvar.notify_all();
    }

    /// Returns true if no slot has an outstanding consumer reference
    ///
    /// Used by `destroy` to decide between success and `Error::Busy`.
    pub fn is_quiescent(&self) -> bool {
        let state = self.state.lock().expect("ring mutex poisoned");
        state.meta.iter().all(|m| m.consumers_remaining == 0)
    }
}

/// A reference to one published frame, charged against the ring's consumer count
///
/// Dropping this handle releases the reference (decrements `consumers_remaining` and wakes any
/// producer waiting for a free slot). This is the "index-based handle" design from spec.md §9:
/// no raw pointer into the ring crosses the API boundary.
pub struct FrameHandle<'r> {
    ring: &'r Ring,
    slot: usize,
    frame_no: u64,
}

impl<'r> FrameHandle<'r> {
    /// The `frame_no` this handle refers to
    pub fn frame_no(&self) -> u64 {
        self.frame_no
    }

    /// The frequency-domain output of this frame
    pub fn output(&self) -> &[num_complex::Complex32] {
        // SAFETY: this handle's existence proves consumers_remaining > 0 for this slot, which
        // means the producer cannot be filling it (fill only happens on slots with
        // consumers_remaining == 0). The slot's data is therefore stable for the handle's
        // lifetime.
        unsafe { &*self.ring.slots[self.slot].get() }.output()
    }
}

impl<'r> Drop for FrameHandle<'r> {
    fn drop(&mut self) {
        self.ring.release(self.slot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex32;
    use num_traits::Zero;

    fn fill_impulse(buf: &mut [Complex32]) {
        for sample in buf.iter_mut() {
            *sample = Complex32::zero();
        }
        buf[0] = Complex32::new(1.0, 0.0);
    }

    #[test]
    fn test_publish_then_get_then_release_round_trip() {
        let ring = Ring::new(4, 8, 1);
        let idx = ring.wait_for_free_slot().unwrap();
        ring.fill_and_transform(idx, fill_impulse);
        ring.publish(idx, 0);

        let handle = ring.get_frame(0).unwrap();
        assert_eq!(handle.frame_no(), 0);
        assert_eq!(handle.output().len(), 8);
        drop(handle);

        assert!(ring.is_quiescent());
    }

    #[test]
    fn test_slot_not_free_until_all_consumers_release() {
        let ring = Ring::new(2, 4, 2);
        let idx = ring.wait_for_free_slot().unwrap();
        ring.fill_and_transform(idx, fill_impulse);
        ring.publish(idx, 0);

        let a = ring.get_frame(0).unwrap();
        let b = ring.get_frame(0).unwrap();
        assert!(!ring.is_quiescent());
        drop(a);
        assert!(!ring.is_quiescent());
        drop(b);
        assert!(ring.is_quiescent());
    }

    #[test]
    fn test_stop_unblocks_waiting_consumer() {
        let ring = Ring::new(2, 4, 1);
        ring.stop();
        assert!(ring.get_frame(0).is_none());
    }

    #[test]
    fn test_frame_numbers_distinct_across_published_slots() {
        let ring = Ring::new(3, 4, 1);
        for frame_no in 0..3 {
            let idx = ring.wait_for_free_slot().unwrap();
            ring.fill_and_transform(idx, fill_impulse);
            ring.publish(idx, frame_no);
            // Immediately consume so the slot frees up for reuse within this test
            drop(ring.get_frame(frame_no).unwrap());
        }
    }
}
