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

//! This library provides a C interface to the `sofi` core so that non-Rust software can use it

extern crate sofi;
extern crate sofi_sample_source;

use std::ffi::CStr;
use std::fs::File;
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::{ptr, slice};

use sofi::{BoxedSource, Error, Pipeline};
use sofi_sample_source::FileSampleSource;

pub const SOFI_OK: u32 = 0;
pub const SOFI_ERROR_INVALID_ARGUMENT: u32 = 1;
pub const SOFI_ERROR_FATAL: u32 = 2;
/// Returned by `sofi_pipeline_step` when the pipeline has stopped and will never produce another
/// frame
pub const SOFI_STOPPED: u32 = 3;

/// A configured, running pipeline
///
/// This is opaque to non-Rust code.
pub struct Context {
    pipeline: Pipeline,
}

/// Opens `num_sources` file-backed receivers and builds a synchronized, running pipeline
///
/// Arguments:
/// * `context`: A pointer to a pointer to a context. If this function returns `SOFI_OK`, it has
///   initialized the pointed-to value with a valid pointer to a newly allocated context.
/// * `fft_size`: `N`, the FFT length
/// * `ring_depth`: `B`, the per-worker frame ring depth
/// * `decimation`: `D`, the combiner decimation factor
/// * `source_paths`: an array of `num_sources` nul-terminated path strings, one per receiver
/// * `num_sources`: the number of paths `source_paths` points to; must be at least 2
///
/// If this function returns anything other than `SOFI_OK`, no other functions may be called with
/// the same context.
///
/// # Safety
///
/// `context` must be non-null and point to writable memory for a pointer. `source_paths` must be
/// non-null and point to `num_sources` valid, non-null, nul-terminated C strings.
#[no_mangle]
pub unsafe extern "C" fn sofi_pipeline_new(
    context: *mut *mut Context,
    fft_size: usize,
    ring_depth: usize,
    decimation: u64,
    source_paths: *const *const c_char,
    num_sources: usize,
) -> u32 {
    let status = catch_unwind(AssertUnwindSafe(|| {
        if context.is_null() || source_paths.is_null() {
            return SOFI_ERROR_INVALID_ARGUMENT;
        }
        let sources = match open_sources(source_paths, num_sources) {
            Ok(sources) => sources,
            Err(code) => return code,
        };
        match Pipeline::new(fft_size, ring_depth, decimation, sources) {
            Ok(pipeline) => {
                let context_box = Box::new(Context { pipeline });
                ptr::write(context, Box::into_raw(context_box));
                SOFI_OK
            }
            Err(_) => SOFI_ERROR_FATAL,
        }
    }));
    status.unwrap_or(SOFI_ERROR_FATAL)
}

/// Opens every path in `source_paths` as a file-backed receiver source
unsafe fn open_sources(
    source_paths: *const *const c_char,
    num_sources: usize,
) -> Result<Vec<BoxedSource>, u32> {
    if num_sources < 2 {
        return Err(SOFI_ERROR_INVALID_ARGUMENT);
    }
    let path_ptrs = slice::from_raw_parts(source_paths, num_sources);
    let mut sources: Vec<BoxedSource> = Vec::with_capacity(num_sources);
    for &path_ptr in path_ptrs {
        if path_ptr.is_null() {
            return Err(SOFI_ERROR_INVALID_ARGUMENT);
        }
        let path = CStr::from_ptr(path_ptr)
            .to_str()
            .map_err(|_| SOFI_ERROR_INVALID_ARGUMENT)?;
        let file = File::open(path).map_err(|_| SOFI_ERROR_FATAL)?;
        sources.push(Box::new(FileSampleSource::new(file)));
    }
    Ok(sources)
}

/// Returns the number of receiver pairs `E = R(R-1)/2`
///
/// # Safety
///
/// `context` must be a valid, non-null pointer returned by `sofi_pipeline_new` and not yet passed
/// to `sofi_pipeline_destroy`.
#[no_mangle]
pub unsafe extern "C" fn sofi_pipeline_pair_count(context: *const Context) -> usize {
    (*context).pipeline.pair_count()
}

/// Blocks until one output frame is ready and writes it into `out_mag`/`out_phase`
///
/// `out_mag` must point to `fft_size` writable floats. `out_phase` must point to
/// `sofi_pipeline_pair_count(context) * fft_size` writable floats, one pair's phase spectrum after
/// another, in the pair order `(0,1),(0,2),...,(1,2),...`.
///
/// Returns `SOFI_OK` once a frame has been written, `SOFI_STOPPED` if the pipeline has stopped,
/// or `SOFI_ERROR_FATAL` on an unexpected failure.
///
/// # Safety
///
/// `context` must be a valid, non-null pointer returned by `sofi_pipeline_new`. `out_mag` and
/// `out_phase` must point to writable memory of at least the sizes described above.
#[no_mangle]
pub unsafe extern "C" fn sofi_pipeline_step(
    context: *mut Context,
    out_mag: *mut f32,
    out_phase: *mut f32,
) -> u32 {
    let status = catch_unwind(AssertUnwindSafe(|| {
        let context = &mut *context;
        let pair_count = context.pipeline.pair_count();
        let n = context.pipeline.fft_size();
        let mag_slice = slice::from_raw_parts_mut(out_mag, n);
        let mut phases: Vec<Vec<f32>> = Vec::new();
        match context.pipeline.step(mag_slice, &mut phases) {
            Ok(true) => {
                let phase_slice = slice::from_raw_parts_mut(out_phase, pair_count * n);
                for (p, phase) in phases.iter().enumerate() {
                    phase_slice[p * n..(p + 1) * n].copy_from_slice(phase);
                }
                SOFI_OK
            }
            Err(Error::Stopped) => SOFI_STOPPED,
            Ok(false) | Err(_) => SOFI_ERROR_FATAL,
        }
    }));
    status.unwrap_or(SOFI_ERROR_FATAL)
}

/// Stops every worker, joins its producer thread, and frees the context
///
/// # Safety
///
/// `context` must be a valid, non-null pointer returned by `sofi_pipeline_new`, not previously
/// passed to this function.
#[no_mangle]
pub unsafe extern "C" fn sofi_pipeline_destroy(context: *mut Context) -> u32 {
    let status = catch_unwind(AssertUnwindSafe(|| {
        let context_box = Box::from_raw(context);
        match context_box.pipeline.destroy() {
            Ok(()) => SOFI_OK,
            Err(_) => SOFI_ERROR_FATAL,
        }
    }));
    status.unwrap_or(SOFI_ERROR_FATAL)
}
