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
//! Real-time cross-correlation interferometer core for multi-receiver SDR setups.
//!
//! One [`worker::Worker`] per receiver pulls IQ samples from a
//! [`sofi_sample_source::SampleSource`], windows and transforms them into frequency-domain
//! frames, and publishes them into a bounded [`ring::Ring`]. A [`sync::Synchronizer`] aligns the
//! receivers' sample clocks once at startup; a [`combiner::Combiner`] then accumulates each
//! receiver pair's cross-spectrum and emits a decimated magnitude/phase output. [`pipeline::Pipeline`]
//! wires all of this together behind the crate's Core API.
//!

#![warn(
    bad_style,
    const_err,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    unused_allocation,
    unused_comparisons,
    unused_parens,
    while_true,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    future_incompatible,
    nonstandard_style,
    rust_2018_compatibility,
    rust_2018_idioms
)]
#![warn(clippy::all)]

mod combiner;
mod error;
mod fft;
mod frame;
pub mod output;
mod pipeline;
mod ring;
mod sample;
mod sync;
mod worker;

pub use crate::combiner::{enumerate_pairs, Combiner, Pair};
pub use crate::error::{Error, Result};
pub use crate::pipeline::{BoxedSource, Pipeline};
pub use crate::ring::FrameHandle;
pub use crate::sample::hamming;
pub use crate::sync::{SyncReport, Synchronizer};
pub use crate::worker::{SharedWorker, Worker};
