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
//! This binary runs the sofi interferometer core against file- or pipe-backed receivers (or, with
//! `--simulate`-style configuration, in-process synthetic ones) and writes the resulting
//! magnitude/phase spectra to an optional debug dump file.
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
// Keep extern crates, like in 2015
#![allow(unused_extern_crates)]

extern crate log;
extern crate signal_hook;
extern crate simplelog;
extern crate sofi;
extern crate sofi_config;
extern crate sofi_sample_source;

use std::error::Error;
use std::fs::File;
use std::io::BufWriter;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use signal_hook::{flag::register, SIGHUP, SIGINT};
use simplelog::{Config as LogConfig, SimpleLogger, TermLogger, TerminalMode};

use sofi::output::{write_frame, StdioDebugSink};
use sofi::{BoxedSource, Pipeline};
use sofi_config::Source;
use sofi_sample_source::{FileSampleSource, SyntheticSampleSource};

fn run() -> Result<(), Box<dyn Error>> {
    let config = sofi_config::config_from_command_line()?;
    init_logging(config.ui.log_level);

    let receiver_count = config.sources.len();
    log::info!("opening {} receiver sources", receiver_count);
    let sources = open_sources(&config.sources)?;

    // Notes about signals on Linux: SIGINT or SIGHUP sets the stop flag to true, but does not
    // interrupt any read call already in progress, nor the one-shot synchronization pass.
    let stop_flag = Arc::new(AtomicBool::new(false));
    register(SIGINT, Arc::clone(&stop_flag))?;
    register(SIGHUP, Arc::clone(&stop_flag))?;

    let mut pipeline = Pipeline::new(
        config.pipeline.fft_size,
        config.pipeline.ring_depth,
        config.pipeline.decimation,
        sources,
    )?;
    log::info!(
        "pipeline running: N={} B={} D={} E={}",
        config.pipeline.fft_size,
        config.pipeline.ring_depth,
        config.pipeline.decimation,
        pipeline.pair_count()
    );

    let mut debug_sink = match &config.debug_output {
        Some(path) => {
            let file = File::create(path)?;
            Some(StdioDebugSink::new(BufWriter::new(file)))
        }
        None => None,
    };

    let mut mag = vec![0.0f32; config.pipeline.fft_size];
    let mut phases = Vec::new();
    while !stop_flag.load(Ordering::Relaxed) {
        pipeline.step(&mut mag, &mut phases)?;
        if let Some(sink) = &mut debug_sink {
            write_frame(sink, &mag, &phases).map_err(|e| -> Box<dyn Error> { format!("{}", e).into() })?;
        }
    }

    pipeline.destroy()?;
    Ok(())
}

/// Opens every configured receiver source, preserving `config.sources`'s order so the pair
/// enumeration `(0,1),(0,2),...` lines up with the order receivers were listed in
fn open_sources(sources: &[Source]) -> Result<Vec<BoxedSource>, Box<dyn Error>> {
    sources
        .iter()
        .map(|source| -> Result<BoxedSource, Box<dyn Error>> {
            match source {
                Source::File { path } => {
                    let file = File::open(path)?;
                    Ok(Box::new(FileSampleSource::new(file)))
                }
                Source::Simulate { delay_samples } => {
                    Ok(Box::new(SyntheticSampleSource::simulate(*delay_samples)))
                }
            }
        })
        .collect()
}

fn init_logging(level: log::LevelFilter) {
    let log_status = TermLogger::init(level, LogConfig::default(), TerminalMode::Stderr)
        .or_else(|_| SimpleLogger::init(level, LogConfig::default()));
    if let Err(e) = log_status {
        eprintln!("Failed to set up logging: {}", e);
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{}", e);
        process::exit(1);
    }
}
