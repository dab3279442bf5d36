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
//! Configuration from command-line arguments
//!

use std::error::Error;
use std::ffi::OsStr;
use std::fs;
use std::str::FromStr;

use clap::{crate_authors, crate_name, crate_version, App, Arg, ArgMatches};

use crate::{Config, PipelineSettings, Source, UserInterface};

const ABOUT: &str = "This program reads interleaved IQ samples from two or more receivers, \
aligns their sample clocks, and emits a combined power spectrum plus one phase-difference \
spectrum per receiver pair, usable as a per-frequency direction-of-arrival estimate. Command-line \
arguments cover the common case of file-backed sources with default tunables; a configuration \
file is required for anything more elaborate (simulated receivers, per-source options).";

/// Reads command-line options and either reads a configuration from a file or builds a
/// configuration from the command-line options
///
/// Causes the process to exit if a command-line argument is invalid, or if `--help` or
/// `--version` is passed.
pub fn config_from_command_line() -> Result<Config, Box<dyn Error>> {
    let matches = build_app().get_matches();

    if let Some(config_path) = matches.value_of_os("config_file") {
        read_config_file(config_path)
    } else {
        Ok(config_from_matches(&matches))
    }
}

fn build_app() -> App<'static, 'static> {
    App::new(crate_name!())
        .version(crate_version!())
        .about(ABOUT)
        .author(crate_authors!())
        .arg(
            Arg::with_name("config_file")
                .long("config-file")
                .short("c")
                .takes_value(true)
                .value_name("path")
                .help(
                    "The path to a TOML configuration file. If this option is used, no other \
                     command-line arguments are permitted.",
                )
                .conflicts_with_all(&[
                    "source",
                    "fft_size",
                    "ring_depth",
                    "decimation",
                    "log_level",
                    "debug_output",
                ]),
        )
        .arg(
            Arg::with_name("source")
                .long("source")
                .takes_value(true)
                .value_name("path")
                .multiple(true)
                .min_values(2)
                .required_unless("config_file")
                .help("A file (or named pipe) to read one receiver's IQ samples from; at least two required"),
        )
        .arg(
            Arg::with_name("fft_size")
                .long("fft-size")
                .short("n")
                .takes_value(true)
                .default_value("1024")
                .validator(validate::<usize>)
                .help("The FFT length N, a power of two"),
        )
        .arg(
            Arg::with_name("ring_depth")
                .long("ring-depth")
                .short("b")
                .takes_value(true)
                .default_value("8")
                .validator(validate::<usize>)
                .help("The per-worker frame ring depth B"),
        )
        .arg(
            Arg::with_name("decimation")
                .long("decimation")
                .short("d")
                .takes_value(true)
                .default_value("163")
                .validator(validate::<u64>)
                .help("The combiner decimation factor D"),
        )
        .arg(
            Arg::with_name("log_level")
                .long("log-level")
                .takes_value(true)
                .default_value("WARN")
                .possible_values(&["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
                .help("The level of logging to enable"),
        )
        .arg(
            Arg::with_name("debug_output")
                .long("debug-output")
                .takes_value(true)
                .value_name("path")
                .help("A file to write the optional fftshifted debug dump to"),
        )
}

fn read_config_file(path: &OsStr) -> Result<Config, Box<dyn Error>> {
    let file_bytes = fs::read(path)?;
    let config = toml::from_slice(&file_bytes)?;
    Ok(config)
}

fn config_from_matches(matches: &ArgMatches) -> Config {
    Config {
        sources: sources_from_matches(matches),
        pipeline: pipeline_from_matches(matches),
        ui: ui_from_matches(matches),
        debug_output: matches.value_of_os("debug_output").map(Into::into),
    }
}

fn sources_from_matches(matches: &ArgMatches) -> Vec<Source> {
    matches
        .values_of_os("source")
        .expect("required_unless config_file guarantees this is present")
        .map(|path| Source::File { path: path.into() })
        .collect()
}

fn pipeline_from_matches(matches: &ArgMatches) -> PipelineSettings {
    PipelineSettings {
        fft_size: matches.value_of("fft_size").unwrap().parse().unwrap(),
        ring_depth: matches.value_of("ring_depth").unwrap().parse().unwrap(),
        decimation: matches.value_of("decimation").unwrap().parse().unwrap(),
    }
}

fn ui_from_matches(matches: &ArgMatches) -> UserInterface {
    UserInterface {
        // This can't panic because the argument is required and has restricted values.
        log_level: matches.value_of("log_level").unwrap().parse().unwrap(),
    }
}

/// Validates that a string can be parsed into a value of type T
#[allow(clippy::needless_pass_by_value)]
fn validate<T>(s: String) -> Result<(), String>
where
    T: FromStr,
    T::Err: ToString,
{
    s.parse::<T>().map(|_| ()).map_err(|e| e.to_string())
}
