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

extern crate clap;
extern crate log;
extern crate serde;
extern crate toml;

mod cli;
mod custom_de;
#[cfg(test)]
mod deserialize_test;

use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use crate::cli::config_from_command_line;

/// A configuration for the sofi interferometer core
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(test, derive(PartialEq))]
pub struct Config {
    /// Where each receiver's IQ samples come from (`R >= 2`)
    #[serde(deserialize_with = "crate::custom_de::deserialize_at_least_two")]
    pub sources: Vec<Source>,
    /// Pipeline tunables (`N`, `B`, `D`)
    #[serde(default)]
    pub pipeline: PipelineSettings,
    /// Application user interface settings
    #[serde(default)]
    pub ui: UserInterface,
    /// Where to write the optional debug dump, if any
    #[serde(default)]
    pub debug_output: Option<PathBuf>,
}

/// One receiver's IQ sample source
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(test, derive(PartialEq))]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Read interleaved IQ bytes from a file or named pipe
    File { path: PathBuf },
    /// Generate a synthetic receiver in-process, for testing without hardware
    Simulate {
        /// Sample delay relative to receiver 0, in samples
        #[serde(default)]
        delay_samples: i64,
    },
}

/// Pipeline tunables: FFT length, ring depth, decimation factor
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(test, derive(PartialEq))]
pub struct PipelineSettings {
    /// FFT length `N`, a power of two
    #[serde(default = "default_fft_size")]
    pub fft_size: usize,
    /// Frame ring depth `B`
    #[serde(default = "default_ring_depth")]
    pub ring_depth: usize,
    /// Combiner decimation factor `D`
    #[serde(default = "default_decimation")]
    pub decimation: u64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        PipelineSettings {
            fft_size: default_fft_size(),
            ring_depth: default_ring_depth(),
            decimation: default_decimation(),
        }
    }
}

fn default_fft_size() -> usize {
    1024
}

fn default_ring_depth() -> usize {
    8
}

fn default_decimation() -> u64 {
    163
}

/// User interface options
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(test, derive(PartialEq))]
pub struct UserInterface {
    /// Minimum log level to print
    #[serde(default = "log_level_warn")]
    pub log_level: LevelFilter,
}

impl Default for UserInterface {
    fn default() -> Self {
        UserInterface {
            log_level: log_level_warn(),
        }
    }
}

fn log_level_warn() -> LevelFilter {
    LevelFilter::Warn
}
