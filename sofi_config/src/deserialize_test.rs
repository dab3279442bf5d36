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

use super::*;

fn check_deserialize(toml: &str, expected: &Config) -> Result<(), toml::de::Error> {
    let parsed: Config = toml::from_str(toml)?;
    assert_eq!(&parsed, expected);
    Ok(())
}

#[test]
fn deserialize_fail_empty() {
    let status = toml::from_str::<Config>("");
    status.expect_err("an empty configuration is not valid");
}

#[test]
fn deserialize_fail_single_source() {
    let status = toml::from_str::<Config>(
        r"
[[sources]]
type = 'file'
path = '/a.iq'
",
    );
    status.expect_err("a single receiver source is not valid");
}

#[test]
fn deserialize_minimum_two_files() -> Result<(), toml::de::Error> {
    check_deserialize(
        r"
[[sources]]
type = 'file'
path = '/a.iq'
[[sources]]
type = 'file'
path = '/b.iq'
",
        &Config {
            sources: vec![
                Source::File { path: PathBuf::from("/a.iq") },
                Source::File { path: PathBuf::from("/b.iq") },
            ],
            pipeline: PipelineSettings::default(),
            ui: UserInterface::default(),
            debug_output: None,
        },
    )
}

#[test]
fn deserialize_simulated_sources() -> Result<(), toml::de::Error> {
    check_deserialize(
        r"
[[sources]]
type = 'simulate'
[[sources]]
type = 'simulate'
delay_samples = 2
",
        &Config {
            sources: vec![
                Source::Simulate { delay_samples: 0 },
                Source::Simulate { delay_samples: 2 },
            ],
            pipeline: PipelineSettings::default(),
            ui: UserInterface::default(),
            debug_output: None,
        },
    )
}

#[test]
fn deserialize_custom_pipeline_tunables() -> Result<(), toml::de::Error> {
    check_deserialize(
        r"
[[sources]]
type = 'file'
path = '/a.iq'
[[sources]]
type = 'file'
path = '/b.iq'

[pipeline]
fft_size = 2048
ring_depth = 16
decimation = 32
",
        &Config {
            sources: vec![
                Source::File { path: PathBuf::from("/a.iq") },
                Source::File { path: PathBuf::from("/b.iq") },
            ],
            pipeline: PipelineSettings {
                fft_size: 2048,
                ring_depth: 16,
                decimation: 32,
            },
            ui: UserInterface::default(),
            debug_output: None,
        },
    )
}

#[test]
fn deserialize_log_levels() -> Result<(), toml::de::Error> {
    fn check_log_level(name: &str, expected: LevelFilter) -> Result<(), toml::de::Error> {
        check_deserialize(
            &format!(
                r"
[[sources]]
type = 'file'
path = '/a.iq'
[[sources]]
type = 'file'
path = '/b.iq'

[ui]
log_level = '{}'
",
                name
            ),
            &Config {
                sources: vec![
                    Source::File { path: PathBuf::from("/a.iq") },
                    Source::File { path: PathBuf::from("/b.iq") },
                ],
                pipeline: PipelineSettings::default(),
                ui: UserInterface { log_level: expected },
                debug_output: None,
            },
        )
    }

    check_log_level("off", LevelFilter::Off)?;
    check_log_level("error", LevelFilter::Error)?;
    check_log_level("warn", LevelFilter::Warn)?;
    check_log_level("info", LevelFilter::Info)?;
    check_log_level("debug", LevelFilter::Debug)?;
    check_log_level("trace", LevelFilter::Trace)?;
    Ok(())
}

#[test]
fn deserialize_debug_output_path() -> Result<(), toml::de::Error> {
    check_deserialize(
        r"
[[sources]]
type = 'file'
path = '/a.iq'
[[sources]]
type = 'file'
path = '/b.iq'

debug_output = '/tmp/sofi_debug.bin'
",
        &Config {
            sources: vec![
                Source::File { path: PathBuf::from("/a.iq") },
                Source::File { path: PathBuf::from("/b.iq") },
            ],
            pipeline: PipelineSettings::default(),
            ui: UserInterface::default(),
            debug_output: Some(PathBuf::from("/tmp/sofi_debug.bin")),
        },
    )
}
