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

extern crate criterion;
extern crate sofi;
extern crate sofi_sample_source;

use criterion::{criterion_group, criterion_main, Criterion};

use sofi::{BoxedSource, Pipeline};
use sofi_sample_source::SyntheticSampleSource;

const FFT_SIZE: usize = 1024;
const RING_DEPTH: usize = 8;
const DECIMATION: u64 = 16;

fn three_receiver_sources() -> Vec<BoxedSource> {
    vec![
        Box::new(SyntheticSampleSource::simulate(0)),
        Box::new(SyntheticSampleSource::simulate(3)),
        Box::new(SyntheticSampleSource::simulate(7)),
    ]
}

fn benchmark_pipeline_new(c: &mut Criterion) {
    // Dominated by the one-shot synchronization pass (spec.md §4.3): three simulated receivers,
    // each carrying a small, fixed relative delay that the Synchronizer must discover and seek
    // past before this call returns.
    c.bench_function("macro_pipeline_new_three_receivers", |b| {
        b.iter(|| {
            let pipeline = Pipeline::new(FFT_SIZE, RING_DEPTH, DECIMATION, three_receiver_sources())
                .expect("synchronization and startup should succeed");
            pipeline.destroy().expect("teardown should succeed");
        });
    });
}

fn benchmark_pipeline_steady_state(c: &mut Criterion) {
    // Steady-state throughput: one decimated output frame from three already-aligned receivers.
    let mut pipeline = Pipeline::new(FFT_SIZE, RING_DEPTH, DECIMATION, three_receiver_sources())
        .expect("synchronization and startup should succeed");
    let mut mag = vec![0.0f32; FFT_SIZE];
    let mut phases = Vec::new();
    c.bench_function("macro_pipeline_step_three_receivers", |b| {
        b.iter(|| {
            pipeline
                .step(&mut mag, &mut phases)
                .expect("steady-state step should succeed");
        });
    });
}

criterion_group!(benches, benchmark_pipeline_new, benchmark_pipeline_steady_state);
criterion_main!(benches);
