//! Benchmarks for waveshaping and signal sanitizing.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use orpheus_dsp::dsp::distortion::{flush_non_finite, soft_clip};

use crate::BLOCK_SIZES;

pub fn bench_distortion(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/distortion");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.05).sin()).collect();
        let mut buffer = input.clone();

        group.bench_with_input(BenchmarkId::new("soft_clip", size), &size, |b, _| {
            b.iter(|| {
                for (out, &sample) in buffer.iter_mut().zip(&input) {
                    *out = soft_clip(sample, black_box(8.0));
                }
                black_box(&buffer);
            })
        });

        // Runs after every unit in the engine, so it sets a floor on unit cost
        group.bench_with_input(BenchmarkId::new("flush_non_finite", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                flush_non_finite(black_box(&mut buffer), 1.0e6);
            })
        });
    }

    group.finish();
}
