//! Benchmarks for pan and crossfade gain laws.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use orpheus_dsp::dsp::mix::{dry_wet_gains, equal_power_gains};

use crate::BLOCK_SIZES;

pub fn bench_mix(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/mix");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.1).sin()).collect();
        let mut left = vec![0.0f32; size];
        let mut right = vec![0.0f32; size];

        // Pan swept per sample: worst case for the trig in the pan law
        group.bench_with_input(BenchmarkId::new("pan_sweep", size), &size, |b, _| {
            b.iter(|| {
                for (i, &sample) in input.iter().enumerate() {
                    let pan = (i as f32 / size as f32) * 2.0 - 1.0;
                    let (l, r) = equal_power_gains(black_box(pan));
                    left[i] = sample * l;
                    right[i] = sample * r;
                }
                black_box((&left, &right));
            })
        });

        group.bench_with_input(BenchmarkId::new("dry_wet", size), &size, |b, _| {
            b.iter(|| {
                let (dry, wet) = dry_wet_gains(black_box(0.3));
                for ((out, &clean), &effected) in left.iter_mut().zip(&input).zip(&right) {
                    *out = clean * dry + effected * wet;
                }
                black_box(&left);
            })
        });
    }

    group.finish();
}
