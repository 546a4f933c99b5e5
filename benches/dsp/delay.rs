//! Benchmarks for delay line operations.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use orpheus_dsp::dsp::delay::DelayLine;

use crate::BLOCK_SIZES;

pub fn bench_delay(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/delay");

    // Delay times in samples
    let delay_times: &[f32] = &[
        480.0,   // 10ms at 48kHz
        4800.0,  // 100ms at 48kHz
        48000.0, // 1 second at 48kHz
    ];

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.1).sin()).collect();
        let mut buffer = vec![0.0f32; size];

        for &delay_samples in delay_times {
            let delay_ms = delay_samples / 48.0;
            let mut delay = DelayLine::new(96_000);
            group.bench_with_input(
                BenchmarkId::new(format!("process_{}ms", delay_ms as u32), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        for (out, &sample) in buffer.iter_mut().zip(&input) {
                            *out = delay.process(sample, black_box(delay_samples));
                        }
                        black_box(&buffer);
                    })
                },
            );
        }

        // Modulated read, as the delay plugin's LFO drives it
        let mut delay = DelayLine::new(96_000);
        for &sample in &input {
            delay.write(sample);
        }
        group.bench_with_input(BenchmarkId::new("read_modulated", size), &size, |b, _| {
            b.iter(|| {
                let mut sum = 0.0f32;
                for i in 0..size {
                    let delay_time = 16_800.0 + (i as f32 * 0.01).sin() * 4_200.0;
                    sum += delay.read_interpolated(black_box(delay_time));
                }
                sum
            })
        });
    }

    group.finish();
}
