//! Benchmarks for the phase accumulator and waveform shapes.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use orpheus_dsp::dsp::oscillator::{OscillatorWaveform, PhaseAccumulator};

use crate::BLOCK_SIZES;

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");
    let waveforms = [
        ("sine", OscillatorWaveform::Sine),
        ("square", OscillatorWaveform::Square),
        ("triangle", OscillatorWaveform::Triangle),
    ];

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        for (name, waveform) in waveforms {
            let mut phase = PhaseAccumulator::new();
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    for sample in buffer.iter_mut() {
                        *sample = waveform.shape(phase.next(black_box(440.0), 48_000.0));
                    }
                    black_box(&buffer);
                })
            });
        }
    }

    group.finish();
}
