//! Benchmarks for ADSR envelope generation.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use orpheus_dsp::dsp::envelope::Envelope;

use crate::BLOCK_SIZES;

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Held in attack/decay: the branchiest part of the state machine
        let mut env = Envelope::adsr(0.5, 0.3, 0.7, 0.4);
        env.gate_on();
        group.bench_with_input(BenchmarkId::new("attack_decay", size), &size, |b, _| {
            b.iter(|| {
                for sample in buffer.iter_mut() {
                    *sample = env.next_sample(black_box(48_000.0));
                }
                black_box(&buffer);
            })
        });

        // Retriggered every block, as fast gating does
        let mut env = Envelope::adsr(0.002, 0.2, 0.8, 0.02);
        group.bench_with_input(BenchmarkId::new("retrigger", size), &size, |b, _| {
            b.iter(|| {
                env.gate_on();
                for sample in buffer.iter_mut().take(size / 2) {
                    *sample = env.next_sample(48_000.0);
                }
                env.gate_off(48_000.0);
                for sample in buffer.iter_mut().skip(size / 2) {
                    *sample = env.next_sample(48_000.0);
                }
                black_box(&buffer);
            })
        });
    }

    group.finish();
}
