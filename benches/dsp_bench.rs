//! Benchmarks for DSP kernels and whole-engine scenarios.
//!
//! Run with: cargo bench
//!
//! Reference timing at 48kHz sample rate:
//!   - 64 samples  = 1.33ms deadline
//!   - 128 samples = 2.67ms deadline
//!   - 256 samples = 5.33ms deadline
//!   - 512 samples = 10.67ms deadline
//!
//! Benchmark groups:
//!   - dsp/*        Per-sample kernels (oscillator, envelope, delay, etc.)
//!   - scenarios/*  Engine block rendering and preset capture/restore

use criterion::{criterion_group, criterion_main};

mod dsp;
mod scenarios;

/// Common buffer sizes used in audio applications.
pub const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512];

criterion_group!(
    benches,
    dsp::bench_oscillator,
    dsp::bench_envelope,
    dsp::bench_delay,
    dsp::bench_distortion,
    dsp::bench_mix,
    scenarios::bench_engine,
    scenarios::bench_presets,
);
criterion_main!(benches);
