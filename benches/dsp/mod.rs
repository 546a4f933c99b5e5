//! Benchmarks for per-sample DSP kernels.

mod delay;
mod distortion;
mod envelope;
mod mix;
mod oscillator;

pub use delay::bench_delay;
pub use distortion::bench_distortion;
pub use envelope::bench_envelope;
pub use mix::bench_mix;
pub use oscillator::bench_oscillator;
