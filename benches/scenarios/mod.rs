//! Real-world scenario benchmarks.
//!
//! These render the full instrument the way the audio callback does and
//! exercise the preset path a host uses between blocks.

mod engine;
mod presets;

pub use engine::bench_engine;
pub use presets::bench_presets;
