pub mod atomic;
pub mod config;
pub mod dsp; // Allocation-free math kernels
pub mod engine; // Pull-scheduled unit graph + sinks
pub mod error;
pub mod plugin; // Signal modules exposing control ports
pub mod port;
pub mod registry;
pub mod synth; // Voice wiring on top of the plugins
pub mod unit; // Primitive audio units

pub use config::EngineConfig;
pub use engine::{AudioEngine, AudioSink, BufferSink, EngineHandle, RingSink};
pub use error::{Error, Result};
pub use plugin::DspPlugin;
pub use port::{ControlPort, PortType, PortValue, QualifiedSymbol};
pub use registry::{PortRegistry, Preset};
pub use synth::SynthEngine;

pub const MAX_BLOCK_SIZE: usize = 2048;
pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;
