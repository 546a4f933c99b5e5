//! Signal-processing plugins.
//!
//! A plugin is a small subsystem built from units: it adds them to the
//! engine once in [`DspPlugin::initialize`], wires them, and from then on is
//! driven only through its control ports. Plugins are long-lived: construct,
//! initialize, then share behind an `Arc` with the [`PortRegistry`].
//!
//! [`PortRegistry`]: crate::PortRegistry

pub mod delay;
pub mod distortion;
pub mod duo_lfo;
pub mod stereo;
pub mod voice;

pub use delay::DelayPlugin;
pub use distortion::DistortionPlugin;
pub use duo_lfo::{DuoLfoMode, DuoLfoPlugin};
pub use stereo::StereoPlugin;
pub use voice::{GlobalParam, VoiceListener, VoiceParam, VoicePlugin};

use crate::engine::AudioEngine;
use crate::error::Result;
use crate::port::{ControlPort, PortValue};
use crate::unit::{InputId, OutputId};

/// Named audio inputs and outputs a plugin exposes for external wiring.
#[derive(Debug, Clone, Default)]
pub struct AudioEndpoints {
    inputs: Vec<(&'static str, InputId)>,
    outputs: Vec<(&'static str, OutputId)>,
}

impl AudioEndpoints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_input(&mut self, name: &'static str, input: InputId) {
        self.inputs.push((name, input));
    }

    pub fn add_output(&mut self, name: &'static str, output: OutputId) {
        self.outputs.push((name, output));
    }

    pub fn input(&self, name: &str) -> Option<InputId> {
        self.inputs
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, id)| *id)
    }

    pub fn output(&self, name: &str) -> Option<OutputId> {
        self.outputs
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, id)| *id)
    }

    pub fn input_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.inputs.iter().map(|(n, _)| *n)
    }

    pub fn output_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.outputs.iter().map(|(n, _)| *n)
    }
}

/// A plugin exposing control ports and, usually, audio endpoints.
pub trait DspPlugin: Send + Sync {
    /// Unique identifier; the plugin half of every qualified symbol.
    fn uri(&self) -> &str;

    /// Add units to the engine and wire them. Calling twice is an error.
    fn initialize(&mut self, engine: &mut AudioEngine) -> Result<()>;

    fn ports(&self) -> &[ControlPort];

    /// Endpoints are empty until [`initialize`](Self::initialize) has run.
    fn endpoints(&self) -> &AudioEndpoints;

    fn audio_input(&self, name: &str) -> Option<InputId> {
        self.endpoints().input(name)
    }

    fn audio_output(&self, name: &str) -> Option<OutputId> {
        self.endpoints().output(name)
    }

    fn port(&self, symbol: &str) -> Option<&ControlPort> {
        self.ports().iter().find(|port| port.symbol() == symbol)
    }

    /// `false` when no port has this symbol.
    fn set_port_value(&self, symbol: &str, value: PortValue) -> bool {
        match self.port(symbol) {
            Some(port) => {
                port.set(value);
                true
            }
            None => false,
        }
    }

    fn get_port_value(&self, symbol: &str) -> Option<PortValue> {
        self.port(symbol)?.get()
    }

    /// Hook for the host once the engine starts. Most plugins are pure graphs.
    fn on_start(&self) {}
}
