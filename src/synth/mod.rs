//! The complete instrument: voice chains, duo-LFO vibrato, stereo bus and
//! effects, plus the registry over every plugin's ports.
//!
//! ```text
//!   12 voice chains ─▶ StereoPlugin ─▶ DelayPlugin ─▶ DistortionPlugin ─▶ main out
//!        ▲ vibrato
//!   DuoLfoPlugin
//! ```

mod graph;

pub use graph::{envelope_times, voice_frequency, VoiceGraph};

use std::sync::Arc;

use tracing::info;

use crate::engine::AudioEngine;
use crate::error::{Error, Result};
use crate::plugin::voice::VOICE_COUNT;
use crate::plugin::{
    DelayPlugin, DistortionPlugin, DspPlugin, DuoLfoPlugin, StereoPlugin, VoiceListener,
    VoicePlugin,
};
use crate::registry::PortRegistry;
use crate::unit::{InputId, OutputId};

fn input_of(plugin: &dyn DspPlugin, name: &str) -> Result<InputId> {
    plugin
        .audio_input(name)
        .ok_or_else(|| Error::PluginNotInitialized(plugin.uri().to_string()))
}

fn output_of(plugin: &dyn DspPlugin, name: &str) -> Result<OutputId> {
    plugin
        .audio_output(name)
        .ok_or_else(|| Error::PluginNotInitialized(plugin.uri().to_string()))
}

pub struct SynthEngine {
    voices: Arc<VoicePlugin>,
    duo_lfo: Arc<DuoLfoPlugin>,
    stereo: Arc<StereoPlugin>,
    delay: Arc<DelayPlugin>,
    distortion: Arc<DistortionPlugin>,
    graph: Arc<VoiceGraph>,
    registry: PortRegistry,
}

impl SynthEngine {
    /// Build every plugin into `engine` and route the result to its main output.
    pub fn new(engine: &mut AudioEngine) -> Result<Self> {
        let mut duo_lfo = DuoLfoPlugin::new(engine.handle());
        let mut stereo = StereoPlugin::new(VOICE_COUNT);
        let mut delay = DelayPlugin::new();
        let mut distortion = DistortionPlugin::new();
        duo_lfo.initialize(engine)?;
        stereo.initialize(engine)?;
        delay.initialize(engine)?;
        distortion.initialize(engine)?;

        engine.connect(output_of(&stereo, "left")?, input_of(&delay, "in_left")?)?;
        engine.connect(output_of(&stereo, "right")?, input_of(&delay, "in_right")?)?;
        engine.connect(output_of(&delay, "out_left")?, input_of(&distortion, "in_left")?)?;
        engine.connect(output_of(&delay, "out_right")?, input_of(&distortion, "in_right")?)?;
        engine.set_output(
            output_of(&distortion, "out_left")?,
            output_of(&distortion, "out_right")?,
        )?;

        let duo_lfo = Arc::new(duo_lfo);
        let delay = Arc::new(delay);
        let lfo = output_of(duo_lfo.as_ref(), "output")?;
        let graph = Arc::new(VoiceGraph::build(
            engine,
            lfo,
            Arc::clone(&delay),
            Arc::clone(&duo_lfo),
        )?);
        for voice in 0..VOICE_COUNT {
            if let (Some(output), Some(name)) =
                (graph.output(voice), StereoPlugin::voice_input_name(voice))
            {
                engine.connect(output, input_of(&stereo, name)?)?;
            }
        }

        let mut voices = VoicePlugin::new();
        voices.initialize(engine)?;
        graph.sync_from(&voices);
        voices.set_listener(Arc::clone(&graph) as Arc<dyn VoiceListener>);

        let voices = Arc::new(voices);
        let stereo = Arc::new(stereo);
        let distortion = Arc::new(distortion);
        let registry = PortRegistry::new(vec![
            Arc::clone(&voices) as Arc<dyn DspPlugin>,
            Arc::clone(&duo_lfo) as Arc<dyn DspPlugin>,
            Arc::clone(&stereo) as Arc<dyn DspPlugin>,
            Arc::clone(&delay) as Arc<dyn DspPlugin>,
            Arc::clone(&distortion) as Arc<dyn DspPlugin>,
        ]);
        info!(units = engine.unit_count(), ports = registry.len(), "synth built");

        Ok(Self {
            voices,
            duo_lfo,
            stereo,
            delay,
            distortion,
            graph,
            registry,
        })
    }

    pub fn registry(&self) -> &PortRegistry {
        &self.registry
    }

    pub fn voices(&self) -> &Arc<VoicePlugin> {
        &self.voices
    }

    pub fn duo_lfo(&self) -> &Arc<DuoLfoPlugin> {
        &self.duo_lfo
    }

    pub fn stereo(&self) -> &Arc<StereoPlugin> {
        &self.stereo
    }

    pub fn delay(&self) -> &Arc<DelayPlugin> {
        &self.delay
    }

    pub fn distortion(&self) -> &Arc<DistortionPlugin> {
        &self.distortion
    }

    /// Open or close the envelope gate of one voice. `false` for a bad index.
    pub fn set_gate(&self, voice: usize, open: bool) -> bool {
        self.graph.set_gate(voice, open)
    }

    pub fn is_gate_open(&self, voice: usize) -> bool {
        self.graph.is_gate_open(voice)
    }

    /// Base frequency of a voice in Hz.
    pub fn voice_frequency(&self, voice: usize) -> Option<f32> {
        self.graph.frequency(voice)
    }

    /// Left-channel peak of the stereo bus.
    pub fn peak_level(&self) -> f32 {
        self.stereo.peak_level()
    }

    /// Let every plugin know the host is about to start the engine.
    pub fn on_start(&self) {
        for plugin in self.registry.plugins() {
            plugin.on_start();
        }
    }
}
