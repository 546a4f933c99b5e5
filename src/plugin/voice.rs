//! Voice parameter state.
//!
//! The voice plugin owns no units. It holds the parameter state of every
//! voice, duo pair and quad group plus a few globals, and tells a
//! [`VoiceListener`] whenever a port changes one of them. Whoever owns the
//! voice unit graphs (see [`SynthEngine`](crate::synth::SynthEngine)) reacts
//! in the listener.
//!
//! Direct setters ([`VoicePlugin::set_voice_param`],
//! [`VoicePlugin::set_global_param`]) update state WITHOUT notifying, so the
//! graph owner can sync state back into the plugin without triggering itself.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::atomic::AtomicParam;
use crate::engine::AudioEngine;
use crate::error::{Error, Result};
use crate::plugin::{AudioEndpoints, DspPlugin};
use crate::port::{ControlPort, PortsBuilder};

pub const URI: &str = "org.orpheus.voices";
const PORT_START_INDEX: u32 = 0;

pub const VOICE_COUNT: usize = 12;
pub const DUO_COUNT: usize = VOICE_COUNT / 2;
pub const QUAD_COUNT: usize = VOICE_COUNT / 4;

/// Highest value of the `engine` selector of a duo.
pub const MAX_DUO_ENGINE: i32 = 7;
/// Highest value of a quad's `trigger_source` selector.
pub const MAX_TRIGGER_SOURCE: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoiceGroup {
    Voice,
    Duo,
    Quad,
}

impl VoiceGroup {
    pub fn count(self) -> usize {
        match self {
            VoiceGroup::Voice => VOICE_COUNT,
            VoiceGroup::Duo => DUO_COUNT,
            VoiceGroup::Quad => QUAD_COUNT,
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            VoiceGroup::Voice => "voice",
            VoiceGroup::Duo => "duo",
            VoiceGroup::Quad => "quad",
        }
    }
}

/// A parameter held per voice, per duo or per quad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoiceParam {
    Tune,
    ModDepth,
    EnvelopeSpeed,
    DuoSharpness,
    DuoEngine,
    DuoHarmonics,
    DuoProsody,
    QuadPitch,
    QuadHold,
    QuadVolume,
    QuadTriggerSource,
}

impl VoiceParam {
    pub const ALL: [VoiceParam; 11] = [
        VoiceParam::Tune,
        VoiceParam::ModDepth,
        VoiceParam::EnvelopeSpeed,
        VoiceParam::DuoSharpness,
        VoiceParam::DuoEngine,
        VoiceParam::DuoHarmonics,
        VoiceParam::DuoProsody,
        VoiceParam::QuadPitch,
        VoiceParam::QuadHold,
        VoiceParam::QuadVolume,
        VoiceParam::QuadTriggerSource,
    ];

    pub fn group(self) -> VoiceGroup {
        match self {
            VoiceParam::Tune | VoiceParam::ModDepth | VoiceParam::EnvelopeSpeed => {
                VoiceGroup::Voice
            }
            VoiceParam::DuoSharpness
            | VoiceParam::DuoEngine
            | VoiceParam::DuoHarmonics
            | VoiceParam::DuoProsody => VoiceGroup::Duo,
            VoiceParam::QuadPitch
            | VoiceParam::QuadHold
            | VoiceParam::QuadVolume
            | VoiceParam::QuadTriggerSource => VoiceGroup::Quad,
        }
    }

    fn key(self) -> &'static str {
        match self {
            VoiceParam::Tune => "tune",
            VoiceParam::ModDepth => "mod_depth",
            VoiceParam::EnvelopeSpeed => "env_speed",
            VoiceParam::DuoSharpness => "sharpness",
            VoiceParam::DuoEngine => "engine",
            VoiceParam::DuoHarmonics => "harmonics",
            VoiceParam::DuoProsody => "prosody",
            VoiceParam::QuadPitch => "pitch",
            VoiceParam::QuadHold => "hold",
            VoiceParam::QuadVolume => "volume",
            VoiceParam::QuadTriggerSource => "trigger_source",
        }
    }

    /// Port symbol for group member `index`, e.g. `voice_3_tune`.
    pub fn symbol(self, index: usize) -> String {
        format!("{}_{}_{}", self.group().prefix(), index, self.key())
    }

    pub fn default_value(self) -> f32 {
        match self {
            VoiceParam::Tune => 0.5,
            VoiceParam::ModDepth => 0.5,
            VoiceParam::EnvelopeSpeed => 0.3,
            VoiceParam::DuoHarmonics | VoiceParam::DuoProsody => 0.5,
            VoiceParam::QuadPitch => 0.5,
            VoiceParam::QuadVolume => 0.8,
            _ => 0.0,
        }
    }

    pub fn is_int(self) -> bool {
        matches!(self, VoiceParam::DuoEngine | VoiceParam::QuadTriggerSource)
    }

    fn max(self) -> f32 {
        match self {
            VoiceParam::DuoEngine => MAX_DUO_ENGINE as f32,
            VoiceParam::QuadTriggerSource => MAX_TRIGGER_SOURCE as f32,
            _ => 1.0,
        }
    }

    fn clamp(self, value: f32) -> f32 {
        if !value.is_finite() {
            return self.default_value();
        }
        let value = value.clamp(0.0, self.max());
        if self.is_int() {
            value.round()
        } else {
            value
        }
    }
}

/// A parameter shared by every voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlobalParam {
    Feedback,
    Vibrato,
    Coupling,
}

impl GlobalParam {
    pub const ALL: [GlobalParam; 3] = [
        GlobalParam::Feedback,
        GlobalParam::Vibrato,
        GlobalParam::Coupling,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            GlobalParam::Feedback => "feedback",
            GlobalParam::Vibrato => "vibrato",
            GlobalParam::Coupling => "coupling",
        }
    }
}

/// Notified of every port-driven change. Called on the thread doing the set.
pub trait VoiceListener: Send + Sync {
    fn on_voice_param_change(&self, index: usize, param: VoiceParam, value: f32);
    fn on_global_param_change(&self, param: GlobalParam, value: f32);
}

struct State {
    // [param][group index]
    params: Vec<Vec<AtomicParam>>,
    globals: Vec<AtomicParam>,
    listener: RwLock<Option<Arc<dyn VoiceListener>>>,
}

impl State {
    fn slot(&self, index: usize, param: VoiceParam) -> Option<&AtomicParam> {
        self.params.get(param as usize)?.get(index)
    }

    fn global(&self, param: GlobalParam) -> &AtomicParam {
        &self.globals[param as usize]
    }

    fn listener(&self) -> Option<Arc<dyn VoiceListener>> {
        self.listener.read().clone()
    }

    fn set_and_notify(&self, index: usize, param: VoiceParam, value: f32) {
        if let Some(slot) = self.slot(index, param) {
            slot.set(value);
            if let Some(listener) = self.listener() {
                listener.on_voice_param_change(index, param, value);
            }
        }
    }

    fn set_global_and_notify(&self, param: GlobalParam, value: f32) {
        self.global(param).set(value);
        if let Some(listener) = self.listener() {
            listener.on_global_param_change(param, value);
        }
    }
}

/// Parameter facade for 12 voices, 6 duos and 3 quads.
pub struct VoicePlugin {
    state: Arc<State>,
    ports: Vec<ControlPort>,
    endpoints: AudioEndpoints,
    initialized: bool,
}

impl VoicePlugin {
    pub fn new() -> Self {
        let state = Arc::new(State {
            params: VoiceParam::ALL
                .iter()
                .map(|p| {
                    (0..p.group().count())
                        .map(|_| AtomicParam::new(p.default_value()))
                        .collect()
                })
                .collect(),
            globals: GlobalParam::ALL.iter().map(|_| AtomicParam::new(0.0)).collect(),
            listener: RwLock::new(None),
        });

        let mut ports = PortsBuilder::new(PORT_START_INDEX);
        for group in [VoiceGroup::Voice, VoiceGroup::Duo, VoiceGroup::Quad] {
            for index in 0..group.count() {
                for param in VoiceParam::ALL.into_iter().filter(|p| p.group() == group) {
                    add_param_port(&mut ports, &state, index, param);
                }
            }
        }
        for param in GlobalParam::ALL {
            let (get, set) = (Arc::clone(&state), Arc::clone(&state));
            ports
                .float(param.symbol())
                .default(0.0)
                .range(0.0, 1.0)
                .bind(
                    move || get.global(param).get(),
                    move |value| set.set_global_and_notify(param, value),
                );
        }

        Self {
            state,
            ports: ports.build(),
            endpoints: AudioEndpoints::new(),
            initialized: false,
        }
    }

    /// Install the single listener. Configuration time only.
    pub fn set_listener(&mut self, listener: Arc<dyn VoiceListener>) {
        *self.state.listener.write() = Some(listener);
    }

    pub fn voice_param(&self, index: usize, param: VoiceParam) -> Option<f32> {
        self.state.slot(index, param).map(AtomicParam::get)
    }

    /// Update state without notifying the listener. `false` for a bad index.
    pub fn set_voice_param(&self, index: usize, param: VoiceParam, value: f32) -> bool {
        match self.state.slot(index, param) {
            Some(slot) => {
                slot.set(param.clamp(value));
                true
            }
            None => false,
        }
    }

    pub fn global_param(&self, param: GlobalParam) -> f32 {
        self.state.global(param).get()
    }

    /// Update a global without notifying the listener.
    pub fn set_global_param(&self, param: GlobalParam, value: f32) {
        let value = if value.is_finite() { value.clamp(0.0, 1.0) } else { 0.0 };
        self.state.global(param).set(value);
    }
}

fn add_param_port(ports: &mut PortsBuilder, state: &Arc<State>, index: usize, param: VoiceParam) {
    let (get, set) = (Arc::clone(state), Arc::clone(state));
    let read = move || get.slot(index, param).map_or(0.0, AtomicParam::get);
    if param.is_int() {
        ports
            .int(param.symbol(index))
            .default(param.default_value() as i32)
            .range(0, param.max() as i32)
            .bind(
                move || read() as i32,
                move |value| set.set_and_notify(index, param, value as f32),
            );
    } else {
        ports
            .float(param.symbol(index))
            .default(param.default_value())
            .range(0.0, param.max())
            .bind(read, move |value| set.set_and_notify(index, param, value));
    }
}

impl Default for VoicePlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl DspPlugin for VoicePlugin {
    fn uri(&self) -> &str {
        URI
    }

    fn initialize(&mut self, _engine: &mut AudioEngine) -> Result<()> {
        if self.initialized {
            return Err(Error::AlreadyInitialized(URI.to_string()));
        }
        self.initialized = true;
        debug!(uri = URI, ports = self.ports.len(), "plugin initialized");
        Ok(())
    }

    fn ports(&self) -> &[ControlPort] {
        &self.ports
    }

    fn endpoints(&self) -> &AudioEndpoints {
        &self.endpoints
    }
}
