use std::sync::Arc;

use tracing::debug;

use crate::atomic::{AtomicParam, ControlValue};
use crate::dsp::mix::equal_power_gains;
use crate::engine::AudioEngine;
use crate::error::{Error, Result};
use crate::plugin::{AudioEndpoints, DspPlugin};
use crate::port::{ControlPort, PortsBuilder};
use crate::unit::arithmetic::{INPUT_A, INPUT_B, INPUT_C};
use crate::unit::{Multiply, MultiplyAdd, PassThrough, PeakFollower, UnitId};

pub const URI: &str = "org.orpheus.stereo";
const PORT_START_INDEX: u32 = 120;

/// Most voice inputs one stereo bus accepts.
pub const MAX_VOICES: usize = 16;

const VOICE_INPUTS: [&str; MAX_VOICES] = [
    "voice0", "voice1", "voice2", "voice3", "voice4", "voice5", "voice6", "voice7", "voice8",
    "voice9", "voice10", "voice11", "voice12", "voice13", "voice14", "voice15",
];

/*
Stereo Bus
==========

Each voice enters through a PassThrough proxy and is panned with the
equal-power law (see `dsp/mix.rs`). The per-channel sum is a chain of
MultiplyAdd units, one per voice:

    voice0 ─▶ ×gL0 + 0 ─▶ ×gL1 + ─▶ ... ─▶ ×master_L ─▶ "left"  ─▶ PeakFollower
    voice1 ──────────────────┘
                                         ×master_R ─▶ "right"

Master gain and master pan are folded into one constant per channel:

    master_L = gain · cos(angle)      master_R = gain · sin(angle)

The peak follower watches the left channel after the master stage and is
started as a root so the meter runs even when nothing pulls it.
*/

struct Shared {
    pans: Vec<ControlValue>,
    voice_gains: Vec<(ControlValue, ControlValue)>,
    master_gain: ControlValue,
    master_pan: ControlValue,
    master_left: ControlValue,
    master_right: ControlValue,
    meter: ControlValue,
}

impl Shared {
    fn apply_pan(&self, voice: usize) {
        if let (Some(pan), Some((left, right))) =
            (self.pans.get(voice), self.voice_gains.get(voice))
        {
            let (l, r) = equal_power_gains(pan.get());
            left.set(l);
            right.set(r);
        }
    }

    fn apply_master(&self) {
        let gain = self.master_gain.get();
        let (l, r) = equal_power_gains(self.master_pan.get());
        self.master_left.set(gain * l);
        self.master_right.set(gain * r);
    }
}

fn param(value: f32) -> ControlValue {
    Arc::new(AtomicParam::new(value))
}

/// Pans and sums voices into a stereo pair with master gain, pan and a meter.
pub struct StereoPlugin {
    shared: Arc<Shared>,
    voices: usize,
    ports: Vec<ControlPort>,
    endpoints: AudioEndpoints,
    initialized: bool,
}

impl StereoPlugin {
    /// A bus with `voices` inputs (capped at [`MAX_VOICES`]).
    pub fn new(voices: usize) -> Self {
        let voices = voices.min(MAX_VOICES);
        let shared = Arc::new(Shared {
            pans: (0..voices).map(|_| param(0.0)).collect(),
            voice_gains: (0..voices).map(|_| (param(0.0), param(0.0))).collect(),
            master_gain: param(0.8),
            master_pan: param(0.0),
            master_left: param(0.0),
            master_right: param(0.0),
            meter: param(0.0),
        });
        for voice in 0..voices {
            shared.apply_pan(voice);
        }
        shared.apply_master();

        let mut ports = PortsBuilder::new(PORT_START_INDEX);
        for voice in 0..voices {
            let (get, set) = (Arc::clone(&shared), Arc::clone(&shared));
            ports
                .float(format!("pan_{voice}"))
                .name(format!("Voice {} Pan", voice + 1))
                .default(0.0)
                .range(-1.0, 1.0)
                .bind(
                    move || get.pans[voice].get(),
                    move |pan| {
                        set.pans[voice].set(pan);
                        set.apply_pan(voice);
                    },
                );
        }

        let (get, set) = (Arc::clone(&shared), Arc::clone(&shared));
        ports
            .float("master_gain")
            .name("Master Volume")
            .default(0.8)
            .range(0.0, 1.0)
            .bind(
                move || get.master_gain.get(),
                move |gain| {
                    set.master_gain.set(gain);
                    set.apply_master();
                },
            );

        let (get, set) = (Arc::clone(&shared), Arc::clone(&shared));
        ports
            .float("master_pan")
            .name("Master Pan")
            .default(0.0)
            .range(-1.0, 1.0)
            .bind(
                move || get.master_pan.get(),
                move |pan| {
                    set.master_pan.set(pan);
                    set.apply_master();
                },
            );

        Self {
            shared,
            voices,
            ports: ports.build(),
            endpoints: AudioEndpoints::new(),
            initialized: false,
        }
    }

    pub fn voice_count(&self) -> usize {
        self.voices
    }

    /// Left-channel peak after the master stage, updated once per block.
    pub fn peak_level(&self) -> f32 {
        self.shared.meter.get()
    }

    /// Current `(left, right)` gains of one voice.
    pub fn voice_gains(&self, voice: usize) -> Option<(f32, f32)> {
        self.shared
            .voice_gains
            .get(voice)
            .map(|(l, r)| (l.get(), r.get()))
    }

    pub fn voice_input_name(voice: usize) -> Option<&'static str> {
        VOICE_INPUTS.get(voice).copied()
    }

    fn build_channel(
        &self,
        engine: &mut AudioEngine,
        proxies: &[UnitId],
        gain_of: impl Fn(&(ControlValue, ControlValue)) -> &ControlValue,
        master: &ControlValue,
    ) -> Result<UnitId> {
        let mut previous: Option<UnitId> = None;
        for (proxy, gains) in proxies.iter().zip(&self.shared.voice_gains) {
            let stage = engine.add(MultiplyAdd::new())?;
            engine.connect(proxy.output(), stage.input(INPUT_A))?;
            engine.bind_constant(stage.input(INPUT_B), Arc::clone(gain_of(gains)))?;
            if let Some(previous) = previous {
                engine.connect(previous.output(), stage.input(INPUT_C))?;
            }
            previous = Some(stage);
        }

        let out = engine.add(Multiply::new())?;
        match previous {
            Some(sum) => engine.connect(sum.output(), out.input(INPUT_A))?,
            None => engine.set_constant(out.input(INPUT_A), 0.0)?,
        }
        engine.bind_constant(out.input(INPUT_B), Arc::clone(master))?;
        Ok(out)
    }
}

impl DspPlugin for StereoPlugin {
    fn uri(&self) -> &str {
        URI
    }

    fn initialize(&mut self, engine: &mut AudioEngine) -> Result<()> {
        if self.initialized {
            return Err(Error::AlreadyInitialized(URI.to_string()));
        }

        let mut proxies = Vec::with_capacity(self.voices);
        for _ in 0..self.voices {
            proxies.push(engine.add(PassThrough::new())?);
        }
        let left = self.build_channel(engine, &proxies, |g| &g.0, &self.shared.master_left)?;
        let right = self.build_channel(engine, &proxies, |g| &g.1, &self.shared.master_right)?;

        let meter = engine.add(PeakFollower::with_meter(Arc::clone(&self.shared.meter)))?;
        engine.connect(left.output(), meter.input(0))?;
        engine.start_unit(meter)?;

        for (name, proxy) in VOICE_INPUTS.iter().zip(&proxies) {
            self.endpoints.add_input(name, proxy.input(0));
        }
        self.endpoints.add_output("left", left.output());
        self.endpoints.add_output("right", right.output());
        self.initialized = true;
        debug!(uri = URI, voices = self.voices, "plugin initialized");
        Ok(())
    }

    fn ports(&self) -> &[ControlPort] {
        &self.ports
    }

    fn endpoints(&self) -> &AudioEndpoints {
        &self.endpoints
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::port::PortValue;
    use approx::assert_abs_diff_eq;

    fn setup(voices: usize) -> (AudioEngine, StereoPlugin) {
        let config = EngineConfig::default().with_sample_rate(1_000.0).with_block_size(16);
        let mut engine = AudioEngine::new(config).unwrap();
        let mut stereo = StereoPlugin::new(voices);
        stereo.initialize(&mut engine).unwrap();
        let (l, r) = (stereo.audio_output("left").unwrap(), stereo.audio_output("right").unwrap());
        engine.set_output(l, r).unwrap();
        (engine, stereo)
    }

    #[test]
    fn hard_panned_voices_land_on_their_side() {
        let (mut engine, stereo) = setup(2);
        stereo.set_port_value("master_gain", PortValue::Float(1.0));
        stereo.set_port_value("pan_0", PortValue::Float(-1.0));
        stereo.set_port_value("pan_1", PortValue::Float(1.0));
        engine.set_constant(stereo.audio_input("voice0").unwrap(), 0.4).unwrap();
        engine.set_constant(stereo.audio_input("voice1").unwrap(), 0.2).unwrap();

        engine.render_block();
        let (left, right) = engine.stereo_block();
        let master = std::f32::consts::FRAC_PI_4.cos();
        assert_abs_diff_eq!(left[0], 0.4 * master, epsilon = 1e-5);
        assert_abs_diff_eq!(right[0], 0.2 * master, epsilon = 1e-5);
    }

    #[test]
    fn meter_tracks_left_channel() {
        let (mut engine, stereo) = setup(1);
        engine.set_constant(stereo.audio_input("voice0").unwrap(), 0.5).unwrap();
        engine.render_block();
        let (left, _) = engine.stereo_block();
        assert_abs_diff_eq!(stereo.peak_level(), left[15], epsilon = 1e-6);
        assert!(stereo.peak_level() > 0.0);
    }

    #[test]
    fn voice_count_is_capped() {
        let stereo = StereoPlugin::new(40);
        assert_eq!(stereo.voice_count(), MAX_VOICES);
        assert_eq!(stereo.ports().len(), MAX_VOICES + 2);
        assert_eq!(StereoPlugin::voice_input_name(3), Some("voice3"));
    }
}
