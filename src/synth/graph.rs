use std::sync::Arc;

use tracing::trace;

use crate::atomic::{AtomicFlag, AtomicParam, ControlValue};
use crate::engine::AudioEngine;
use crate::error::Result;
use crate::plugin::delay::MAX_FEEDBACK;
use crate::plugin::voice::{QUAD_COUNT, VOICE_COUNT};
use crate::plugin::{
    DelayPlugin, DuoLfoPlugin, GlobalParam, VoiceListener, VoiceParam, VoicePlugin,
};
use crate::unit::arithmetic::{INPUT_A, INPUT_B, INPUT_C};
use crate::unit::{
    envelope, oscillator, pass_through, EnvelopeGenerator, InputId, Multiply, MultiplyAdd,
    Oscillator, OutputId, PassThrough,
};

/*
Voice Graph
===========

One chain per voice:

    pitch proxy ─▶ MultiplyAdd ─▶ SineOscillator ─▶ ×envelope ─▶ ×gain ─▶ stereo bus
                     ▲  ×depth
    duo-LFO ─────────┘

The pitch proxy's constant is the voice frequency; the duo-LFO output is
added on top scaled by the vibrato depth (in Hz), so `depth = 0` is a plain
sine at the proxy frequency.

Parameter Mapping
-----------------

    frequency = 55 · 2^(4 · tune) · 2^(2 · quad_pitch − 1)      (55 Hz .. 880 Hz, ±1 octave)
    vibrato   = frequency · VIBRATO_RANGE · vibrato · mod_depth
    attack    = 0.002 + 1.5 · env_speed²      release = 0.02 + 3 · env_speed²
    gain      = quad_volume · VOICE_GAIN

A quad's `hold` above 0.5 keeps the gates of its four voices open (drone).
*/

const VIBRATO_RANGE: f32 = 0.05;
const VOICE_GAIN: f32 = 0.3;
const DECAY_SECONDS: f32 = 0.2;
const SUSTAIN_LEVEL: f32 = 0.8;
const VOICES_PER_QUAD: usize = VOICE_COUNT / QUAD_COUNT;

pub fn voice_frequency(tune: f32, quad_pitch: f32) -> f32 {
    55.0 * (4.0 * tune).exp2() * (2.0 * quad_pitch - 1.0).exp2()
}

pub fn envelope_times(speed: f32) -> (f32, f32) {
    let curve = speed * speed;
    (0.002 + 1.5 * curve, 0.02 + 3.0 * curve)
}

/// The constants one voice chain reads.
struct VoiceControls {
    pitch: ControlValue,
    vibrato_depth: ControlValue,
    gate: ControlValue,
    attack: ControlValue,
    release: ControlValue,
    gain: ControlValue,
}

/// Owns the control side of the voice chains and reacts to voice parameters.
pub struct VoiceGraph {
    controls: Vec<VoiceControls>,
    outputs: Vec<OutputId>,
    tune: Vec<AtomicParam>,
    mod_depth: Vec<AtomicParam>,
    quad_pitch: Vec<AtomicParam>,
    quad_hold: Vec<AtomicFlag>,
    gates: Vec<AtomicFlag>,
    vibrato: AtomicParam,
    delay: Arc<DelayPlugin>,
    duo_lfo: Arc<DuoLfoPlugin>,
}

fn constant(engine: &AudioEngine, input: InputId, value: f32) -> Result<ControlValue> {
    let constant = engine.constant(input)?;
    constant.set(value);
    Ok(constant)
}

impl VoiceGraph {
    /// Add every voice chain to the engine, modulated by `lfo`.
    pub fn build(
        engine: &mut AudioEngine,
        lfo: OutputId,
        delay: Arc<DelayPlugin>,
        duo_lfo: Arc<DuoLfoPlugin>,
    ) -> Result<Self> {
        let mut controls = Vec::with_capacity(VOICE_COUNT);
        let mut outputs = Vec::with_capacity(VOICE_COUNT);

        for _ in 0..VOICE_COUNT {
            let pitch = engine.add(PassThrough::new())?;
            let vibrato = engine.add(MultiplyAdd::new())?;
            let osc = engine.add(Oscillator::sine())?;
            let env = engine.add(EnvelopeGenerator::new())?;
            let amp = engine.add(Multiply::new())?;
            let gain = engine.add(Multiply::new())?;

            engine.connect(lfo, vibrato.input(INPUT_A))?;
            engine.connect(pitch.output(), vibrato.input(INPUT_C))?;
            engine.connect(vibrato.output(), osc.input(oscillator::FREQUENCY))?;
            engine.connect(osc.output(), amp.input(INPUT_A))?;
            engine.connect(env.output(), amp.input(INPUT_B))?;
            engine.connect(amp.output(), gain.input(INPUT_A))?;
            engine.set_constant(env.input(envelope::DECAY), DECAY_SECONDS)?;
            engine.set_constant(env.input(envelope::SUSTAIN), SUSTAIN_LEVEL)?;

            controls.push(VoiceControls {
                pitch: constant(engine, pitch.input(pass_through::INPUT), 220.0)?,
                vibrato_depth: constant(engine, vibrato.input(INPUT_B), 0.0)?,
                gate: constant(engine, env.input(envelope::GATE), 0.0)?,
                attack: engine.constant(env.input(envelope::ATTACK))?,
                release: engine.constant(env.input(envelope::RELEASE))?,
                gain: constant(engine, gain.input(INPUT_B), VOICE_GAIN)?,
            });
            outputs.push(gain.output());
        }

        let params = |count: usize| -> Vec<AtomicParam> {
            (0..count).map(|_| AtomicParam::new(0.0)).collect()
        };
        Ok(Self {
            controls,
            outputs,
            tune: params(VOICE_COUNT),
            mod_depth: params(VOICE_COUNT),
            quad_pitch: params(QUAD_COUNT),
            quad_hold: (0..QUAD_COUNT).map(|_| AtomicFlag::new(false)).collect(),
            gates: (0..VOICE_COUNT).map(|_| AtomicFlag::new(false)).collect(),
            vibrato: AtomicParam::new(0.0),
            delay,
            duo_lfo,
        })
    }

    /// Output of voice `index`, after its gain stage.
    pub fn output(&self, index: usize) -> Option<OutputId> {
        self.outputs.get(index).copied()
    }

    /// Apply every voice value from the plugin, without notifications.
    ///
    /// Feedback and coupling are skipped: they drive ports of other plugins,
    /// which start from their own defaults.
    pub fn sync_from(&self, plugin: &VoicePlugin) {
        for param in VoiceParam::ALL {
            for index in 0..param.group().count() {
                if let Some(value) = plugin.voice_param(index, param) {
                    self.on_voice_param_change(index, param, value);
                }
            }
        }
        let vibrato = plugin.global_param(GlobalParam::Vibrato);
        self.on_global_param_change(GlobalParam::Vibrato, vibrato);
    }

    pub fn set_gate(&self, voice: usize, open: bool) -> bool {
        match self.gates.get(voice) {
            Some(gate) => {
                gate.set(open);
                self.update_gate(voice);
                true
            }
            None => false,
        }
    }

    pub fn is_gate_open(&self, voice: usize) -> bool {
        self.gates.get(voice).is_some_and(AtomicFlag::get)
    }

    /// Base frequency of a voice (before vibrato), in Hz.
    pub fn frequency(&self, voice: usize) -> Option<f32> {
        self.controls.get(voice).map(|c| c.pitch.get())
    }

    fn quad_voices(quad: usize) -> std::ops::Range<usize> {
        quad * VOICES_PER_QUAD..(quad + 1) * VOICES_PER_QUAD
    }

    fn update_pitch(&self, voice: usize) {
        let (Some(controls), Some(tune), Some(depth)) = (
            self.controls.get(voice),
            self.tune.get(voice),
            self.mod_depth.get(voice),
        ) else {
            return;
        };
        let quad_pitch = self
            .quad_pitch
            .get(voice / VOICES_PER_QUAD)
            .map_or(0.5, AtomicParam::get);
        let frequency = voice_frequency(tune.get(), quad_pitch);
        controls.pitch.set(frequency);
        controls
            .vibrato_depth
            .set(frequency * VIBRATO_RANGE * self.vibrato.get() * depth.get());
    }

    fn update_gate(&self, voice: usize) {
        let held = self
            .quad_hold
            .get(voice / VOICES_PER_QUAD)
            .is_some_and(AtomicFlag::get);
        if let Some(controls) = self.controls.get(voice) {
            let open = held || self.is_gate_open(voice);
            controls.gate.set(if open { 1.0 } else { 0.0 });
        }
    }
}

impl VoiceListener for VoiceGraph {
    fn on_voice_param_change(&self, index: usize, param: VoiceParam, value: f32) {
        match param {
            VoiceParam::Tune => {
                if let Some(tune) = self.tune.get(index) {
                    tune.set(value);
                    self.update_pitch(index);
                }
            }
            VoiceParam::ModDepth => {
                if let Some(depth) = self.mod_depth.get(index) {
                    depth.set(value);
                    self.update_pitch(index);
                }
            }
            VoiceParam::EnvelopeSpeed => {
                if let Some(controls) = self.controls.get(index) {
                    let (attack, release) = envelope_times(value);
                    controls.attack.set(attack);
                    controls.release.set(release);
                }
            }
            VoiceParam::QuadPitch => {
                if let Some(pitch) = self.quad_pitch.get(index) {
                    pitch.set(value);
                    Self::quad_voices(index).for_each(|voice| self.update_pitch(voice));
                }
            }
            VoiceParam::QuadVolume => {
                for voice in Self::quad_voices(index) {
                    if let Some(controls) = self.controls.get(voice) {
                        controls.gain.set(value * VOICE_GAIN);
                    }
                }
            }
            VoiceParam::QuadHold => {
                if let Some(hold) = self.quad_hold.get(index) {
                    hold.set(value >= 0.5);
                    Self::quad_voices(index).for_each(|voice| self.update_gate(voice));
                }
            }
            other => trace!(index, param = ?other, value, "voice parameter has no graph mapping"),
        }
    }

    fn on_global_param_change(&self, param: GlobalParam, value: f32) {
        match param {
            GlobalParam::Vibrato => {
                self.vibrato.set(value);
                (0..VOICE_COUNT).for_each(|voice| self.update_pitch(voice));
            }
            GlobalParam::Feedback => self.delay.set_feedback(value * MAX_FEEDBACK),
            GlobalParam::Coupling => self.duo_lfo.set_link(value >= 0.5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn frequency_mapping_spans_four_octaves() {
        assert_abs_diff_eq!(voice_frequency(0.0, 0.5), 55.0, epsilon = 1e-3);
        assert_abs_diff_eq!(voice_frequency(0.5, 0.5), 220.0, epsilon = 1e-3);
        assert_abs_diff_eq!(voice_frequency(1.0, 0.5), 880.0, epsilon = 1e-2);
        assert_abs_diff_eq!(voice_frequency(0.5, 1.0), 440.0, epsilon = 1e-2);
        assert_abs_diff_eq!(voice_frequency(0.5, 0.0), 110.0, epsilon = 1e-3);
    }

    #[test]
    fn envelope_speed_stretches_times() {
        let (fast_a, fast_r) = envelope_times(0.0);
        let (slow_a, slow_r) = envelope_times(1.0);
        assert!(fast_a < slow_a && fast_r < slow_r);
        assert_abs_diff_eq!(slow_a, 1.502, epsilon = 1e-6);
    }
}
