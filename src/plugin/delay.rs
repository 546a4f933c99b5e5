use std::sync::Arc;

use tracing::debug;

use crate::atomic::{AtomicParam, ControlValue};
use crate::dsp::mix::dry_wet_gains;
use crate::engine::AudioEngine;
use crate::error::{Error, Result};
use crate::plugin::{AudioEndpoints, DspPlugin};
use crate::port::{ControlPort, PortsBuilder};
use crate::unit::arithmetic::{INPUT_A, INPUT_B, INPUT_C};
use crate::unit::{
    delay, oscillator, InterpolatingDelay, Multiply, MultiplyAdd, Oscillator, PassThrough,
    UnitId,
};

pub const URI: &str = "org.orpheus.delay";
const PORT_START_INDEX: u32 = 160;

/// Highest feedback gain the delay accepts.
pub const MAX_FEEDBACK: f32 = 0.95;

/*
Modulated Feedback Delay
========================

One lane per channel, sharing a single sine LFO for time modulation:

                    ┌──────────── ×feedback ◀─────────┐
                    ▼                                 │
    in ─▶ proxy ─▶ (+) ─▶ InterpolatingDelay ─┬───────┘
            │                   ▲             └─▶ ×wet ─▶ (+) ─▶ out
            └──▶ ×dry ──────────┼───────────────────────────┘
                                │
               time + lfo · (0.5 · mod_depth · time)

So the delay time in seconds is

    time · (1 + 0.5 · mod_depth · lfo)

Feedback Ordering
-----------------

The delay unit writes its input before reading (a delay of 0 is a plain
wire). The feedback MultiplyAdd sits on a cycle with the delay unit, so the
engine hands it the delay's PREVIOUS block: each recirculation is late by
exactly one block. Feedback is capped at MAX_FEEDBACK, so every pass through
the loop loses energy whatever the block size.
*/

struct Shared {
    time: ControlValue,
    feedback: ControlValue,
    mix: ControlValue,
    mod_rate: ControlValue,
    mod_depth: ControlValue,
    // Derived constants the units read
    mod_scale: ControlValue,
    dry: ControlValue,
    wet: ControlValue,
}

impl Shared {
    fn update_mod_scale(&self) {
        self.mod_scale
            .set(0.5 * self.mod_depth.get() * self.time.get());
    }

    fn update_mix(&self) {
        let (dry, wet) = dry_wet_gains(self.mix.get());
        self.dry.set(dry);
        self.wet.set(wet);
    }
}

fn param(value: f32) -> ControlValue {
    Arc::new(AtomicParam::new(value))
}

/// Stereo feedback delay with LFO-modulated time.
pub struct DelayPlugin {
    shared: Arc<Shared>,
    ports: Vec<ControlPort>,
    endpoints: AudioEndpoints,
    initialized: bool,
}

impl DelayPlugin {
    pub fn new() -> Self {
        let shared = Arc::new(Shared {
            time: param(0.35),
            feedback: param(0.4),
            mix: param(0.25),
            mod_rate: param(0.5),
            mod_depth: param(0.0),
            mod_scale: param(0.0),
            dry: param(1.0),
            wet: param(0.0),
        });
        shared.update_mod_scale();
        shared.update_mix();

        let mut ports = PortsBuilder::new(PORT_START_INDEX);

        let (get, set) = (Arc::clone(&shared), Arc::clone(&shared));
        ports
            .float("time")
            .name("Delay Time")
            .default(0.35)
            .range(0.01, 2.0)
            .bind(
                move || get.time.get(),
                move |seconds| {
                    set.time.set(seconds);
                    set.update_mod_scale();
                },
            );

        ports
            .float("feedback")
            .name("Feedback")
            .default(0.4)
            .range(0.0, MAX_FEEDBACK)
            .param(Arc::clone(&shared.feedback));

        let (get, set) = (Arc::clone(&shared), Arc::clone(&shared));
        ports
            .float("mix")
            .name("Mix")
            .default(0.25)
            .range(0.0, 1.0)
            .bind(
                move || get.mix.get(),
                move |mix| {
                    set.mix.set(mix);
                    set.update_mix();
                },
            );

        ports
            .float("mod_rate")
            .name("Mod Rate")
            .default(0.5)
            .range(0.01, 10.0)
            .param(Arc::clone(&shared.mod_rate));

        let (get, set) = (Arc::clone(&shared), Arc::clone(&shared));
        ports
            .float("mod_depth")
            .name("Mod Depth")
            .default(0.0)
            .range(0.0, 1.0)
            .bind(
                move || get.mod_depth.get(),
                move |depth| {
                    set.mod_depth.set(depth);
                    set.update_mod_scale();
                },
            );

        Self {
            shared,
            ports: ports.build(),
            endpoints: AudioEndpoints::new(),
            initialized: false,
        }
    }

    /// Set feedback without going through the port (clamped the same way).
    pub fn set_feedback(&self, feedback: f32) {
        let feedback = if feedback.is_finite() {
            feedback.clamp(0.0, MAX_FEEDBACK)
        } else {
            0.0
        };
        self.shared.feedback.set(feedback);
    }

    pub fn feedback(&self) -> f32 {
        self.shared.feedback.get()
    }

    fn build_lane(&self, engine: &mut AudioEngine, time: UnitId) -> Result<(UnitId, UnitId)> {
        let shared = &self.shared;
        let max_samples = engine.config().max_delay_samples();

        let proxy = engine.add(PassThrough::new())?;
        let feedback = engine.add(MultiplyAdd::new())?;
        let line = engine.add(InterpolatingDelay::new(max_samples))?;
        let dry = engine.add(Multiply::new())?;
        let out = engine.add(MultiplyAdd::new())?;

        engine.connect(line.output(), feedback.input(INPUT_A))?;
        engine.bind_constant(feedback.input(INPUT_B), Arc::clone(&shared.feedback))?;
        engine.connect(proxy.output(), feedback.input(INPUT_C))?;

        engine.connect(feedback.output(), line.input(delay::INPUT))?;
        engine.connect(time.output(), line.input(delay::DELAY))?;

        engine.connect(proxy.output(), dry.input(INPUT_A))?;
        engine.bind_constant(dry.input(INPUT_B), Arc::clone(&shared.dry))?;

        engine.connect(line.output(), out.input(INPUT_A))?;
        engine.bind_constant(out.input(INPUT_B), Arc::clone(&shared.wet))?;
        engine.connect(dry.output(), out.input(INPUT_C))?;

        Ok((proxy, out))
    }
}

impl Default for DelayPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl DspPlugin for DelayPlugin {
    fn uri(&self) -> &str {
        URI
    }

    fn initialize(&mut self, engine: &mut AudioEngine) -> Result<()> {
        if self.initialized {
            return Err(Error::AlreadyInitialized(URI.to_string()));
        }
        let shared = Arc::clone(&self.shared);

        let lfo = engine.add(Oscillator::sine())?;
        engine.bind_constant(lfo.input(oscillator::FREQUENCY), Arc::clone(&shared.mod_rate))?;
        let time = engine.add(MultiplyAdd::new())?;
        engine.connect(lfo.output(), time.input(INPUT_A))?;
        engine.bind_constant(time.input(INPUT_B), Arc::clone(&shared.mod_scale))?;
        engine.bind_constant(time.input(INPUT_C), Arc::clone(&shared.time))?;

        let (in_left, out_left) = self.build_lane(engine, time)?;
        let (in_right, out_right) = self.build_lane(engine, time)?;

        self.endpoints.add_input("in_left", in_left.input(0));
        self.endpoints.add_input("in_right", in_right.input(0));
        self.endpoints.add_output("out_left", out_left.output());
        self.endpoints.add_output("out_right", out_right.output());
        self.initialized = true;
        debug!(uri = URI, "plugin initialized");
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

    #[test]
    fn feedback_port_clamps_below_one() {
        let delay = DelayPlugin::new();
        delay.set_port_value("feedback", PortValue::Float(0.999));
        assert_eq!(delay.feedback(), MAX_FEEDBACK);
        delay.set_feedback(f32::NAN);
        assert_eq!(delay.feedback(), 0.0);
    }

    #[test]
    fn dry_signal_passes_when_mix_is_zero() {
        let config = EngineConfig::default().with_sample_rate(1_000.0).with_block_size(8);
        let mut engine = AudioEngine::new(config).unwrap();
        let mut delay = DelayPlugin::new();
        delay.initialize(&mut engine).unwrap();
        delay.set_port_value("mix", PortValue::Float(0.0));

        let out = delay.audio_output("out_left").unwrap();
        engine.set_output(out, out).unwrap();
        engine
            .set_constant(delay.audio_input("in_left").unwrap(), 0.3)
            .unwrap();
        engine.render_block();
        assert_eq!(engine.stereo_block().0, &[0.3; 8]);
    }

    #[test]
    fn echo_arrives_after_delay_time() {
        let config = EngineConfig::default().with_sample_rate(1_000.0).with_block_size(16);
        let mut engine = AudioEngine::new(config).unwrap();
        let mut delay = DelayPlugin::new();
        delay.initialize(&mut engine).unwrap();
        delay.set_port_value("mix", PortValue::Float(1.0));
        delay.set_port_value("feedback", PortValue::Float(0.0));
        delay.set_port_value("time", PortValue::Float(0.01));

        let out = delay.audio_output("out_left").unwrap();
        engine.set_output(out, out).unwrap();
        engine
            .set_constant(delay.audio_input("in_left").unwrap(), 0.5)
            .unwrap();
        engine.render_block();
        let (left, _) = engine.stereo_block();
        assert!(left[..10].iter().all(|&s| s == 0.0));
        assert!(left[10..].iter().all(|&s| (s - 0.5).abs() < 1e-6));
    }
}
