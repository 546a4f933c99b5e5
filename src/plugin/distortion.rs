use std::sync::Arc;

use tracing::debug;

use crate::atomic::{AtomicParam, ControlValue};
use crate::dsp::mix::dry_wet_gains;
use crate::engine::AudioEngine;
use crate::error::{Error, Result};
use crate::plugin::{AudioEndpoints, DspPlugin};
use crate::port::{ControlPort, PortsBuilder};
use crate::unit::arithmetic::{INPUT_A, INPUT_B, INPUT_C};
use crate::unit::{shaper, Multiply, MultiplyAdd, PassThrough, SoftClipper, UnitId};

pub const URI: &str = "org.orpheus.distortion";
const PORT_START_INDEX: u32 = 180;

/// Stereo soft-clip drive with a dry/wet blend.
///
/// Per lane: `out = softclip(in · drive) · wet + in · dry`.
pub struct DistortionPlugin {
    drive: ControlValue,
    mix: ControlValue,
    dry: ControlValue,
    wet: ControlValue,
    ports: Vec<ControlPort>,
    endpoints: AudioEndpoints,
    initialized: bool,
}

impl DistortionPlugin {
    pub fn new() -> Self {
        let drive = Arc::new(AtomicParam::new(1.0));
        let mix = Arc::new(AtomicParam::new(0.0));
        let dry = Arc::new(AtomicParam::new(1.0));
        let wet = Arc::new(AtomicParam::new(0.0));

        let mut ports = PortsBuilder::new(PORT_START_INDEX);
        ports
            .float("drive")
            .name("Drive")
            .default(1.0)
            .range(1.0, 20.0)
            .param(Arc::clone(&drive));

        let get = Arc::clone(&mix);
        let (set, dry_gain, wet_gain) = (Arc::clone(&mix), Arc::clone(&dry), Arc::clone(&wet));
        ports
            .float("mix")
            .name("Mix")
            .default(0.0)
            .range(0.0, 1.0)
            .bind(
                move || get.get(),
                move |amount| {
                    set.set(amount);
                    let (d, w) = dry_wet_gains(amount);
                    dry_gain.set(d);
                    wet_gain.set(w);
                },
            );

        Self {
            drive,
            mix,
            dry,
            wet,
            ports: ports.build(),
            endpoints: AudioEndpoints::new(),
            initialized: false,
        }
    }

    pub fn mix(&self) -> f32 {
        self.mix.get()
    }

    fn build_lane(&self, engine: &mut AudioEngine) -> Result<(UnitId, UnitId)> {
        let proxy = engine.add(PassThrough::new())?;
        let clipper = engine.add(SoftClipper::new())?;
        let dry = engine.add(Multiply::new())?;
        let out = engine.add(MultiplyAdd::new())?;

        engine.connect(proxy.output(), clipper.input(shaper::INPUT))?;
        engine.bind_constant(clipper.input(shaper::DRIVE), Arc::clone(&self.drive))?;

        engine.connect(proxy.output(), dry.input(INPUT_A))?;
        engine.bind_constant(dry.input(INPUT_B), Arc::clone(&self.dry))?;

        engine.connect(clipper.output(), out.input(INPUT_A))?;
        engine.bind_constant(out.input(INPUT_B), Arc::clone(&self.wet))?;
        engine.connect(dry.output(), out.input(INPUT_C))?;
        Ok((proxy, out))
    }
}

impl Default for DistortionPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl DspPlugin for DistortionPlugin {
    fn uri(&self) -> &str {
        URI
    }

    fn initialize(&mut self, engine: &mut AudioEngine) -> Result<()> {
        if self.initialized {
            return Err(Error::AlreadyInitialized(URI.to_string()));
        }
        let (in_left, out_left) = self.build_lane(engine)?;
        let (in_right, out_right) = self.build_lane(engine)?;

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
