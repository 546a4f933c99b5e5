use std::sync::Arc;

use crate::atomic::{AtomicParam, ControlValue};
use crate::dsp::follower::{decay_per_sample, PeakDetector};
use crate::unit::{AudioUnit, InputSpec, Inputs, RenderCtx};

const INPUTS: &[InputSpec] = &[
    InputSpec::new("input", 0.0),
    InputSpec::new("half_life", 0.1),
];

pub const INPUT: usize = 0;
pub const HALF_LIFE: usize = 1;

/// Tracks a decaying envelope of input magnitude.
///
/// The output is the per-sample peak; the last value of every block is also
/// published to a shared meter any thread can read.
pub struct PeakFollower {
    detector: PeakDetector,
    meter: ControlValue,
}

impl PeakFollower {
    pub fn new() -> Self {
        Self::with_meter(Arc::new(AtomicParam::new(0.0)))
    }

    /// Publish into an existing meter (e.g. one a plugin created up front).
    pub fn with_meter(meter: ControlValue) -> Self {
        Self {
            detector: PeakDetector::new(),
            meter,
        }
    }

    /// Shared handle to the most recent peak.
    pub fn meter(&self) -> ControlValue {
        Arc::clone(&self.meter)
    }
}

impl Default for PeakFollower {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioUnit for PeakFollower {
    fn name(&self) -> &'static str {
        "PeakFollower"
    }

    fn inputs(&self) -> &'static [InputSpec] {
        INPUTS
    }

    fn render(&mut self, inputs: &Inputs<'_>, out: &mut [f32], ctx: &RenderCtx) {
        let input = inputs.get(INPUT);
        // Half-life is a control-rate parameter: sampled once per block
        let decay = decay_per_sample(inputs.get(HALF_LIFE).at(0), ctx.sample_rate);
        for (i, sample) in out.iter_mut().enumerate() {
            *sample = self.detector.next(input.at(i), decay);
        }
        self.meter.set(self.detector.peak());
    }

    fn reset(&mut self) {
        self.detector = PeakDetector::new();
        self.meter.set(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::test_util::render;
    use crate::unit::Signal;

    #[test]
    fn publishes_decaying_peak() {
        let mut follower = PeakFollower::new();
        let meter = follower.meter();

        let mut impulse = [0.0f32; 100];
        impulse[0] = -0.8;
        let out = render(&mut follower, &[Signal::Buffer(&impulse), Signal::Constant(0.1)], 100);

        assert_eq!(out[0], 0.8);
        // 100 samples at 1 kHz is exactly one half-life after the impulse
        assert!((out[99] - 0.8 * 0.5f32.powf(99.0 / 100.0)).abs() < 1e-3);
        assert_eq!(meter.get(), out[99]);
    }

    #[test]
    fn reset_clears_meter() {
        let mut follower = PeakFollower::new();
        render(&mut follower, &[Signal::Constant(0.5)], 4);
        assert!(follower.meter().get() > 0.0);
        follower.reset();
        assert_eq!(follower.meter().get(), 0.0);
    }
}
