use crate::dsp::envelope::Envelope;
use crate::unit::{AudioUnit, InputSpec, Inputs, RenderCtx};

const INPUTS: &[InputSpec] = &[
    InputSpec::new("gate", 0.0),
    InputSpec::new("attack", 0.01),
    InputSpec::new("decay", 0.1),
    InputSpec::new("sustain", 0.7),
    InputSpec::new("release", 0.3),
    InputSpec::new("amplitude", 1.0),
];

pub const GATE: usize = 0;
pub const ATTACK: usize = 1;
pub const DECAY: usize = 2;
pub const SUSTAIN: usize = 3;
pub const RELEASE: usize = 4;
pub const AMPLITUDE: usize = 5;

/// Linear ADSR driven by a gate input.
///
/// The gate is examined per sample (> 0.5 is high) so envelopes can be
/// triggered sample-accurately by another unit. Times are control-rate and
/// sampled at the start of each block.
pub struct EnvelopeGenerator {
    envelope: Envelope,
    gate_high: bool,
}

impl EnvelopeGenerator {
    pub fn new() -> Self {
        Self {
            envelope: Envelope::adsr(0.01, 0.1, 0.7, 0.3),
            gate_high: false,
        }
    }
}

impl Default for EnvelopeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioUnit for EnvelopeGenerator {
    fn name(&self) -> &'static str {
        "EnvelopeGenerator"
    }

    fn inputs(&self) -> &'static [InputSpec] {
        INPUTS
    }

    fn render(&mut self, inputs: &Inputs<'_>, out: &mut [f32], ctx: &RenderCtx) {
        self.envelope.set_times(
            inputs.get(ATTACK).at(0),
            inputs.get(DECAY).at(0),
            inputs.get(SUSTAIN).at(0),
            inputs.get(RELEASE).at(0),
        );
        let gate = inputs.get(GATE);
        let amplitude = inputs.get(AMPLITUDE);

        for (i, sample) in out.iter_mut().enumerate() {
            let high = gate.at(i) > 0.5;
            if high && !self.gate_high {
                self.envelope.gate_on();
            } else if !high && self.gate_high {
                self.envelope.gate_off(ctx.sample_rate);
            }
            self.gate_high = high;
            *sample = self.envelope.next_sample(ctx.sample_rate) * amplitude.at(i);
        }
    }

    fn reset(&mut self) {
        self.envelope = Envelope::adsr(0.01, 0.1, 0.7, 0.3);
        self.gate_high = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::test_util::render;
    use crate::unit::Signal;

    fn signals(gate: f32) -> [Signal<'static>; 6] {
        [
            Signal::Constant(gate),
            Signal::Constant(0.01),
            Signal::Constant(0.01),
            Signal::Constant(0.5),
            Signal::Constant(0.02),
            Signal::Constant(1.0),
        ]
    }

    #[test]
    fn gate_opens_and_closes() {
        let mut env = EnvelopeGenerator::new();
        let held = render(&mut env, &signals(1.0), 50);
        assert!((held[49] - 0.5).abs() < 1e-3, "should sit at sustain");

        let released = render(&mut env, &signals(0.0), 30);
        assert_eq!(released[29], 0.0);
        assert!(released[0] < 0.5);
    }

    #[test]
    fn silent_without_gate() {
        let mut env = EnvelopeGenerator::new();
        assert!(render(&mut env, &signals(0.0), 16).iter().all(|&s| s == 0.0));
    }
}
