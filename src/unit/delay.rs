use crate::dsp::delay::DelayLine;
use crate::unit::{AudioUnit, InputSpec, Inputs, RenderCtx};

const INPUTS: &[InputSpec] = &[
    InputSpec::new("input", 0.0),
    InputSpec::new("delay", 0.0),
];

pub const INPUT: usize = 0;
/// Delay time in seconds, read per sample (may be modulated).
pub const DELAY: usize = 1;

/// Delay line with a modulatable, fractional delay time.
///
/// Per sample the input is written first and the delayed value read second,
/// so a delay of 0 passes the input straight through.
pub struct InterpolatingDelay {
    line: DelayLine,
}

impl InterpolatingDelay {
    /// `max_samples` bounds the longest delay (see `EngineConfig::max_delay_samples`).
    pub fn new(max_samples: usize) -> Self {
        Self {
            line: DelayLine::new(max_samples),
        }
    }
}

impl AudioUnit for InterpolatingDelay {
    fn name(&self) -> &'static str {
        "InterpolatingDelay"
    }

    fn inputs(&self) -> &'static [InputSpec] {
        INPUTS
    }

    fn render(&mut self, inputs: &Inputs<'_>, out: &mut [f32], ctx: &RenderCtx) {
        let input = inputs.get(INPUT);
        let delay = inputs.get(DELAY);
        for (i, sample) in out.iter_mut().enumerate() {
            let delay_samples = delay.at(i) * ctx.sample_rate;
            *sample = self.line.process(input.at(i), delay_samples);
        }
    }

    fn reset(&mut self) {
        self.line.reset();
    }
}
