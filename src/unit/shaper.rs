use crate::dsp::distortion::soft_clip;
use crate::unit::{AudioUnit, InputSpec, Inputs, RenderCtx};

const INPUTS: &[InputSpec] = &[
    InputSpec::new("input", 0.0),
    InputSpec::new("drive", 1.0),
];

pub const INPUT: usize = 0;
pub const DRIVE: usize = 1;

/// Rational soft clipper, `x·d / (1 + |x·d|)`.
#[derive(Debug, Default)]
pub struct SoftClipper;

impl SoftClipper {
    pub fn new() -> Self {
        Self
    }
}

impl AudioUnit for SoftClipper {
    fn name(&self) -> &'static str {
        "SoftClipper"
    }

    fn inputs(&self) -> &'static [InputSpec] {
        INPUTS
    }

    fn render(&mut self, inputs: &Inputs<'_>, out: &mut [f32], _ctx: &RenderCtx) {
        let input = inputs.get(INPUT);
        let drive = inputs.get(DRIVE);
        for (i, sample) in out.iter_mut().enumerate() {
            *sample = soft_clip(input.at(i), drive.at(i));
        }
    }
}
