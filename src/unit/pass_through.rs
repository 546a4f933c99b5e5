use crate::unit::{AudioUnit, InputSpec, Inputs, RenderCtx};

/*
PassThrough
===========

An identity unit: out = in. It exists purely as a patch point.

Downstream units connect to the PassThrough's output once, at setup time.
Re-patching then only ever touches the PassThrough's single input:

    [branch A] ─┐
    [branch B] ─┼─(one of)─> [PassThrough] ──> consumers (never rewired)
    [constant] ─┘

When nothing is connected the input's constant is passed through instead,
which is how a plugin parks its output at a fixed value.
*/

const INPUTS: &[InputSpec] = &[InputSpec::new("input", 0.0)];

pub const INPUT: usize = 0;

#[derive(Default)]
pub struct PassThrough;

impl PassThrough {
    pub fn new() -> Self {
        Self
    }
}

impl AudioUnit for PassThrough {
    fn name(&self) -> &'static str {
        "PassThrough"
    }

    fn inputs(&self) -> &'static [InputSpec] {
        INPUTS
    }

    fn render(&mut self, inputs: &Inputs<'_>, out: &mut [f32], _ctx: &RenderCtx) {
        let input = inputs.get(INPUT);
        for (i, sample) in out.iter_mut().enumerate() {
            *sample = input.at(i);
        }
    }
}
