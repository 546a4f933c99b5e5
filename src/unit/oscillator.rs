use crate::dsp::oscillator::{OscillatorWaveform, PhaseAccumulator};
use crate::unit::{AudioUnit, InputSpec, Inputs, RenderCtx};

/*
Oscillator Units
================

    frequency ──┐
                ├──> [ phase → shape ] × amplitude ──> out
    amplitude ──┘

Both inputs may be audio-rate: a connected frequency input gives FM, a
connected amplitude input gives AM. The phase survives every parameter
change and every block boundary, so retuning never clicks (see
`dsp/oscillator.rs`).
*/

const INPUTS: &[InputSpec] = &[
    InputSpec::new("frequency", 440.0),
    InputSpec::new("amplitude", 1.0),
];

pub const FREQUENCY: usize = 0;
pub const AMPLITUDE: usize = 1;

pub struct Oscillator {
    waveform: OscillatorWaveform,
    phase: PhaseAccumulator,
}

impl Oscillator {
    pub fn new(waveform: OscillatorWaveform) -> Self {
        Self {
            waveform,
            phase: PhaseAccumulator::new(),
        }
    }

    pub fn sine() -> Self {
        Self::new(OscillatorWaveform::Sine)
    }

    pub fn square() -> Self {
        Self::new(OscillatorWaveform::Square)
    }

    pub fn triangle() -> Self {
        Self::new(OscillatorWaveform::Triangle)
    }

    pub fn waveform(&self) -> OscillatorWaveform {
        self.waveform
    }
}

impl AudioUnit for Oscillator {
    fn name(&self) -> &'static str {
        match self.waveform {
            OscillatorWaveform::Sine => "SineOscillator",
            OscillatorWaveform::Square => "SquareOscillator",
            OscillatorWaveform::Triangle => "TriangleOscillator",
        }
    }

    fn inputs(&self) -> &'static [InputSpec] {
        INPUTS
    }

    fn render(&mut self, inputs: &Inputs<'_>, out: &mut [f32], ctx: &RenderCtx) {
        let frequency = inputs.get(FREQUENCY);
        let amplitude = inputs.get(AMPLITUDE);
        for (i, sample) in out.iter_mut().enumerate() {
            let phase = self.phase.next(frequency.at(i), ctx.sample_rate);
            *sample = self.waveform.shape(phase) * amplitude.at(i);
        }
    }

    fn reset(&mut self) {
        self.phase.reset();
    }
}
