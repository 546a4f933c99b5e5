//! Primitive audio units.
//!
//! An audio unit computes one block of samples per call from its inputs. Each
//! unit declares a fixed list of named inputs and produces exactly one output.
//! Units never see the graph: the engine resolves every input to either a
//! constant or the output buffer of the connected source before calling
//! [`AudioUnit::render`].

use std::fmt;

/// Sums, products and comparisons.
pub mod arithmetic;
/// Fractional delay line unit.
pub mod delay;
/// Gate-driven ADSR unit.
pub mod envelope;
/// Sine, square and triangle oscillators.
pub mod oscillator;
/// Identity unit used as a stable patch point.
pub mod pass_through;
/// Decaying magnitude tracker for meters.
pub mod peak_follower;
/// Soft-clip waveshaper.
pub mod shaper;

pub use arithmetic::{Add, Maximum, Minimum, Multiply, MultiplyAdd};
pub use delay::InterpolatingDelay;
pub use envelope::EnvelopeGenerator;
pub use oscillator::Oscillator;
pub use pass_through::PassThrough;
pub use peak_follower::PeakFollower;
pub use shaper::SoftClipper;

/// Most inputs a single unit may declare.
pub const MAX_UNIT_INPUTS: usize = 8;

/// Identity of a unit inside one engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(pub(crate) usize);

impl UnitId {
    pub fn index(self) -> usize {
        self.0
    }

    /// The unit's single output.
    pub fn output(self) -> OutputId {
        OutputId(self)
    }

    /// Input by position in the unit's [`InputSpec`] list.
    pub fn input(self, index: usize) -> InputId {
        InputId { unit: self, index }
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One input of one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputId {
    pub unit: UnitId,
    pub index: usize,
}

/// The output of one unit. Outputs fan out to any number of inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutputId(pub UnitId);

impl OutputId {
    pub fn unit(self) -> UnitId {
        self.0
    }
}

/// Static description of one unit input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputSpec {
    pub name: &'static str,
    /// Constant used until something is connected or the constant is set.
    pub default: f32,
}

impl InputSpec {
    pub const fn new(name: &'static str, default: f32) -> Self {
        Self { name, default }
    }
}

/// Context passed to units during rendering.
#[derive(Debug, Clone, Copy)]
pub struct RenderCtx {
    pub sample_rate: f32,
    /// Absolute frame index of the first sample in this block.
    pub frame: u64,
}

impl RenderCtx {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            frame: 0,
        }
    }
}

/// The value an input presents for the current block.
#[derive(Debug, Clone, Copy)]
pub enum Signal<'a> {
    /// Unconnected input: the same value for every frame.
    Constant(f32),
    /// Connected input: the source's output for this block.
    Buffer(&'a [f32]),
}

impl Signal<'_> {
    #[inline]
    pub fn at(&self, frame: usize) -> f32 {
        match self {
            Signal::Constant(value) => *value,
            Signal::Buffer(buffer) => buffer.get(frame).copied().unwrap_or(0.0),
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Signal::Buffer(_))
    }
}

/// Resolved inputs handed to [`AudioUnit::render`].
pub struct Inputs<'a> {
    signals: &'a [Signal<'a>],
}

impl<'a> Inputs<'a> {
    pub fn new(signals: &'a [Signal<'a>]) -> Self {
        Self { signals }
    }

    /// Signal for input `index`; missing inputs read as silence.
    #[inline]
    pub fn get(&self, index: usize) -> Signal<'a> {
        self.signals
            .get(index)
            .copied()
            .unwrap_or(Signal::Constant(0.0))
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}

/// Core trait for signal-processing nodes owned by the engine.
///
/// `render` runs on the audio thread: it must not allocate, lock or panic.
pub trait AudioUnit: Send {
    /// Type name, used in logs and errors.
    fn name(&self) -> &'static str;

    /// Declared inputs, in index order.
    fn inputs(&self) -> &'static [InputSpec];

    /// Compute one block into `out` (`out.len()` frames).
    fn render(&mut self, inputs: &Inputs<'_>, out: &mut [f32], ctx: &RenderCtx);

    /// Clear internal state (phase, memory). Default does nothing.
    fn reset(&mut self) {}

    /// Position of the input called `name`.
    fn input_index(&self, name: &str) -> Option<usize> {
        self.inputs().iter().position(|spec| spec.name == name)
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use super::*;

    pub const SAMPLE_RATE: f32 = 1_000.0;

    /// Render `frames` samples of `unit` against the given input signals.
    pub fn render<U: AudioUnit>(unit: &mut U, signals: &[Signal<'_>], frames: usize) -> Vec<f32> {
        let mut out = vec![0.0; frames];
        let inputs = Inputs::new(signals);
        unit.render(&inputs, &mut out, &RenderCtx::new(SAMPLE_RATE));
        out
    }
}
