//! Phase accumulator and waveform shapes.

/*
Phase Accumulation
==================

Every periodic oscillator in this crate is a phase accumulator followed by a
shaping function. The accumulator counts "how far through one cycle" we are
as a number in [0, 1):

    phase[n+1] = fract(phase[n] + frequency / sample_rate)

The shaping function then maps phase to amplitude:

    sine      sin(2π · phase)
    square    +1 for phase < 0.5, -1 otherwise
    triangle  starts at -1, rises to +1 at phase 0.5, falls back to -1

      +1 ┐  ___        /\          /\
         │ |   |      /  \        /  \
       0 ┼─|───|───  /────\──    /────\──
         │     |___ /      \    /      \
      -1 ┘         /        \  /        \/
          square        triangle

All three are bipolar (-1..+1), which is what the Duo-LFO logic expects.


Zero-Click Parameter Changes
----------------------------

The phase is the ONLY state. Changing frequency changes the increment, never
the phase itself, so the waveform continues from exactly where it was - no
discontinuity, no click. Phase is never reset by a parameter change.


Negative and Extreme Frequencies
--------------------------------

Frequency-modulated oscillators can be driven below zero (through-zero FM).
The accumulator wraps in both directions, so a negative increment simply
runs the waveform backwards. Increments are clamped to ±0.5 cycles per
sample (Nyquist) and a non-finite frequency is treated as 0 Hz, so a bad
modulation value can stall an oscillator but never poison its phase.
*/

use std::f32::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OscillatorWaveform {
    Sine,
    Square,
    Triangle,
}

impl OscillatorWaveform {
    /// Map a phase in [0, 1) to a bipolar amplitude.
    #[inline]
    pub fn shape(self, phase: f32) -> f32 {
        match self {
            OscillatorWaveform::Sine => (TAU * phase).sin(),
            OscillatorWaveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            OscillatorWaveform::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PhaseAccumulator {
    phase: f32,
}

impl PhaseAccumulator {
    pub fn new() -> Self {
        Self { phase: 0.0 }
    }

    /// Current phase in [0, 1).
    #[inline]
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Return the current phase, then advance by one sample.
    #[inline]
    pub fn next(&mut self, frequency: f32, sample_rate: f32) -> f32 {
        let current = self.phase;
        let increment = if frequency.is_finite() {
            (frequency / sample_rate).clamp(-0.5, 0.5)
        } else {
            0.0
        };
        let mut next = current + increment;
        if next >= 1.0 {
            next -= 1.0;
        } else if next < 0.0 {
            next += 1.0;
        }
        self.phase = next;
        current
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}
