//! Polarity conversion and Boolean-style logic on control signals.

/*
Combining Two LFOs With Logic
=============================

A "duo" LFO runs two low-frequency oscillators and merges them into one
control signal. Instead of adding them, it combines them LOGICALLY: the
output is "high" when both are high (AND) or when either is high (OR).

Vocabulary
----------

  bipolar       Output swings positive AND negative: -1.0 to +1.0.
                This is what the oscillators produce.

  unipolar      Output is only positive: 0.0 to 1.0.
                Probability-style logic only works in this domain.

  fuzzy logic   Boolean operators generalized to values between 0 and 1.
                At the extremes (0 and 1) they agree with true/false logic.


Bipolar to Unipolar Conversion
------------------------------

    unipolar = bipolar * 0.5 + 0.5
    bipolar  = unipolar * 2.0 - 1.0

    bipolar   unipolar
    -1.0      0.0
     0.0      0.5
    +1.0      1.0


Square Waves: Product Logic
---------------------------

A square wave is either fully low or fully high, so in the unipolar domain
it is a true Boolean. The product forms reproduce the truth table exactly:

    AND(a, b) = a * b
    OR(a, b)  = a + b - a * b

      a  b | AND  OR
      0  0 |  0    0
      0  1 |  0    1
      1  0 |  0    1
      1  1 |  1    1

The signal path is therefore: convert both to unipolar, combine, convert the
result back to bipolar.


Triangle Waves: MIN / MAX
-------------------------

For continuous shapes the product forms bend the waveform (a * b of two
triangles is a parabola-ish curve). The classic fuzzy-logic substitute is

    AND(a, b) = min(a, b)
    OR(a, b)  = max(a, b)

MIN/MAX commute with the affine polarity conversion, so no unipolar detour
is needed: min(triA, triB) on bipolar signals IS the AND. It is also exact
and click-free - the output is always one of the two inputs, so it can never
overshoot the input range.
*/

/// Convert bipolar signal (-1.0 to +1.0) to unipolar (0.0 to 1.0).
#[inline]
pub fn bipolar_to_unipolar(bipolar: f32) -> f32 {
    bipolar * 0.5 + 0.5
}

/// Convert unipolar signal (0.0 to 1.0) to bipolar (-1.0 to +1.0).
#[inline]
pub fn unipolar_to_bipolar(unipolar: f32) -> f32 {
    unipolar * 2.0 - 1.0
}

/// Product AND of two unipolar values.
#[inline]
pub fn logic_and(a: f32, b: f32) -> f32 {
    a * b
}

/// Product OR of two unipolar values.
#[inline]
pub fn logic_or(a: f32, b: f32) -> f32 {
    a + b - a * b
}

/// Calculate samples per LFO period.
///
/// # Example
/// ```
/// use orpheus_dsp::dsp::lfo::samples_per_period;
/// let samples = samples_per_period(5.0, 48000.0);
/// assert_eq!(samples, 9600.0); // 5 Hz at 48kHz = 9600 samples
/// ```
#[inline]
pub fn samples_per_period(frequency_hz: f32, sample_rate: f32) -> f32 {
    sample_rate / frequency_hz
}
