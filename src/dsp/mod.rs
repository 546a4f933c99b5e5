//! Low-level DSP primitives used by the audio units.
//!
//! These components are allocation-free and realtime-safe, making them safe to
//! embed directly inside unit structs. They intentionally stay focused on the
//! signal-processing math so the unit layer can concentrate on wiring.

/// Time-domain delay line with fractional (interpolated) reads.
pub mod delay;
/// Soft clipping and non-finite guards.
pub mod distortion;
/// Attack/decay/sustain/release envelope generator.
pub mod envelope;
/// Exponential peak tracking for meters.
pub mod follower;
/// Polarity conversion and Boolean-style signal logic.
pub mod lfo;
/// Equal-power panning and dry/wet gain laws.
pub mod mix;
/// Phase accumulator and bipolar waveforms.
pub mod oscillator;

pub use envelope::EnvelopeState;
