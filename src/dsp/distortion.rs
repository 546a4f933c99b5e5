//! Waveshaping and signal guards.
//!
//! # Soft Clip
//!
//! A waveshaper applies a transfer function to each sample:
//!   output = f(input * drive)
//!
//! We use the rational soft clip
//!   f(x) = x / (1 + |x|)
//! which compresses peaks smoothly towards ±1 and never exceeds that range,
//! whatever the drive.
//!
//! # Drive Values
//!
//!   1.0  = Gentle (0.5 in → 0.33 out)
//!   2-4  = Warm saturation
//!   5-10 = Obvious distortion
//!   10+  = Heavy, aggressive
//!
//! # Guards
//!
//! Feedback loops and frequency maths can produce NaN or infinity. The
//! engine runs every unit's output through [`flush_non_finite`] and the final
//! stereo pair through [`hard_clip`] before anything reaches a device.

/// Soft clipping using x / (1 + |x|) transfer function.
#[inline]
pub fn soft_clip(sample: f32, drive: f32) -> f32 {
    let x = sample * drive;
    x / (1.0 + x.abs())
}

/// Clamp to ±threshold, mapping NaN and infinities to silence.
#[inline]
pub fn hard_clip(sample: f32, threshold: f32) -> f32 {
    if sample.is_finite() {
        sample.clamp(-threshold, threshold)
    } else {
        0.0
    }
}

/// Replace NaN/infinite samples with 0 and bound the rest to ±limit.
#[inline]
pub fn flush_non_finite(buffer: &mut [f32], limit: f32) {
    for sample in buffer.iter_mut() {
        *sample = hard_clip(*sample, limit);
    }
}
