//! Peak tracking with exponential release.

/*
Peak Following
==============

A meter wants "how loud is it right now", updated every sample, without
flickering. A peak follower jumps UP instantly to any larger magnitude and
decays DOWN exponentially otherwise:

    peak = max(|x|, peak · k)

Half-Life
---------

The decay constant k comes from a half-life: the time for an unrefreshed
peak to fall to 50%. After h seconds (h · sample_rate samples) we need

    k^(h · sample_rate) = 0.5
    k = 0.5^(1 / (h · sample_rate))

    half-life   k at 48 kHz
    10 ms       0.99856
    100 ms      0.999856
    1 s         0.9999856
*/

/// Per-sample decay factor for a half-life in seconds.
///
/// A non-positive half-life means "no memory" (k = 0).
#[inline]
pub fn decay_per_sample(half_life: f32, sample_rate: f32) -> f32 {
    if !half_life.is_finite() || half_life <= 0.0 {
        return 0.0;
    }
    0.5_f32.powf(1.0 / (half_life * sample_rate))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PeakDetector {
    peak: f32,
}

impl PeakDetector {
    pub fn new() -> Self {
        Self { peak: 0.0 }
    }

    #[inline]
    pub fn next(&mut self, sample: f32, decay: f32) -> f32 {
        let magnitude = sample.abs();
        let decayed = self.peak * decay;
        self.peak = if magnitude > decayed { magnitude } else { decayed };
        self.peak
    }

    pub fn peak(&self) -> f32 {
        self.peak
    }
}
