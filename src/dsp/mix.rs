//! Panning and dry/wet gain laws.

/*
Equal-Power Panning
===================

Placing a mono source in a stereo field means choosing a left gain and a
right gain from a single pan value p in [-1, +1] (hard left .. hard right).

Vocabulary
----------

  pan           Stereo position. -1 = hard left, 0 = center, +1 = hard right.

  gain law      The curve mapping pan to the two channel gains.

  power         Perceived loudness follows signal POWER (amplitude squared),
                not amplitude. Two uncorrelated speakers add their powers.


Linear vs Equal-Power
---------------------

LINEAR:

    left  = (1 - p) / 2
    right = (1 + p) / 2

    At center both gains are 0.5: power = 0.25 + 0.25 = 0.5
    The source DIPS about 3 dB as it passes through the middle.

EQUAL-POWER (what we implement):

    angle = ((p + 1) / 2) · (π / 2)
    left  = cos(angle)
    right = sin(angle)

    left² + right² = cos² + sin² = 1   for every pan value

      pan    angle    left     right
      -1     0        1.0      0.0
       0     π/4      0.7071   0.7071
      +1     π/2      0.0      1.0

Constant power means a voice sweeping across the field keeps the same
loudness the whole way.


Dry/Wet
-------

Effects blend the unprocessed (dry) signal with the processed (wet) one
using a linear crossfade whose weights sum to 1:

    out = dry · (1 - mix) + wet · mix
*/

use std::f32::consts::FRAC_PI_2;

/// Equal-power gains for a pan position.
///
/// Pan values outside [-1, 1] are clamped. Returns `(left, right)`.
#[inline]
pub fn equal_power_gains(pan: f32) -> (f32, f32) {
    let pan = if pan.is_finite() {
        pan.clamp(-1.0, 1.0)
    } else {
        0.0
    };
    let angle = ((pan + 1.0) * 0.5) * FRAC_PI_2;
    (angle.cos(), angle.sin())
}

/// Linear crossfade weights `(dry, wet)` for a mix amount in [0, 1].
#[inline]
pub fn dry_wet_gains(mix: f32) -> (f32, f32) {
    let mix = mix.clamp(0.0, 1.0);
    (1.0 - mix, mix)
}
