/*
Decibels
========

Loudness controls are expressed in decibels because hearing is roughly
logarithmic. Amplitude and dB convert with:

    linear = 10 ^ (dB / 20)        dB = 20 · log10(linear)

       0 dB  → 1.0
      -6 dB  → ~0.5
     -60 dB  → 0.001   (treated as the floor of the volume control)

A 0-100 % volume control spreads over that 60 dB range linearly in dB, so
each step of the control sounds like the same change in loudness.
*/

/// Bottom of the volume control's range.
pub const VOLUME_FLOOR_DB: f32 = -60.0;

#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    10.0f32.powf(db / 20.0)
}

/// Map a 0-100 % control to -60 dB..0 dB. Out-of-range input is clamped.
pub fn percent_to_db(percent: f32) -> f32 {
    let percent = if percent.is_finite() {
        percent.clamp(0.0, 100.0)
    } else {
        0.0
    };
    percent / 100.0 * -VOLUME_FLOOR_DB + VOLUME_FLOOR_DB
}
