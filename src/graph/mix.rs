use crate::dsp::ramp::LinearRamp;

/*
Wet/Dry Mixing
==============

Every time-based effect in the chain (chorus, delay, reverb) produces a
"wet" signal that is blended with the untouched "dry" input:

    out = dry × (1 - wet) + effect × wet

  - wet = 0.0 → effect bypassed (the default for every effect)
  - wet = 0.5 → equal parts
  - wet = 1.0 → effect only

This is linear crossfading: 50/50 is slightly quieter than either extreme.
For subtle chorus/reverb amounts that dip is inaudible, and the math stays
predictable for tests.

The wet amount itself moves through a short ramp so dragging a mix control
does not zipper.
*/

const WET_RAMP_SECONDS: f32 = 0.02;

pub struct DryWet {
    wet: LinearRamp,
    sample_rate: f32,
}

impl DryWet {
    pub fn new(wet: f32, sample_rate: f32) -> Self {
        Self {
            wet: LinearRamp::new(wet.clamp(0.0, 1.0)),
            sample_rate,
        }
    }

    pub fn set_wet(&mut self, wet: f32) {
        let wet = if wet.is_finite() { wet.clamp(0.0, 1.0) } else { 0.0 };
        self.wet.ramp_to(wet, WET_RAMP_SECONDS, self.sample_rate);
    }

    pub fn wet(&self) -> f32 {
        self.wet.target()
    }

    /// Blend one dry sample with its processed counterpart.
    #[inline]
    pub fn mix(&mut self, dry: f32, processed: f32) -> f32 {
        let wet = self.wet.next_sample();
        dry * (1.0 - wet) + processed * wet
    }
}
