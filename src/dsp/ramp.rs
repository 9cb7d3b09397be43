/*
Linear Ramps
============

Setting an audio parameter instantly (gain, cutoff, pitch) produces a step in
the signal, and steps are heard as clicks or "zipper" noise. A ramp moves the
value to its target over a fixed number of samples instead.

    value
      T ┤          ╭──────
        │        ╱
        │      ╱
      S ┤────╯
        └────┴────┴──────→ samples
           set   reached

The increment is computed once when the target changes:

    increment = (target - current) / (time_seconds * sample_rate)

and the ramp snaps to the exact target on its last step so rounding error
never accumulates.
*/

/// A value that moves linearly toward a target over a fixed time.
#[derive(Debug, Clone)]
pub struct LinearRamp {
    current: f32,
    target: f32,
    increment: f32,
    samples_remaining: u32,
}

impl LinearRamp {
    pub fn new(initial: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            increment: 0.0,
            samples_remaining: 0,
        }
    }

    /// Ramp from the current value to `target` over `seconds`.
    ///
    /// A zero-length ramp jumps immediately.
    pub fn ramp_to(&mut self, target: f32, seconds: f32, sample_rate: f32) {
        self.target = target;
        let samples = (seconds.max(0.0) * sample_rate).round() as u32;
        if samples == 0 {
            self.set_immediate(target);
        } else {
            self.increment = (target - self.current) / samples as f32;
            self.samples_remaining = samples;
        }
    }

    /// Jump to `value` and cancel any ramp in flight.
    pub fn set_immediate(&mut self, value: f32) {
        self.current = value;
        self.target = value;
        self.increment = 0.0;
        self.samples_remaining = 0;
    }

    /// Advance one sample and return the new value.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        if self.samples_remaining > 0 {
            self.current += self.increment;
            self.samples_remaining -= 1;
            if self.samples_remaining == 0 {
                self.current = self.target;
            }
        }
        self.current
    }

    #[inline]
    pub fn value(&self) -> f32 {
        self.current
    }

    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    #[inline]
    pub fn is_settled(&self) -> bool {
        self.samples_remaining == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ramp_reaches_target_exactly() {
        let mut ramp = LinearRamp::new(0.0);
        ramp.ramp_to(1.0, 0.01, 1_000.0); // 10 samples

        for _ in 0..9 {
            ramp.next_sample();
        }
        assert!(!ramp.is_settled());
        assert!(ramp.value() < 1.0);

        assert_eq!(ramp.next_sample(), 1.0);
        assert!(ramp.is_settled());
    }

    #[test]
    fn zero_time_ramp_jumps() {
        let mut ramp = LinearRamp::new(0.5);
        ramp.ramp_to(0.0, 0.0, 48_000.0);
        assert_eq!(ramp.value(), 0.0);
        assert!(ramp.is_settled());
    }

    #[test]
    fn retarget_mid_ramp_starts_from_current_value() {
        let mut ramp = LinearRamp::new(0.0);
        ramp.ramp_to(1.0, 0.01, 1_000.0);
        for _ in 0..5 {
            ramp.next_sample();
        }
        let midpoint = ramp.value();
        ramp.ramp_to(0.0, 0.005, 1_000.0);
        let first = ramp.next_sample();
        assert!(first < midpoint, "ramp should head down from {midpoint}, got {first}");
    }
}
