use crate::dsp::delay::DelayLine;
use crate::graph::mix::DryWet;
use crate::graph::node::{GraphNode, Parameterized, RenderCtx};
use std::f32::consts::TAU;

/*
Chorus Effect
=============

Chorus thickens a sound by mixing the dry signal with a slightly delayed,
pitch-modulated copy. The modulation creates subtle detuning that makes
one voice sound like several playing together.

How It Works
------------

1. Input signal passes through unchanged (dry)
2. A copy is sent through a short delay (a few ms)
3. An LFO modulates the delay time, creating pitch variation
4. Dry and wet signals are mixed together

    delay(t) = base_delay × (1 + depth × sin(2π · rate · t))

As the delay shortens the copy is pitched up slightly, and as it lengthens
it is pitched down, which mimics the natural variation when several
musicians play the same part.

Parameters
----------

Rate (0.1 - 10 Hz):
  LFO speed. Slower = subtle shimmer, faster = vibrato-like wobble.
  Default 1.5 Hz.

Depth (0.0 - 1.0):
  Fraction of the base delay the LFO sweeps through. Default 0.7.

Base Delay (ms):
  Centre of the sweep. Default 3.5 ms.

Mix (0.0 - 1.0):
  Dry/wet blend. Defaults to 0 (bypassed) until the user raises it.
*/

const MAX_CHORUS_DELAY_SECONDS: f32 = 0.05;

/// Parameters that can be set from the control side
#[derive(Clone, Copy, Debug)]
pub enum ChorusParam {
    /// LFO rate in Hz
    Rate,
    /// Modulation depth, 0.0 - 1.0
    Depth,
    /// Centre delay in ms
    DelayTime,
    /// Dry/wet mix
    Mix,
}

/// Chorus effect - thickens sound with modulated delay
pub struct ChorusNode {
    delay_line: DelayLine,
    lfo_phase: f32,
    rate: f32,
    depth: f32,
    base_delay_ms: f32,
    mix: DryWet,
}

impl ChorusNode {
    /// Create a new chorus effect.
    ///
    /// - `rate`: LFO speed in Hz
    /// - `delay_ms`: centre delay in milliseconds
    /// - `depth`: sweep depth as a fraction of the delay (0.0 - 1.0)
    /// - `mix`: dry/wet blend
    pub fn new(rate: f32, delay_ms: f32, depth: f32, mix: f32, sample_rate: f32) -> Self {
        Self {
            delay_line: DelayLine::with_max_seconds(MAX_CHORUS_DELAY_SECONDS, sample_rate),
            lfo_phase: 0.0,
            rate: clamp_rate(rate),
            depth: clamp_depth(depth),
            base_delay_ms: clamp_delay_ms(delay_ms),
            mix: DryWet::new(mix, sample_rate),
        }
    }
}

fn clamp_rate(rate: f32) -> f32 {
    if rate.is_finite() {
        rate.clamp(0.1, 10.0)
    } else {
        0.1
    }
}

fn clamp_depth(depth: f32) -> f32 {
    if depth.is_finite() {
        depth.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn clamp_delay_ms(ms: f32) -> f32 {
    let max_ms = MAX_CHORUS_DELAY_SECONDS * 1000.0 * 0.5;
    if ms.is_finite() {
        ms.clamp(0.5, max_ms)
    } else {
        0.5
    }
}

impl GraphNode for ChorusNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        let sample_rate = ctx.sample_rate;
        let phase_inc = TAU * self.rate / sample_rate;

        for sample in out.iter_mut() {
            let lfo_value = self.lfo_phase.sin();
            let delay_ms = self.base_delay_ms * (1.0 + self.depth * lfo_value);
            let delay_samples = (delay_ms * sample_rate / 1000.0).max(1.0);

            let delayed = self.delay_line.read_interpolated(delay_samples);
            self.delay_line.write(*sample);

            *sample = self.mix.mix(*sample, delayed);

            self.lfo_phase += phase_inc;
            if self.lfo_phase >= TAU {
                self.lfo_phase -= TAU;
            }
        }
    }

    fn reset(&mut self) {
        self.delay_line.reset();
        self.lfo_phase = 0.0;
    }
}

impl Parameterized for ChorusNode {
    type Param = ChorusParam;

    fn get_param(&self, param: Self::Param) -> f32 {
        match param {
            ChorusParam::Rate => self.rate,
            ChorusParam::Depth => self.depth,
            ChorusParam::DelayTime => self.base_delay_ms,
            ChorusParam::Mix => self.mix.wet(),
        }
    }

    fn set_param(&mut self, param: Self::Param, value: f32) {
        match param {
            ChorusParam::Rate => self.rate = clamp_rate(value),
            ChorusParam::Depth => self.depth = clamp_depth(value),
            ChorusParam::DelayTime => self.base_delay_ms = clamp_delay_ms(value),
            ChorusParam::Mix => self.mix.set_wet(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 48_000.0;

    #[test]
    fn dry_when_mix_is_zero() {
        let mut chorus = ChorusNode::new(1.5, 3.5, 0.7, 0.0, SAMPLE_RATE);
        let ctx = RenderCtx::new(SAMPLE_RATE, 0.0);

        let input: Vec<f32> = (0..256).map(|i| (i as f32 * 0.05).sin()).collect();
        let mut buffer = input.clone();
        chorus.render_block(&mut buffer, &ctx);

        assert_eq!(buffer, input);
    }

    #[test]
    fn wet_signal_is_delayed_copy() {
        let mut chorus = ChorusNode::new(1.5, 3.5, 0.0, 1.0, SAMPLE_RATE);
        let ctx = RenderCtx::new(SAMPLE_RATE, 0.0);

        let mut buffer = vec![0.0; 512];
        buffer[0] = 1.0;
        chorus.render_block(&mut buffer, &ctx);

        // 3.5 ms at 48 kHz = 168 samples
        let peak_at = buffer
            .iter()
            .enumerate()
            .fold((0, 0.0f32), |acc, (i, &x)| if x.abs() > acc.1 { (i, x.abs()) } else { acc })
            .0;
        assert_eq!(peak_at, 168);
    }

    #[test]
    fn params_are_clamped() {
        let mut chorus = ChorusNode::new(1.5, 3.5, 0.7, 0.0, SAMPLE_RATE);
        chorus.set_param(ChorusParam::Rate, 100.0);
        chorus.set_param(ChorusParam::Depth, -1.0);
        chorus.set_param(ChorusParam::Mix, 0.4);

        assert_eq!(chorus.get_param(ChorusParam::Rate), 10.0);
        assert_eq!(chorus.get_param(ChorusParam::Depth), 0.0);
        assert_eq!(chorus.get_param(ChorusParam::Mix), 0.4);
    }

    #[test]
    fn output_stays_finite_with_full_depth() {
        let mut chorus = ChorusNode::new(8.0, 20.0, 1.0, 0.5, SAMPLE_RATE);
        let ctx = RenderCtx::new(SAMPLE_RATE, 0.0);
        let mut buffer: Vec<f32> = (0..4_096).map(|i| (i as f32 * 0.01).sin()).collect();
        chorus.render_block(&mut buffer, &ctx);
        assert!(buffer.iter().all(|s| s.is_finite() && s.abs() <= 1.01));
    }
}
