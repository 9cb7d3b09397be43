use crate::{
    dsp::{delay::DelayLine, ramp::LinearRamp},
    graph::{
        mix::DryWet,
        node::{GraphNode, Parameterized, RenderCtx},
    },
};

/*
Feedback Delay
==============

An echo: the input is written into a delay line, and part of what comes out
is fed back in, so each repeat is a quieter copy of the last.

    in ──→(+)──→ [ delay line ] ──┬──→ wet
           ↑                      │
           └──── × feedback ←─────┘

Parameters
----------

Time (seconds, up to MAX_DELAY_SECONDS):
  Gap between repeats. Default 0.25 s. Changes glide over a short ramp; the
  read head slides smoothly, which is heard as a brief tape-style pitch bend
  rather than a click.

Feedback (0.0 - 0.95):
  How much of each repeat returns. Default 0.3. Capped below 1.0 so the
  loop always decays.

Mix (0.0 - 1.0):
  Dry/wet blend. Defaults to 0.
*/

pub const MAX_DELAY_SECONDS: f32 = 1.0;
const MIN_DELAY_SECONDS: f32 = 0.001;
const MAX_FEEDBACK: f32 = 0.95;
const TIME_RAMP_SECONDS: f32 = 0.05;

#[derive(Clone, Copy, Debug)]
pub enum DelayParam {
    /// Delay time in seconds
    Time,
    /// Feedback amount
    Feedback,
    /// Dry/wet mix
    Mix,
}

pub struct DelayNode {
    delay_line: DelayLine,
    delay_samples: LinearRamp,
    feedback: f32,
    mix: DryWet,
    sample_rate: f32,
}

impl DelayNode {
    pub fn new(delay_seconds: f32, feedback: f32, mix: f32, sample_rate: f32) -> Self {
        Self {
            delay_line: DelayLine::with_max_seconds(MAX_DELAY_SECONDS, sample_rate),
            delay_samples: LinearRamp::new(clamp_time(delay_seconds) * sample_rate),
            feedback: clamp_feedback(feedback),
            mix: DryWet::new(mix, sample_rate),
            sample_rate,
        }
    }
}

fn clamp_time(seconds: f32) -> f32 {
    if seconds.is_finite() {
        seconds.clamp(MIN_DELAY_SECONDS, MAX_DELAY_SECONDS)
    } else {
        MIN_DELAY_SECONDS
    }
}

fn clamp_feedback(feedback: f32) -> f32 {
    if feedback.is_finite() {
        feedback.clamp(0.0, MAX_FEEDBACK)
    } else {
        0.0
    }
}

impl GraphNode for DelayNode {
    fn render_block(&mut self, out: &mut [f32], _ctx: &RenderCtx) {
        for sample in out.iter_mut() {
            let delay = self.delay_samples.next_sample();
            let delayed = self.delay_line.read_interpolated(delay);
            self.delay_line.write(*sample + delayed * self.feedback);

            *sample = self.mix.mix(*sample, delayed);
        }
    }

    fn reset(&mut self) {
        self.delay_line.reset();
    }
}

impl Parameterized for DelayNode {
    type Param = DelayParam;

    fn get_param(&self, param: Self::Param) -> f32 {
        match param {
            DelayParam::Time => self.delay_samples.target() / self.sample_rate,
            DelayParam::Feedback => self.feedback,
            DelayParam::Mix => self.mix.wet(),
        }
    }

    fn set_param(&mut self, param: Self::Param, value: f32) {
        match param {
            DelayParam::Time => self.delay_samples.ramp_to(
                clamp_time(value) * self.sample_rate,
                TIME_RAMP_SECONDS,
                self.sample_rate,
            ),
            DelayParam::Feedback => self.feedback = clamp_feedback(value),
            DelayParam::Mix => self.mix.set_wet(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 20.0;

    #[test]
    fn echoes_decay_by_feedback() {
        let mut node = DelayNode::new(0.5, 0.5, 1.0, SAMPLE_RATE);
        let ctx = RenderCtx::new(SAMPLE_RATE, 0.0);

        let mut buffer = vec![0.0; 40];
        buffer[0] = 1.0;
        node.render_block(&mut buffer, &ctx);

        assert!((buffer[10] - 1.0).abs() < 1e-6);
        assert!((buffer[20] - 0.5).abs() < 1e-6);
        assert!((buffer[30] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn feedback_is_capped_below_unity() {
        let mut node = DelayNode::new(0.25, 0.3, 0.0, SAMPLE_RATE);
        node.set_param(DelayParam::Feedback, 2.0);
        assert_eq!(node.get_param(DelayParam::Feedback), MAX_FEEDBACK);
    }

    #[test]
    fn time_is_reported_in_seconds() {
        let mut node = DelayNode::new(0.25, 0.3, 0.0, 48_000.0);
        assert!((node.get_param(DelayParam::Time) - 0.25).abs() < 1e-6);

        node.set_param(DelayParam::Time, 5.0);
        assert_eq!(node.get_param(DelayParam::Time), MAX_DELAY_SECONDS);
    }

    #[test]
    fn dry_signal_passes_when_mix_is_zero() {
        let mut node = DelayNode::new(0.5, 0.5, 0.0, SAMPLE_RATE);
        let ctx = RenderCtx::new(SAMPLE_RATE, 0.0);
        let mut buffer = vec![0.5; 32];
        node.render_block(&mut buffer, &ctx);
        assert!(buffer.iter().all(|&s| s == 0.5));
    }
}
