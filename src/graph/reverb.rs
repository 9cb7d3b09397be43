use crate::dsp::reverb::SchroederReverb;
use crate::graph::mix::DryWet;
use crate::graph::node::{GraphNode, Parameterized, RenderCtx};

/*
Reverb Node
===========

Simulates the acoustic reflections of a physical space. Reverb adds depth,
dimension, and "glue" to sounds, making them feel like they exist in a room.

When sound bounces off walls, floor, and ceiling, you hear:
1. Direct sound (original signal)
2. Early reflections (first few bounces, give sense of room size)
3. Reverb tail (dense wash of many reflections, decays over time)

Parameters
----------

Decay (seconds):
  Time for the tail to fall 60 dB. Default 2.5 s. The user-facing "size"
  control maps 0.0 - 1.0 onto 0.5 - 10 s (see EffectController).

Dampening (Hz):
  Cutoff of the lowpass inside the feedback loop. Lower = darker tail.

Pre-delay (seconds):
  Gap before the tail starts. Fixed at 10 ms.

Mix (0.0 - 1.0):
  Dry/wet blend. Defaults to 0.
*/

pub const PRE_DELAY_SECONDS: f32 = 0.01;

/// Parameters that can be set from the control side
#[derive(Clone, Copy, Debug)]
pub enum ReverbParam {
    /// Decay time in seconds
    Decay,
    /// Damping cutoff in Hz
    Dampening,
    /// Dry/wet mix (0.0 = dry, 1.0 = wet)
    Mix,
}

/// Schroeder reverb effect
pub struct ReverbNode {
    reverb: SchroederReverb,
    mix: DryWet,
}

impl ReverbNode {
    pub fn new(decay_seconds: f32, mix: f32, sample_rate: f32) -> Self {
        let mut reverb = SchroederReverb::new(sample_rate, decay_seconds);
        reverb.set_pre_delay_seconds(PRE_DELAY_SECONDS);

        Self {
            reverb,
            mix: DryWet::new(mix, sample_rate),
        }
    }
}

impl GraphNode for ReverbNode {
    fn render_block(&mut self, out: &mut [f32], _ctx: &RenderCtx) {
        for sample in out.iter_mut() {
            let dry = *sample;
            let wet = self.reverb.process(dry);
            *sample = self.mix.mix(dry, wet);
        }
    }

    fn reset(&mut self) {
        self.reverb.reset();
    }
}

impl Parameterized for ReverbNode {
    type Param = ReverbParam;

    fn get_param(&self, param: Self::Param) -> f32 {
        match param {
            ReverbParam::Decay => self.reverb.decay_seconds(),
            ReverbParam::Dampening => self.reverb.dampening_hz(),
            ReverbParam::Mix => self.mix.wet(),
        }
    }

    fn set_param(&mut self, param: Self::Param, value: f32) {
        match param {
            ReverbParam::Decay => self.reverb.set_decay_seconds(value),
            ReverbParam::Dampening => self.reverb.set_dampening_hz(value),
            ReverbParam::Mix => self.mix.set_wet(value),
        }
    }
}
