use crate::{
    dsp::filter::{FilterType, SVFilter},
    graph::node::{GraphNode, Parameterized, RenderCtx},
};

/*
State-Variable Filter (SVF)
===========================

The first stage of the shared effect chain. Every voice is summed and then
filtered together, which is how the classic "master filter" sweep works: one
cutoff knob darkens or opens up everything that is playing.

Filter Types:
-------------

Lowpass (LP): Passes frequencies BELOW the cutoff, attenuates above.
  - The most common synth filter and the default here (2000 Hz, Q 1)
  - Lower cutoff = darker, muffled sound

Highpass (HP): Passes frequencies ABOVE the cutoff.
  - Thin, airy sounds

Bandpass (BP): Passes frequencies AROUND the cutoff.
  - "Telephone" or wah character

Notch: Attenuates frequencies AT the cutoff.
  - Hollow, phasey sound

Parameters
----------

Cutoff (Hz, 20 - 20000) and Q (0.1 - 30):
  Both glide over FILTER_RAMP_SECONDS whenever they change. Dragging a cutoff
  slider therefore sweeps smoothly instead of stepping, and a large jump in Q
  cannot ring out as a click.

Type:
  Switched atomically between blocks. The SVF computes all four responses
  from the same state, so switching never resets the filter memory.
*/

/// Glide time for cutoff and Q changes.
pub const FILTER_RAMP_SECONDS: f32 = 0.05;

#[derive(Clone, Copy, Debug)]
pub enum FilterParam {
    Cutoff,
    Q,
}

pub struct FilterNode {
    filter: SVFilter,
    sample_rate: f32,
}

impl FilterNode {
    pub fn new(filter_type: FilterType, cutoff_hz: f32, q: f32, sample_rate: f32) -> Self {
        Self {
            filter: SVFilter::new(filter_type, cutoff_hz, q),
            sample_rate,
        }
    }

    pub fn set_filter_type(&mut self, filter_type: FilterType) {
        self.filter.set_filter_type(filter_type);
    }

    pub fn filter_type(&self) -> FilterType {
        self.filter.filter_type()
    }
}

impl Parameterized for FilterNode {
    type Param = FilterParam;

    fn get_param(&self, param: Self::Param) -> f32 {
        match param {
            FilterParam::Cutoff => self.filter.cutoff_hz(),
            FilterParam::Q => self.filter.q(),
        }
    }

    fn set_param(&mut self, param: Self::Param, value: f32) {
        match param {
            FilterParam::Cutoff => {
                self.filter
                    .ramp_cutoff(value, FILTER_RAMP_SECONDS, self.sample_rate)
            }
            FilterParam::Q => self.filter.ramp_q(value, FILTER_RAMP_SECONDS, self.sample_rate),
        }
    }
}

impl GraphNode for FilterNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.filter.render(out, ctx.sample_rate);
    }

    fn reset(&mut self) {
        self.filter.reset();
    }
}
