use std::f32::consts::PI;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::ramp::LinearRamp;

/*
| type              | passes          | rejects      |
| ----------------- | --------------- | ------------ |
| low-pass          | below cutoff    | above cutoff |
| high-pass         | above cutoff    | below cutoff |
| band-pass         | around cutoff   | both sides   |
| notch / band-stop | both sides      | at cutoff    |

Topology-preserving state-variable filter (Simper/Zavalishin form). All four
responses fall out of the same two integrators, so switching `filter_type` is
a pure output selection and never disturbs the integrator state.

Cutoff and Q move through linear ramps. While a ramp is in flight the
coefficients are recomputed every sample; once both ramps settle they are
computed once per block.
*/

pub const MIN_CUTOFF_HZ: f32 = 20.0;
pub const MAX_CUTOFF_HZ: f32 = 20_000.0;
pub const MIN_Q: f32 = 0.1;
pub const MAX_Q: f32 = 30.0;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterType {
    #[default]
    LowPass,
    HighPass,
    BandPass,
    Notch,
}

impl FilterType {
    pub fn name(self) -> &'static str {
        match self {
            FilterType::LowPass => "lowpass",
            FilterType::HighPass => "highpass",
            FilterType::BandPass => "bandpass",
            FilterType::Notch => "notch",
        }
    }
}

pub struct FilterOutputs {
    pub lowpass: f32,
    pub bandpass: f32,
    pub highpass: f32,
    pub notch: f32,
}

pub struct SVFilter {
    ic1eq: f32,
    ic2eq: f32,
    cutoff: LinearRamp,
    q: LinearRamp,
    filter_type: FilterType,
}

impl SVFilter {
    pub fn new(filter_type: FilterType, cutoff_hz: f32, q: f32) -> Self {
        Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
            cutoff: LinearRamp::new(clamp_cutoff(cutoff_hz)),
            q: LinearRamp::new(clamp_q(q)),
            filter_type,
        }
    }

    pub fn lowpass(cutoff_hz: f32) -> Self {
        Self::new(FilterType::LowPass, cutoff_hz, 0.707)
    }

    pub fn highpass(cutoff_hz: f32) -> Self {
        Self::new(FilterType::HighPass, cutoff_hz, 0.707)
    }

    #[inline]
    fn coefficients(cutoff_hz: f32, q: f32, sample_rate: f32) -> (f32, f32) {
        let nyquist_guard = sample_rate * 0.49;
        let g = (PI * cutoff_hz.min(nyquist_guard) / sample_rate).tan();
        let k = 1.0 / q;
        (g, k)
    }

    pub fn next_sample(&mut self, sample: f32, k: f32, g: f32) -> FilterOutputs {
        let h = 1.0 / (1.0 + g * (g + k));
        let v3 = sample - self.ic2eq;
        let v1 = h * (self.ic1eq + g * v3);
        let v2 = self.ic2eq + g * v1;

        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;

        FilterOutputs {
            lowpass: v2,
            bandpass: v1,
            highpass: sample - k * v1 - v2,
            notch: sample - k * v1,
        }
    }

    pub fn render(&mut self, buffer: &mut [f32], sample_rate: f32) {
        let ramping = !(self.cutoff.is_settled() && self.q.is_settled());
        let (mut g, mut k) = Self::coefficients(self.cutoff.value(), self.q.value(), sample_rate);

        for sample in buffer.iter_mut() {
            if ramping {
                let cutoff = self.cutoff.next_sample();
                let q = self.q.next_sample();
                (g, k) = Self::coefficients(cutoff, q, sample_rate);
            }

            let outputs = self.next_sample(*sample, k, g);
            *sample = match self.filter_type {
                FilterType::LowPass => outputs.lowpass,
                FilterType::HighPass => outputs.highpass,
                FilterType::BandPass => outputs.bandpass,
                FilterType::Notch => outputs.notch,
            }
        }
    }

    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }

    /// Glide the cutoff to `cutoff_hz` over `seconds`.
    pub fn ramp_cutoff(&mut self, cutoff_hz: f32, seconds: f32, sample_rate: f32) {
        self.cutoff.ramp_to(clamp_cutoff(cutoff_hz), seconds, sample_rate);
    }

    /// Glide Q to `q` over `seconds`.
    pub fn ramp_q(&mut self, q: f32, seconds: f32, sample_rate: f32) {
        self.q.ramp_to(clamp_q(q), seconds, sample_rate);
    }

    pub fn set_cutoff(&mut self, cutoff_hz: f32) {
        self.cutoff.set_immediate(clamp_cutoff(cutoff_hz));
    }

    pub fn set_q(&mut self, q: f32) {
        self.q.set_immediate(clamp_q(q));
    }

    pub fn set_filter_type(&mut self, filter_type: FilterType) {
        self.filter_type = filter_type;
    }

    pub fn filter_type(&self) -> FilterType {
        self.filter_type
    }

    /// Cutoff the filter is heading to (equals the current value once settled).
    pub fn cutoff_hz(&self) -> f32 {
        self.cutoff.target()
    }

    pub fn current_cutoff_hz(&self) -> f32 {
        self.cutoff.value()
    }

    pub fn q(&self) -> f32 {
        self.q.target()
    }
}

pub fn clamp_cutoff(cutoff_hz: f32) -> f32 {
    if cutoff_hz.is_finite() {
        cutoff_hz.clamp(MIN_CUTOFF_HZ, MAX_CUTOFF_HZ)
    } else {
        MAX_CUTOFF_HZ
    }
}

pub fn clamp_q(q: f32) -> f32 {
    if q.is_finite() {
        q.clamp(MIN_Q, MAX_Q)
    } else {
        1.0
    }
}
