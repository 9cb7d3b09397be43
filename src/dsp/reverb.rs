//! Reverb - Room Simulation via Delay Networks
//!
//! Reverb simulates the sound of a space by creating many delayed, filtered
//! reflections of the input signal. This implementation uses the classic
//! Schroeder reverb algorithm behind a short pre-delay.
//!
//! # Schroeder Reverb Architecture
//!
//! ```text
//!                           ┌──→ [Comb 1] ──┐
//!                           ├──→ [Comb 2] ──┤
//! Input ──→ [Pre-delay] ────┼──→ [Comb 3] ──┼──→ (+) ──→ [Allpass 1] ──→ [Allpass 2] ──→ Output
//!                           └──→ [Comb 4] ──┘
//! ```
//!
//! ## Comb Filters
//!
//! A comb filter creates a series of equally-spaced echoes that decay over time.
//!
//! ```text
//! y[n] = x[n] + feedback * lowpass(y[n - delay])
//! ```
//!
//! ## Decay Time
//!
//! The reverb is driven by a decay time (seconds for the tail to fall by 60 dB)
//! rather than an abstract "room size". Each comb's feedback is derived from its
//! own loop length so that all four combs die away together:
//!
//! ```text
//! feedback = 0.001 ^ (loop_seconds / decay_seconds)
//! ```
//!
//! ## Damping
//!
//! Damping is given as a cutoff frequency in Hz. Inside each comb loop a
//! one-pole lowpass absorbs energy above that frequency on every pass, so the
//! tail darkens as it decays, like air and soft furnishings do in a real room.
//!
//! ```text
//! damp = exp(-2π · cutoff / sample_rate)     (0 = no damping, →1 = dark)
//! ```

use std::f32::consts::TAU;

use crate::dsp::delay::DelayLine;

const COMB_DELAYS_MS: [f32; 4] = [29.7, 37.1, 41.1, 43.7];
const ALLPASS_DELAYS_MS: [f32; 2] = [5.0, 1.7];
const MAX_PRE_DELAY_SECONDS: f32 = 0.1;

pub const MIN_DECAY_SECONDS: f32 = 0.1;
pub const MAX_DECAY_SECONDS: f32 = 20.0;

fn ms_to_samples(ms: f32, sample_rate: f32) -> usize {
    ((ms * sample_rate / 1000.0) as usize).max(1)
}

/// A feedback comb filter with a one-pole lowpass in the loop.
pub struct CombFilter {
    buffer: Vec<f32>,
    write_pos: usize,
    feedback: f32,
    damp: f32,
    filter_state: f32,
}

impl CombFilter {
    pub fn new(delay_samples: usize) -> Self {
        Self {
            buffer: vec![0.0; delay_samples.max(1)],
            write_pos: 0,
            feedback: 0.5,
            damp: 0.0,
            filter_state: 0.0,
        }
    }

    pub fn delay_samples(&self) -> usize {
        self.buffer.len()
    }

    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(0.0, 0.99);
    }

    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    pub fn set_damp(&mut self, damp: f32) {
        self.damp = damp.clamp(0.0, 0.99);
    }

    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.buffer[self.write_pos];

        self.filter_state = output * (1.0 - self.damp) + self.filter_state * self.damp;
        self.buffer[self.write_pos] = input + self.filter_state * self.feedback;

        self.write_pos = (self.write_pos + 1) % self.buffer.len();

        output
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.filter_state = 0.0;
        self.write_pos = 0;
    }
}

/// An allpass filter for reverb diffusion.
pub struct AllpassFilter {
    buffer: Vec<f32>,
    write_pos: usize,
    feedback: f32,
}

impl AllpassFilter {
    pub fn new(delay_samples: usize) -> Self {
        Self {
            buffer: vec![0.0; delay_samples.max(1)],
            write_pos: 0,
            feedback: 0.5,
        }
    }

    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(0.0, 0.9);
    }

    pub fn process(&mut self, input: f32) -> f32 {
        let delayed = self.buffer[self.write_pos];

        let output = -self.feedback * input + delayed;
        self.buffer[self.write_pos] = input + self.feedback * output;

        self.write_pos = (self.write_pos + 1) % self.buffer.len();

        output
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

/// Schroeder reverb with a pre-delay, 4 comb filters and 2 allpass filters.
pub struct SchroederReverb {
    sample_rate: f32,
    pre_delay: DelayLine,
    pre_delay_samples: f32,
    combs: [CombFilter; 4],
    allpasses: [AllpassFilter; 2],
    decay_seconds: f32,
    dampening_hz: f32,
}

impl SchroederReverb {
    /// Create a reverb at `sample_rate` with the given decay time in seconds.
    pub fn new(sample_rate: f32, decay_seconds: f32) -> Self {
        let combs = COMB_DELAYS_MS.map(|ms| CombFilter::new(ms_to_samples(ms, sample_rate)));
        let allpasses = ALLPASS_DELAYS_MS.map(|ms| AllpassFilter::new(ms_to_samples(ms, sample_rate)));

        let mut reverb = Self {
            sample_rate,
            pre_delay: DelayLine::with_max_seconds(MAX_PRE_DELAY_SECONDS, sample_rate),
            pre_delay_samples: 1.0,
            combs,
            allpasses,
            decay_seconds,
            dampening_hz: 0.0,
        };
        reverb.set_decay_seconds(decay_seconds);
        reverb.set_dampening_hz(sample_rate * 0.5);
        reverb
    }

    /// Time for the tail to fall by 60 dB.
    pub fn set_decay_seconds(&mut self, seconds: f32) {
        let decay = if seconds.is_finite() {
            seconds.clamp(MIN_DECAY_SECONDS, MAX_DECAY_SECONDS)
        } else {
            MIN_DECAY_SECONDS
        };
        self.decay_seconds = decay;

        for comb in &mut self.combs {
            let loop_seconds = comb.delay_samples() as f32 / self.sample_rate;
            comb.set_feedback(0.001f32.powf(loop_seconds / decay));
        }
    }

    pub fn decay_seconds(&self) -> f32 {
        self.decay_seconds
    }

    /// High-frequency absorption, expressed as the cutoff of the in-loop lowpass.
    pub fn set_dampening_hz(&mut self, hz: f32) {
        let nyquist = self.sample_rate * 0.5;
        let hz = if hz.is_finite() { hz.clamp(20.0, nyquist) } else { nyquist };
        self.dampening_hz = hz;

        let damp = if hz >= nyquist {
            0.0
        } else {
            (-TAU * hz / self.sample_rate).exp()
        };
        for comb in &mut self.combs {
            comb.set_damp(damp);
        }
    }

    pub fn dampening_hz(&self) -> f32 {
        self.dampening_hz
    }

    pub fn set_pre_delay_seconds(&mut self, seconds: f32) {
        let seconds = seconds.clamp(0.0, MAX_PRE_DELAY_SECONDS);
        self.pre_delay_samples = (seconds * self.sample_rate).max(1.0);
    }

    /// Process a single sample through the reverb. Returns the wet signal only.
    pub fn process(&mut self, input: f32) -> f32 {
        let input = self.pre_delay.next_sample(input, self.pre_delay_samples);

        let mut output = 0.0;
        for comb in &mut self.combs {
            output += comb.process(input);
        }
        output *= 0.25;

        for allpass in &mut self.allpasses {
            output = allpass.process(output);
        }

        output
    }

    pub fn reset(&mut self) {
        self.pre_delay.reset();
        for comb in &mut self.combs {
            comb.reset();
        }
        for allpass in &mut self.allpasses {
            allpass.reset();
        }
    }
}
