use crate::{clamp_envelope_time, MIN_ENVELOPE_TIME};

/*
ADSR Envelope
=============

A linear attack/decay/sustain/release generator. It multiplies each voice's
oscillator output to shape loudness over the life of a note.

  Level
    1.0 ┐     ╱╲
        │    ╱  ╲___________
    S   │   ╱               ╲
        │  ╱                 ╲
    0.0 └─╱───────────────────╲──→ Time
        Attack Decay  Sustain  Release

Stages
------

    Idle ──note_on──→ Attack ──level=1──→ Decay ──level=S──→ Sustain
      ↑                  │                  │                   │
      │                  └──────note_off────┴───────────────────┘
      │                                     ↓
      └────────────────level=0────────── Release

note_off starts Release from whatever level the envelope is at, so releasing
during the attack does not jump to the sustain level first.

Segment Times
-------------

Every segment time is clamped to MIN_ENVELOPE_TIME (1 ms). A zero-length
segment is a step in the amplitude, and a step is an audible click.

Attack and decay increments are recomputed from the current parameters on
every sample, so changing them while a note sounds bends the segment that is
in progress. Release is different: its length is committed at note_off
(start level and sample count are snapshotted), because the voice pool has
already scheduled reclamation of the voice from that length.
*/

/// The current stage of the envelope state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeState {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

pub struct Envelope {
    sample_rate: f32,

    attack_time: f32,
    decay_time: f32,
    sustain_level: f32,
    release_time: f32,

    stage: EnvelopeState,
    level: f32,

    decay_start_level: f32,

    release_start_level: f32,
    release_total_samples: u32,
    release_elapsed_samples: u32,
}

impl Envelope {
    pub fn adsr(sample_rate: f32, attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        let mut env = Self {
            sample_rate,
            attack_time: MIN_ENVELOPE_TIME,
            decay_time: MIN_ENVELOPE_TIME,
            sustain_level: 1.0,
            release_time: MIN_ENVELOPE_TIME,
            stage: EnvelopeState::Idle,
            level: 0.0,
            decay_start_level: 0.0,
            release_start_level: 0.0,
            release_total_samples: 1,
            release_elapsed_samples: 0,
        };
        env.set_params(attack, decay, sustain, release);
        env
    }

    /// Replace the envelope shape. Takes effect on the segment in progress
    /// (attack, decay, sustain) or on the next one; a release already under
    /// way keeps its committed length.
    pub fn set_params(&mut self, attack: f32, decay: f32, sustain: f32, release: f32) {
        self.attack_time = clamp_envelope_time(attack);
        self.decay_time = clamp_envelope_time(decay);
        self.sustain_level = if sustain.is_finite() {
            sustain.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.release_time = clamp_envelope_time(release);
    }

    /// Gate high: restart the attack from zero.
    pub fn note_on(&mut self) {
        self.level = 0.0;
        self.stage = EnvelopeState::Attack;
        self.release_elapsed_samples = 0;
    }

    /// Gate low: release over the configured release time.
    pub fn note_off(&mut self) {
        self.release_over(self.release_time);
    }

    /// Gate low with an explicit release length, used for panic releases.
    pub fn release_over(&mut self, seconds: f32) {
        if matches!(self.stage, EnvelopeState::Idle | EnvelopeState::Release) {
            return;
        }

        self.release_start_level = self.level;
        self.release_total_samples = (clamp_envelope_time(seconds) * self.sample_rate).round().max(1.0) as u32;
        self.release_elapsed_samples = 0;
        self.stage = EnvelopeState::Release;
    }

    /// Advance the envelope by one sample and return the new level.
    pub fn next_sample(&mut self) -> f32 {
        match self.stage {
            EnvelopeState::Idle => {
                self.level = 0.0;
            }

            EnvelopeState::Attack => {
                self.level += 1.0 / (self.attack_time * self.sample_rate);

                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.decay_start_level = 1.0;
                    self.stage = EnvelopeState::Decay;
                }
            }

            EnvelopeState::Decay => {
                let target = self.sustain_level;
                let total_drop = self.decay_start_level - target;
                self.level -= total_drop / (self.decay_time * self.sample_rate);

                if self.level <= target {
                    self.level = target;
                    self.stage = EnvelopeState::Sustain;
                }
            }

            EnvelopeState::Sustain => {
                self.level = self.sustain_level;
            }

            EnvelopeState::Release => {
                let progress =
                    self.release_elapsed_samples as f32 / self.release_total_samples as f32;
                self.level = (self.release_start_level * (1.0 - progress)).max(0.0);

                self.release_elapsed_samples = self.release_elapsed_samples.saturating_add(1);

                if self.release_elapsed_samples >= self.release_total_samples {
                    self.level = 0.0;
                    self.stage = EnvelopeState::Idle;
                }
            }
        }

        debug_assert!((0.0..=1.0).contains(&self.level));
        self.level
    }

    /// Returns true if the envelope is producing output (not idle).
    pub fn is_active(&self) -> bool {
        !matches!(self.stage, EnvelopeState::Idle)
    }

    pub fn reset(&mut self) {
        self.stage = EnvelopeState::Idle;
        self.level = 0.0;
        self.decay_start_level = 0.0;
        self.release_elapsed_samples = 0;
        self.release_start_level = 0.0;
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn state(&self) -> EnvelopeState {
        self.stage
    }

    pub fn release_time(&self) -> f32 {
        self.release_time
    }

    pub fn attack_time(&self) -> f32 {
        self.attack_time
    }

    pub fn sustain_level(&self) -> f32 {
        self.sustain_level
    }
}
