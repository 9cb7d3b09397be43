//! Sound settings: the timbre shared by every voice and the settings of the
//! master effect chain.
//!
//! Each settings struct has a matching `*Update` struct whose fields are all
//! optional. Applying an update overwrites only the fields it carries, so
//! controls can send "just the release time" without knowing the rest.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::{filter::FilterType, oscillator::Waveform};
use crate::clamp_envelope_time;

/// ADSR amplitude envelope. Times in seconds, sustain as a 0-1 level.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeOptions {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl Default for EnvelopeOptions {
    fn default() -> Self {
        Self {
            attack: 0.01,
            decay: 0.2,
            sustain: 0.5,
            release: 0.8,
        }
    }
}

impl EnvelopeOptions {
    /// Times clamped to at least 1 ms, sustain clamped to [0, 1].
    pub fn sanitized(self) -> Self {
        Self {
            attack: clamp_envelope_time(self.attack),
            decay: clamp_envelope_time(self.decay),
            sustain: if self.sustain.is_finite() {
                self.sustain.clamp(0.0, 1.0)
            } else {
                0.0
            },
            release: clamp_envelope_time(self.release),
        }
    }
}

/// Partial envelope change.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EnvelopeUpdate {
    pub attack: Option<f32>,
    pub decay: Option<f32>,
    pub sustain: Option<f32>,
    pub release: Option<f32>,
}

impl EnvelopeUpdate {
    pub fn is_empty(&self) -> bool {
        self.attack.is_none()
            && self.decay.is_none()
            && self.sustain.is_none()
            && self.release.is_none()
    }
}

/// Oscillator waveform plus envelope, shared by every voice.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SynthOptions {
    pub waveform: Waveform,
    pub envelope: EnvelopeOptions,
}

impl SynthOptions {
    /// Overwrite the fields `update` carries; the result is always sanitized.
    pub fn apply(&mut self, update: &SynthOptionsUpdate) {
        if let Some(waveform) = update.waveform {
            self.waveform = waveform;
        }

        let env = &update.envelope;
        if let Some(attack) = env.attack {
            self.envelope.attack = attack;
        }
        if let Some(decay) = env.decay {
            self.envelope.decay = decay;
        }
        if let Some(sustain) = env.sustain {
            self.envelope.sustain = sustain;
        }
        if let Some(release) = env.release {
            self.envelope.release = release;
        }
        self.envelope = self.envelope.sanitized();
    }

    pub fn merged(mut self, update: &SynthOptionsUpdate) -> Self {
        self.apply(update);
        self
    }
}

/// Partial [`SynthOptions`] change, built fluently:
///
/// ```
/// use polykeys::patch::SynthOptionsUpdate;
/// use polykeys::dsp::Waveform;
///
/// let update = SynthOptionsUpdate::default().waveform(Waveform::Square).release(2.0);
/// assert_eq!(update.envelope.release, Some(2.0));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SynthOptionsUpdate {
    pub waveform: Option<Waveform>,
    pub envelope: EnvelopeUpdate,
}

impl SynthOptionsUpdate {
    pub fn waveform(mut self, waveform: Waveform) -> Self {
        self.waveform = Some(waveform);
        self
    }

    pub fn attack(mut self, seconds: f32) -> Self {
        self.envelope.attack = Some(seconds);
        self
    }

    pub fn decay(mut self, seconds: f32) -> Self {
        self.envelope.decay = Some(seconds);
        self
    }

    pub fn sustain(mut self, level: f32) -> Self {
        self.envelope.sustain = Some(level);
        self
    }

    pub fn release(mut self, seconds: f32) -> Self {
        self.envelope.release = Some(seconds);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.waveform.is_none() && self.envelope.is_empty()
    }
}

/// Master filter settings.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterSettings {
    pub filter_type: FilterType,
    pub frequency: f32,
    pub q: f32,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            filter_type: FilterType::LowPass,
            frequency: 2_000.0,
            q: 1.0,
        }
    }
}

impl FilterSettings {
    pub fn apply(&mut self, update: &FilterUpdate) {
        if let Some(filter_type) = update.filter_type {
            self.filter_type = filter_type;
        }
        if let Some(frequency) = update.frequency {
            self.frequency = frequency;
        }
        if let Some(q) = update.q {
            self.q = q;
        }
    }
}

/// Partial [`FilterSettings`] change.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FilterUpdate {
    pub filter_type: Option<FilterType>,
    pub frequency: Option<f32>,
    pub q: Option<f32>,
}

impl FilterUpdate {
    pub fn filter_type(mut self, filter_type: FilterType) -> Self {
        self.filter_type = Some(filter_type);
        self
    }

    pub fn frequency(mut self, hz: f32) -> Self {
        self.frequency = Some(hz);
        self
    }

    pub fn q(mut self, q: f32) -> Self {
        self.q = Some(q);
        self
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChorusSettings {
    /// LFO rate in Hz.
    pub frequency: f32,
    /// Centre delay in ms.
    pub delay_time_ms: f32,
    /// Sweep depth, 0-1.
    pub depth: f32,
    pub wet: f32,
}

impl Default for ChorusSettings {
    fn default() -> Self {
        Self {
            frequency: 1.5,
            delay_time_ms: 3.5,
            depth: 0.7,
            wet: 0.0,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelaySettings {
    /// Seconds between repeats.
    pub time: f32,
    pub feedback: f32,
    pub wet: f32,
}

impl Default for DelaySettings {
    fn default() -> Self {
        Self {
            time: 0.25,
            feedback: 0.3,
            wet: 0.0,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReverbSettings {
    /// Tail length in seconds.
    pub decay: f32,
    /// Damping cutoff in Hz.
    pub dampening: f32,
    pub wet: f32,
}

impl Default for ReverbSettings {
    fn default() -> Self {
        Self {
            decay: 2.5,
            dampening: 20_000.0,
            wet: 0.0,
        }
    }
}

/// Everything the effect chain needs to rebuild its state.
///
/// Kept by the controller even before the chain exists, so parameter writes
/// made before the first note are not lost.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectSettings {
    pub master_volume_db: f32,
    pub chorus: ChorusSettings,
    pub delay: DelaySettings,
    pub reverb: ReverbSettings,
}

impl Default for EffectSettings {
    fn default() -> Self {
        Self {
            master_volume_db: -6.0,
            chorus: ChorusSettings::default(),
            delay: DelaySettings::default(),
            reverb: ReverbSettings::default(),
        }
    }
}
