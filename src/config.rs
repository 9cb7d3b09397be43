//! Engine configuration.
//!
//! Everything the engine needs at construction time, with defaults tuned for
//! a playable keyboard. Build one fluently:
//!
//! ```
//! use polykeys::config::EngineConfig;
//!
//! let config = EngineConfig::default().with_max_voices(8).with_release_guard_ms(150.0);
//! assert!(config.validate().is_ok());
//! ```
//!
//! With the `serde` feature a config also loads from TOML; missing fields
//! keep their defaults:
//!
//! ```toml
//! max_voices = 8
//!
//! [synth]
//! waveform = "square"
//!
//! [synth.envelope]
//! release = 1.5
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    effects::analyser::DEFAULT_ANALYSER_SIZE,
    error::ConfigError,
    patch::{EffectSettings, FilterSettings, SynthOptions},
};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Output sample rate in Hz.
    pub sample_rate: f32,
    /// Hard polyphony limit.
    pub max_voices: usize,
    /// Extra time after a release ends before its slot is reclaimed.
    pub release_guard_ms: f32,
    /// Pitch glide when a held key changes note.
    pub glide_seconds: f32,
    /// Spacing between per-voice option updates. Zero applies them at once.
    pub option_stagger_ms: f32,
    /// Release window used by all-notes-off.
    pub panic_release_seconds: f32,
    /// Samples per analyser snapshot.
    pub analyser_size: usize,
    pub synth: SynthOptions,
    pub filter: FilterSettings,
    pub effects: EffectSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            max_voices: 16,
            release_guard_ms: 100.0,
            glide_seconds: 0.05,
            option_stagger_ms: 2.0,
            panic_release_seconds: 0.05,
            analyser_size: DEFAULT_ANALYSER_SIZE,
            synth: SynthOptions::default(),
            filter: FilterSettings::default(),
            effects: EffectSettings::default(),
        }
    }
}

impl EngineConfig {
    pub fn with_sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_max_voices(mut self, max_voices: usize) -> Self {
        self.max_voices = max_voices;
        self
    }

    pub fn with_release_guard_ms(mut self, ms: f32) -> Self {
        self.release_guard_ms = ms;
        self
    }

    pub fn with_glide_seconds(mut self, seconds: f32) -> Self {
        self.glide_seconds = seconds;
        self
    }

    pub fn with_option_stagger_ms(mut self, ms: f32) -> Self {
        self.option_stagger_ms = ms;
        self
    }

    pub fn with_panic_release_seconds(mut self, seconds: f32) -> Self {
        self.panic_release_seconds = seconds;
        self
    }

    pub fn with_analyser_size(mut self, size: usize) -> Self {
        self.analyser_size = size;
        self
    }

    pub fn with_synth(mut self, synth: SynthOptions) -> Self {
        self.synth = synth;
        self
    }

    pub fn with_filter(mut self, filter: FilterSettings) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_effects(mut self, effects: EffectSettings) -> Self {
        self.effects = effects;
        self
    }

    /// Reject values the engine cannot run with. Out-of-range but usable
    /// values (a 40 kHz cutoff, a sustain of 1.3) are clamped later instead.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(ConfigError::invalid(
                "sample_rate",
                format!("must be a positive number, got {}", self.sample_rate),
            ));
        }
        if self.max_voices == 0 {
            return Err(ConfigError::invalid("max_voices", "must be at least 1"));
        }
        if self.analyser_size == 0 {
            return Err(ConfigError::invalid("analyser_size", "must be at least 1"));
        }

        let non_negative = [
            ("release_guard_ms", self.release_guard_ms),
            ("glide_seconds", self.glide_seconds),
            ("option_stagger_ms", self.option_stagger_ms),
            ("panic_release_seconds", self.panic_release_seconds),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::invalid(
                    field,
                    format!("must be a finite non-negative number, got {value}"),
                ));
            }
        }

        let env = &self.synth.envelope;
        let finite = [
            ("synth.envelope.attack", env.attack),
            ("synth.envelope.decay", env.decay),
            ("synth.envelope.sustain", env.sustain),
            ("synth.envelope.release", env.release),
            ("filter.frequency", self.filter.frequency),
            ("filter.q", self.filter.q),
            ("effects.master_volume_db", self.effects.master_volume_db),
        ];
        for (field, value) in finite {
            if !value.is_finite() {
                return Err(ConfigError::invalid(field, "must be finite"));
            }
        }

        Ok(())
    }

    /// Parse and validate a TOML document.
    #[cfg(feature = "serde")]
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig =
            toml::from_str(toml_str).map_err(|e| ConfigError::TomlParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::{filter::FilterType, oscillator::Waveform};

    #[test]
    fn defaults_validate() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_voices, 16);
        assert_eq!(config.synth.waveform, Waveform::Sawtooth);
        assert_eq!(config.synth.envelope.release, 0.8);
        assert_eq!(config.filter.filter_type, FilterType::LowPass);
        assert_eq!(config.effects.master_volume_db, -6.0);
    }

    #[test]
    fn rejects_unusable_values() {
        let zero_voices = EngineConfig::default().with_max_voices(0);
        assert!(matches!(
            zero_voices.validate(),
            Err(ConfigError::InvalidValue { field: "max_voices", .. })
        ));

        let bad_rate = EngineConfig::default().with_sample_rate(0.0);
        assert!(bad_rate.validate().is_err());

        let nan_glide = EngineConfig::default().with_glide_seconds(f32::NAN);
        assert!(matches!(
            nan_glide.validate(),
            Err(ConfigError::InvalidValue { field: "glide_seconds", .. })
        ));

        let mut bad_env = EngineConfig::default();
        bad_env.synth.envelope.attack = f32::INFINITY;
        assert!(bad_env.validate().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn loads_partial_toml() {
        let config = EngineConfig::from_toml_str(
            r#"
            max_voices = 8

            [synth]
            waveform = "square"

            [synth.envelope]
            release = 1.5

            [filter]
            filter_type = "highpass"
            frequency = 500.0
            "#,
        )
        .unwrap();

        assert_eq!(config.max_voices, 8);
        assert_eq!(config.synth.waveform, Waveform::Square);
        assert_eq!(config.synth.envelope.release, 1.5);
        assert_eq!(config.synth.envelope.attack, 0.01);
        assert_eq!(config.filter.filter_type, FilterType::HighPass);
        assert_eq!(config.filter.frequency, 500.0);
        assert_eq!(config.release_guard_ms, 100.0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn toml_errors_are_reported() {
        let err = EngineConfig::from_toml_str("max_voices = \"many\"").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));

        let err = EngineConfig::from_toml_str("max_voices = 0").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
