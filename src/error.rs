//! Error types shared across the crate.
//!
//! Note operations never surface these for ordinary failures (a dropped note
//! is an outcome, not an error). They exist for the few conditions a host must
//! be able to report: the audio backend refusing to start, a bad note name at
//! a parsing boundary, or an invalid configuration.

use thiserror::Error;

/// Errors returned by [`crate::engine::SynthEngine`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// The audio backend refused to start. The pool is untouched and the next
    /// note attempt retries the start.
    #[error("audio backend failed to start: {0}")]
    AudioInit(String),

    /// The engine configuration did not validate.
    #[error("invalid engine configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Failure to parse a scientific pitch name such as `"C#4"`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NoteParseError {
    /// Empty input.
    #[error("empty note name")]
    Empty,

    /// First character is not a letter A-G.
    #[error("unknown pitch letter in '{0}'")]
    UnknownLetter(String),

    /// Missing or malformed octave number.
    #[error("invalid octave in '{0}'")]
    InvalidOctave(String),

    /// The note falls outside MIDI range 0..=127.
    #[error("note '{0}' is outside the MIDI range")]
    OutOfRange(String),
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A field holds an unusable value.
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue {
        /// Name of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// Failed to parse TOML.
    #[cfg(feature = "serde")]
    #[error("failed to parse TOML: {0}")]
    TomlParse(String),
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}
