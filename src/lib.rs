//! Polyphonic keyboard synthesizer core.
//!
//! A fixed pool of voices bound to logical keys, a shared master effect chain,
//! and an engine that drives both on its own audio clock:
//!
//! ```
//! use polykeys::{config::EngineConfig, engine::SynthEngine};
//!
//! let mut engine = SynthEngine::new(EngineConfig::default().with_max_voices(8))?;
//! engine.start_note("z", "C3")?;
//! engine.start_note("c", "E3")?;
//!
//! let mut out = vec![0.0; 512];
//! engine.render_block(&mut out);
//! assert_eq!(engine.voice_count(), 2);
//!
//! engine.stop_note("z");
//! engine.advance(1.0); // release tail and guard elapse
//! assert_eq!(engine.voice_count(), 1);
//! # Ok::<(), polykeys::error::EngineError>(())
//! ```

pub mod config;
pub mod dsp; // Signal primitives
pub mod effects; // Master chain and its controls
pub mod engine;
pub mod error;
pub mod graph; // Block-rendering effect nodes
pub mod io;
pub mod patch; // Sound settings and partial updates
pub mod synth; // Voices and the voice pool

pub use config::EngineConfig;
pub use engine::SynthEngine;
pub use error::EngineError;
pub use synth::{KeyId, Note, NoteOutcome};

/// Largest block rendered in one pass. Longer requests are split.
pub const MAX_BLOCK_SIZE: usize = 2048;

/// Shortest envelope segment; anything shorter is an audible click.
pub const MIN_ENVELOPE_TIME: f32 = 0.001;

/// Envelope segment time in seconds, at least [`MIN_ENVELOPE_TIME`]. NaN and
/// infinities fall back to the minimum.
pub(crate) fn clamp_envelope_time(seconds: f32) -> f32 {
    if seconds.is_finite() {
        seconds.max(MIN_ENVELOPE_TIME)
    } else {
        MIN_ENVELOPE_TIME
    }
}
