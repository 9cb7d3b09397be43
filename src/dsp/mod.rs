//! Low-level DSP primitives used by the voices and the effect nodes.
//!
//! Everything here is sized at construction and allocation-free afterwards,
//! so it is safe to run inside the audio callback. The modules stay focused on
//! signal math; routing and parameter plumbing live in `graph` and `effects`.

/// Fractional delay line (circular buffer).
pub mod delay;
/// Attack/decay/sustain/release envelope generator.
pub mod envelope;
/// State-variable filter with ramped cutoff and Q.
pub mod filter;
/// Decibel helpers for the volume stage.
pub mod gain;
/// Band-limited oscillator waveforms.
pub mod oscillator;
/// Linear parameter ramps for click-free changes.
pub mod ramp;
/// Schroeder reverb.
pub mod reverb;

pub use envelope::EnvelopeState;
pub use filter::FilterType;
pub use oscillator::Waveform;
