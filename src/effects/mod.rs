//! The shared master effect chain, its control surface and the waveform
//! analyser at its output.

/// Waveform snapshot tap read by visualizers.
pub mod analyser;
/// Filter → chorus → delay → reverb → volume pipeline.
pub mod chain;
/// Unit-converting setters and lazy chain creation.
pub mod controller;

pub use analyser::{AnalyserHandle, Frames};
pub use chain::EffectChain;
pub use controller::{EffectController, EffectParam};
