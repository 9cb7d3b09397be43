//! Effect nodes for the shared master chain.
//!
//! Graph nodes wrap the low-level DSP primitives with what the chain needs:
//! block-based rendering, parameter access by enum, and short ramps on every
//! control so parameter writes are click-free.

/// Modulated-delay chorus.
pub mod chorus;
/// Feedback delay (echo).
pub mod delay;
/// Master state-variable filter.
pub mod filter;
/// Ramped wet/dry blending shared by the time-based effects.
pub mod mix;
/// Core traits shared by all graph nodes.
pub mod node;
/// Schroeder reverb with pre-delay.
pub mod reverb;
/// Master volume in decibels.
pub mod volume;

pub use node::{GraphNode, Parameterized, RenderCtx};
