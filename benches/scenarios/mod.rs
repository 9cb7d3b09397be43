//! Real-world scenario benchmarks.
//!
//! Single voices, the shared effect chain, and the whole engine under a
//! full pool of held keys.

mod chain;
mod engine;
mod voices;

pub use chain::bench_chain;
pub use engine::bench_engine;
pub use voices::bench_voices;
