//! # CISYNTH Core
//!
//! Low-level mechanisms shared across the CISYNTH workspace: the
//! engine-wide configuration value, a lock-free SPSC ring buffer for
//! realtime-safe cross-thread handoff, denormal flushing, and a fast PRNG
//! for phase decorrelation.

pub mod config;
pub mod denormal;
pub mod random;
pub mod spsc;

pub use config::EngineConfig;
pub use denormal::{flush_denormal_f32, flush_denormal_f64};
pub use random::XorShiftRng;
pub use spsc::{Consumer, Producer, SpscRingBuffer};
