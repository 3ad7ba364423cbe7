//! # CISYNTH Player
//!
//! The audio output path: a two-slot ring handing synth-engine output to
//! the cpal audio callback, and the linear master gain the MIDI control
//! surface drives.

pub mod audio_ring;
pub mod backend;
pub mod error;
pub mod master_gain;

pub use audio_ring::{audio_ring, RingConsumer, RingProducer};
pub use backend::CpalOutputBackend;
pub use error::PlayerError;
pub use master_gain::MasterGain;
