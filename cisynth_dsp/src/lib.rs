//! # CISYNTH DSP
//!
//! The two synth engines (additive and spectral), their shared voice and
//! envelope machinery, and the reverb effector.

pub mod additive;
pub mod envelope;
pub mod lfo;
pub mod reverb;
pub mod rng;
pub mod spectral;
pub mod synth_engine;
pub mod voice;
pub mod wave_table;

pub use additive::AdditiveSynth;
pub use reverb::Reverb;
pub use spectral::SpectralSynth;
pub use synth_engine::{ActiveSynth, AudioEngine, SynthEngine};
pub use voice::{Voice, VoicePool, VoiceState};
