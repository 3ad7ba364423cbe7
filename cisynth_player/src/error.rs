//! Error type for the audio output path.
//!
//! Kept as a hand-rolled `Display`/`Error` impl rather than `thiserror`,
//! matching `bbx_player::error::PlayerError` directly — this crate is a
//! direct descendant of `bbx_player` and keeps its established convention.

use std::fmt;

#[derive(Debug)]
pub enum PlayerError {
    NoOutputDevice,
    DeviceInitFailed(String),
    PlaybackFailed(String),
}

impl fmt::Display for PlayerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerError::NoOutputDevice => write!(f, "no audio output device available"),
            PlayerError::DeviceInitFailed(msg) => write!(f, "failed to initialize audio device: {msg}"),
            PlayerError::PlaybackFailed(msg) => write!(f, "audio playback failed: {msg}"),
        }
    }
}

impl std::error::Error for PlayerError {}

pub type Result<T> = std::result::Result<T, PlayerError>;
