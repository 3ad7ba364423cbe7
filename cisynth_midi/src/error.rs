//! Error type for the MIDI control surface.

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MidiError {
    #[error("failed to initialize MIDI input")]
    InitFailed,
    #[error("no MIDI input ports available")]
    NoInputPorts,
    #[error("failed to connect to MIDI input port")]
    ConnectFailed,
}

pub type Result<T> = std::result::Result<T, MidiError>;
