//! Error type for the DMX output path.

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DmxError {
    #[error("failed to open DMX serial port")]
    OpenFailed,
    #[error("failed to toggle BREAK condition")]
    BreakFailed,
    #[error("failed to write DMX frame")]
    WriteFailed,
}

pub type Result<T> = std::result::Result<T, DmxError>;
