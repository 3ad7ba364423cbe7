//! Error type for the UDP ingest path.

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum NetError {
    #[error("failed to bind UDP ingest socket")]
    BindFailed,
}

pub type Result<T> = std::result::Result<T, NetError>;
