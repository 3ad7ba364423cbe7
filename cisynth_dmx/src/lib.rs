//! # CISYNTH DMX
//!
//! Per-zone color derivation from the image line, DMX universe frame
//! assembly, and the BREAK/Mark-After-Break serial transport.

pub mod color_engine;
pub mod error;
pub mod frame;
pub mod serial;

pub use color_engine::{ColorEngine, DmxSpot};
pub use error::DmxError;
pub use frame::{build_universe_frame, UNIVERSE_SIZE};
pub use serial::DmxTransport;
