//! # CISYNTH Net
//!
//! UDP line ingest: fragment packet parsing, the line reassembler, and the
//! one-writer/many-reader image double buffer.

pub mod double_buffer;
pub mod error;
pub mod packet;
pub mod reassembler;
pub mod server;

pub use double_buffer::{ImageDoubleBuffer, ImageLine};
pub use error::NetError;
pub use reassembler::LineReassembler;
pub use server::LineServer;
