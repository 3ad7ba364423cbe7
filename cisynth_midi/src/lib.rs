//! # CISYNTH MIDI
//!
//! Raw message decoding, the CC/note dispatch table, and the control
//! surface that bridges MIDI input to the DSP thread.

pub mod control_event;
pub mod control_surface;
pub mod error;
pub mod message;

pub use control_event::{dispatch, ControlEvent};
pub use control_surface::{control_event_channel, ControlSurface};
pub use error::MidiError;
pub use message::RawMidiMessage;
