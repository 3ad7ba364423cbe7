//! Control-Change dispatch table and the event type handed to the DSP/audio
//! threads.

use crate::message::RawMidiMessage;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlEvent {
    VoiceOn { note: u8, velocity: f64 },
    VoiceOff { note: u8 },
    MasterVolume(f64),
    ReverbMix(f64),
    ReverbRoomSize(f64),
    ReverbDamping(f64),
    ReverbWidth(f64),
}

const CC_MOD_WHEEL: u8 = 1;
const CC_VOLUME: u8 = 7;
const CC_REVERB_MIX: u8 = 20;
const CC_REVERB_ROOM_SIZE: u8 = 21;
const CC_REVERB_DAMPING: u8 = 22;
const CC_REVERB_WIDTH: u8 = 23;

#[inline]
fn normalized(value: u8) -> f64 {
    value as f64 / 127.0
}

/// Translate one raw MIDI message into a control event, per the dispatch
/// table: CC1/7 to master volume, CC20-23 to the reverb, note-on with
/// velocity 0 treated as note-off.
pub fn dispatch(message: RawMidiMessage) -> Option<ControlEvent> {
    match message {
        RawMidiMessage::NoteOn { note, velocity, .. } => Some(ControlEvent::VoiceOn { note, velocity: normalized(velocity) }),
        RawMidiMessage::NoteOff { note, .. } => Some(ControlEvent::VoiceOff { note }),
        RawMidiMessage::ControlChange { controller, value, .. } => match controller {
            CC_MOD_WHEEL | CC_VOLUME => Some(ControlEvent::MasterVolume(normalized(value))),
            CC_REVERB_MIX => Some(ControlEvent::ReverbMix(normalized(value))),
            CC_REVERB_ROOM_SIZE => Some(ControlEvent::ReverbRoomSize(normalized(value))),
            CC_REVERB_DAMPING => Some(ControlEvent::ReverbDamping(normalized(value))),
            CC_REVERB_WIDTH => Some(ControlEvent::ReverbWidth(normalized(value))),
            _ => None,
        },
        RawMidiMessage::Other => None,
    }
}
