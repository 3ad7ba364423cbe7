//! MIDI control surface: connects to the first matching input port and
//! forwards dispatched control events to the DSP thread over a lock-free
//! SPSC ring, following the realtime-safe parameter handoff convention.

use cisynth_core::spsc::{Producer, SpscRingBuffer};
use midir::{Ignore, MidiInput, MidiInputConnection};

use crate::{control_event::{dispatch, ControlEvent}, error::MidiError, message::RawMidiMessage};

/// Default event capacity for the control event ring: generous relative to
/// a human player's event rate.
const CONTROL_EVENT_CAPACITY: usize = 256;

/// Substrings matched against available port names, most specific first.
const KNOWN_CONTROLLER_NAMES: &[&str] = &["Launchkey Mini", "Launchkey"];

pub struct ControlSurface {
    _connection: MidiInputConnection<()>,
    port_name: String,
}

impl ControlSurface {
    /// Open the first MIDI input port whose name matches a known
    /// controller, falling back to the first available port if none match.
    /// Events are pushed into a ring buffer whose consumer half is
    /// returned alongside the surface.
    pub fn connect(producer: Producer<ControlEvent>) -> Result<Self, MidiError> {
        let mut midi_in = MidiInput::new("cisynth-control-surface").map_err(|_| MidiError::InitFailed)?;
        midi_in.ignore(Ignore::None);

        let ports = midi_in.ports();
        if ports.is_empty() {
            return Err(MidiError::NoInputPorts);
        }

        let port = choose_port(&midi_in, &ports).ok_or(MidiError::NoInputPorts)?;
        let port_name = midi_in.port_name(&port).unwrap_or_default();

        let mut producer = producer;
        let connection = midi_in
            .connect(
                &port,
                "cisynth-read-input",
                move |_stamp, bytes, _| {
                    let message = RawMidiMessage::parse(bytes);
                    if let Some(event) = dispatch(message) {
                        let _ = producer.try_push(event);
                    }
                },
                (),
            )
            .map_err(|_| MidiError::ConnectFailed)?;

        Ok(Self { _connection: connection, port_name })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

fn choose_port<'a>(midi_in: &MidiInput, ports: &'a [midir::MidiInputPort]) -> Option<&'a midir::MidiInputPort> {
    for known in KNOWN_CONTROLLER_NAMES {
        if let Some(port) = ports.iter().find(|p| midi_in.port_name(p).map(|n| n.contains(known)).unwrap_or(false)) {
            return Some(port);
        }
    }
    ports.first()
}

/// Build the ring buffer pair used between the control surface and the DSP
/// thread.
pub fn control_event_channel() -> (Producer<ControlEvent>, cisynth_core::spsc::Consumer<ControlEvent>) {
    SpscRingBuffer::new::<ControlEvent>(CONTROL_EVENT_CAPACITY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_starts_empty() {
        let (_producer, mut consumer) = control_event_channel();
        assert!(consumer.try_pop().is_none());
    }
}
