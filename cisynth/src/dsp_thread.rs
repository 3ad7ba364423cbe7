//! DSP worker: drains MIDI control events, pulls the latest image line,
//! runs it through the active synth engine, and publishes the result to
//! the audio ring for the output backend to drain.

use std::sync::{atomic::Ordering, Arc};

use cisynth_core::EngineConfig;
use cisynth_dsp::{AudioEngine, SynthEngine};
use cisynth_midi::ControlEvent;
use cisynth_net::ImageDoubleBuffer;
use cisynth_player::{master_gain::MasterGain, RingProducer};

use crate::shutdown::Shutdown;

const RETRY_SLEEP: std::time::Duration = std::time::Duration::from_micros(200);

pub fn run(
    config: &EngineConfig,
    mut engine: AudioEngine,
    buffer: Arc<ImageDoubleBuffer>,
    mut control_events: cisynth_core::spsc::Consumer<ControlEvent>,
    master_gain: Arc<MasterGain>,
    mut ring: RingProducer,
    shutdown: Shutdown,
) {
    crate::rt_priority::bump_to_sched_rr();

    let mut output = vec![0.0f32; config.audio_buffer_size];

    while !shutdown.dsp.load(Ordering::Relaxed) {
        while let Some(event) = control_events.try_pop() {
            apply_control_event(&mut engine, &master_gain, event);
        }

        let Some(line) = buffer.wait_for_line_timeout(std::time::Duration::from_secs(1)) else {
            continue;
        };

        let grayscale = line.to_grayscale_u16();
        engine.process_line(&grayscale, &mut output);

        while !ring.try_publish(&output) {
            if shutdown.dsp.load(Ordering::Relaxed) {
                return;
            }
            std::thread::sleep(RETRY_SLEEP);
        }
    }
}

fn apply_control_event(engine: &mut AudioEngine, master_gain: &MasterGain, event: ControlEvent) {
    match event {
        ControlEvent::VoiceOn { note, velocity } => engine.synth.note_on(note, velocity),
        ControlEvent::VoiceOff { note } => engine.synth.note_off(note),
        ControlEvent::MasterVolume(gain) => master_gain.set(gain as f32),
        ControlEvent::ReverbMix(v) => engine.reverb.set_mix(v),
        ControlEvent::ReverbRoomSize(v) => engine.reverb.set_room_size(v),
        ControlEvent::ReverbDamping(v) => engine.reverb.set_damping(v),
        ControlEvent::ReverbWidth(v) => engine.reverb.set_width(v),
    }
}
