//! CISYNTH orchestrator: wires the UDP reassembler, DSP, DMX, MIDI, and
//! audio output workers together and drives their shutdown sequencing.
//!
//! Thread startup order is DMX, then the UDP reassembler, then DSP, per
//! spec.md §4.J; shutdown joins them in the same order.

mod cli;
mod dmx_thread;
mod dsp_thread;
mod rt_priority;
mod shutdown;

use std::sync::{atomic::AtomicBool, Arc};

use cisynth_core::EngineConfig;
use cisynth_dsp::{ActiveSynth, AudioEngine};
use cisynth_dmx::DmxTransport;
use cisynth_midi::{control_event_channel, ControlSurface};
use cisynth_net::{ImageDoubleBuffer, LineServer};
use cisynth_player::{audio_ring, CpalOutputBackend, MasterGain};

use cli::Cli;
use shutdown::Shutdown;

fn main() {
    let cli = Cli::parse(std::env::args().skip(1));

    if cli.list_audio_devices {
        list_audio_devices();
        return;
    }

    // --cli (suppress GUI loop) and --sfml-window (waterfall viewer) are
    // accepted for invocation compatibility; this build has no GUI layer,
    // so both are no-ops.
    let _ = (cli.cli_mode, cli.sfml_window);

    let config = EngineConfig::default();
    let shutdown = Shutdown::new();
    install_signal_handler(shutdown.clone());

    let net_to_dsp = ImageDoubleBuffer::new();
    let net_to_dmx = if cli.no_dmx { None } else { Some(ImageDoubleBuffer::new()) };

    // --- DMX thread (started first) ---
    let dmx_handle = if let Some(dmx_buffer) = net_to_dmx.clone() {
        match DmxTransport::open(&cli.dmx_port, config.dmx_baud) {
            Ok(transport) => {
                let config = config.clone();
                let shutdown = shutdown.clone();
                let silent = cli.silent_dmx;
                Some(std::thread::spawn(move || {
                    dmx_thread::run(&config, dmx_buffer, transport, silent, shutdown);
                }))
            }
            Err(e) => {
                eprintln!("dmx: failed to open {}: {e}, continuing without DMX output", cli.dmx_port);
                None
            }
        }
    } else {
        None
    };

    // --- UDP reassembler (started second) ---
    let server = match LineServer::bind_with_dmx_buffer(&config, Arc::clone(&net_to_dsp), net_to_dmx) {
        Ok(server) => server,
        Err(e) => {
            eprintln!("fatal: failed to bind UDP socket: {e}");
            std::process::exit(1);
        }
    };
    let net_handle = server.spawn(Arc::clone(&shutdown.net));

    // --- MIDI control surface ---
    let (control_producer, control_consumer) = control_event_channel();
    let _control_surface = match ControlSurface::connect(control_producer) {
        Ok(surface) => {
            println!("midi: connected to {}", surface.port_name());
            Some(surface)
        }
        Err(e) => {
            eprintln!("midi: {e}, continuing without MIDI control");
            None
        }
    };

    // --- Audio output ---
    let (ring_producer, ring_consumer) = audio_ring(config.audio_buffer_size);
    let master_gain = Arc::new(MasterGain::default());
    let stop_flag = Arc::new(AtomicBool::new(false));

    let backend_result = match cli.audio_device {
        Some(index) => CpalOutputBackend::try_select(index),
        None => CpalOutputBackend::try_default(),
    };

    match backend_result {
        Ok(backend) => {
            if let Err(e) = backend.play(
                config.sample_rate as u32,
                config.audio_buffer_size,
                ring_consumer,
                Arc::clone(&master_gain),
                Arc::clone(&stop_flag),
            ) {
                eprintln!("audio: failed to start output: {e}");
            }
        }
        Err(e) => eprintln!("audio: {e}, continuing without audio output"),
    }

    // --- DSP thread (started third) ---
    let engine = AudioEngine::new(&config, ActiveSynth::new_additive(&config));
    let dsp_config = config.clone();
    let dsp_shutdown = shutdown.clone();
    let dsp_buffer = Arc::clone(&net_to_dsp);
    let dsp_handle = std::thread::spawn(move || {
        dsp_thread::run(&dsp_config, engine, dsp_buffer, control_consumer, master_gain, ring_producer, dsp_shutdown);
    });

    // --- Orchestrator event loop ---
    while !shutdown.requested() {
        std::thread::sleep(std::time::Duration::from_micros(100));
    }

    // Shutdown sequencing: join in startup order (DMX, reassembler, DSP),
    // then tear down audio.
    if let Some(handle) = dmx_handle {
        let _ = handle.join();
    }
    let _ = net_handle.join();
    let _ = dsp_handle.join();
    stop_flag.store(true, std::sync::atomic::Ordering::SeqCst);
}

fn install_signal_handler(shutdown: Shutdown) {
    let signal_count = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let result = ctrlc::set_handler(move || {
        let count = signal_count.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1;
        if count >= 2 {
            std::process::exit(1);
        }
        shutdown.request();
    });
    if let Err(e) = result {
        eprintln!("warning: failed to install SIGINT handler: {e}");
    }
}

fn list_audio_devices() {
    use cpal::traits::{DeviceTrait, HostTrait};

    let host = cpal::default_host();
    match host.output_devices() {
        Ok(devices) => {
            for (index, device) in devices.enumerate() {
                let name = device.name().unwrap_or_else(|_| "<unknown>".to_string());
                println!("{index}: {name}");
            }
        }
        Err(e) => eprintln!("failed to enumerate audio devices: {e}"),
    }
}
