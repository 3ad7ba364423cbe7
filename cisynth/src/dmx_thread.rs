//! DMX worker: derives per-zone color from the latest image line, rate-
//! limits output to the configured frame period (~40 Hz at the default 25
//! ms), and writes each universe frame out the serial transport.

use std::{sync::Arc, time::{Duration, Instant}};

use cisynth_core::EngineConfig;
use cisynth_dmx::{build_universe_frame, ColorEngine, DmxTransport};
use cisynth_net::ImageDoubleBuffer;

use crate::shutdown::Shutdown;

pub fn run(config: &EngineConfig, buffer: Arc<ImageDoubleBuffer>, mut transport: DmxTransport, silent: bool, shutdown: Shutdown) {
    let mut color_engine = ColorEngine::new(config);
    let period = Duration::from_millis(config.dmx_frame_period_ms);
    let mut last_sent = Instant::now();

    while !shutdown.dmx.load(std::sync::atomic::Ordering::Relaxed) {
        if let Some(line) = buffer.wait_for_line_timeout(period) {
            color_engine.update(&line.red, &line.green, &line.blue);
        }

        let elapsed = last_sent.elapsed();
        if elapsed < period {
            std::thread::sleep(period - elapsed);
        }

        let frame = build_universe_frame(&color_engine.spots);
        if let Err(e) = transport.send_frame(&frame) {
            if !silent {
                eprintln!("dmx: failed to send frame: {e}");
            }
        }
        last_sent = Instant::now();
    }
}
