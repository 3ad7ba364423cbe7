//! cpal output backend: opens a fixed-rate stereo stream and pulls frames
//! from the [`audio_ring`](crate::audio_ring) consumer side, applying the
//! linear master gain before handing samples to the host.

use std::sync::{atomic::AtomicBool, Arc};

use cpal::{
    traits::{DeviceTrait, HostTrait, StreamTrait},
    BufferSize, SampleFormat, SampleRate, StreamConfig,
};

use crate::{audio_ring::RingConsumer, error::PlayerError, master_gain::MasterGain};

const NUM_CHANNELS: u16 = 2;

pub struct CpalOutputBackend {
    device_index: Option<usize>,
}

impl CpalOutputBackend {
    /// Verify a default output device is reachable before committing to a
    /// background thread.
    pub fn try_default() -> Result<Self, PlayerError> {
        cpal::default_host().default_output_device().ok_or(PlayerError::NoOutputDevice)?;
        Ok(Self { device_index: None })
    }

    /// Select an output device by its `--audio-device=N` enumeration index
    /// (matching the order `cpal::Host::output_devices()` yields), verifying
    /// it exists before committing to a background thread.
    pub fn try_select(device_index: usize) -> Result<Self, PlayerError> {
        let exists = cpal::default_host()
            .output_devices()
            .map_err(|e| PlayerError::DeviceInitFailed(e.to_string()))?
            .nth(device_index)
            .is_some();
        if !exists {
            return Err(PlayerError::DeviceInitFailed(format!("no output device at index {device_index}")));
        }
        Ok(Self { device_index: Some(device_index) })
    }

    /// Start playback on a background thread. The stream runs until
    /// `stop_flag` is set, at which point the thread drops the stream and
    /// returns.
    pub fn play(
        self,
        sample_rate: u32,
        buffer_frames: usize,
        mut ring: RingConsumer,
        gain: Arc<MasterGain>,
        stop_flag: Arc<AtomicBool>,
    ) -> Result<(), PlayerError> {
        let device_index = self.device_index;
        std::thread::spawn(move || {
            let host = cpal::default_host();

            let device = match device_index {
                Some(index) => match host.output_devices().ok().and_then(|mut d| d.nth(index)) {
                    Some(d) => d,
                    None => {
                        eprintln!("audio device index {index} is no longer available");
                        return;
                    }
                },
                None => match host.default_output_device() {
                    Some(d) => d,
                    None => {
                        eprintln!("no audio output device available");
                        return;
                    }
                },
            };

            let supported_config = match device.default_output_config() {
                Ok(c) => c,
                Err(e) => {
                    eprintln!("failed to get device config: {e}");
                    return;
                }
            };

            if supported_config.sample_format() != SampleFormat::F32 {
                eprintln!("device does not support f32 sample format");
                return;
            }

            let config = StreamConfig {
                channels: NUM_CHANNELS,
                sample_rate: SampleRate(sample_rate),
                buffer_size: BufferSize::Fixed(buffer_frames as u32),
            };

            let mut mono = vec![0.0f32; buffer_frames];
            let stop_flag_clone = Arc::clone(&stop_flag);

            let stream = match device.build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    if stop_flag_clone.load(std::sync::atomic::Ordering::SeqCst) {
                        data.fill(0.0);
                        return;
                    }

                    let frames = data.len() / NUM_CHANNELS as usize;
                    if mono.len() != frames {
                        mono.resize(frames, 0.0);
                    }
                    ring.fill(&mut mono);

                    let gain = gain.get();
                    for (frame, &sample) in data.chunks_mut(NUM_CHANNELS as usize).zip(mono.iter()) {
                        let value = sample * gain;
                        for channel in frame.iter_mut() {
                            *channel = value;
                        }
                    }
                },
                move |err| {
                    eprintln!("audio stream error: {err}");
                },
                None,
            ) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("failed to build output stream: {e}");
                    return;
                }
            };

            if let Err(e) = stream.play() {
                eprintln!("failed to start playback: {e}");
                return;
            }

            while !stop_flag.load(std::sync::atomic::Ordering::SeqCst) {
                std::thread::sleep(std::time::Duration::from_millis(10));
            }

            drop(stream);
        });

        Ok(())
    }
}
