//! Spectral (FFT) synth: a polyphonic voice pool whose harmonic spectrum is
//! shaped by the magnitude spectrum of a time-averaged grayscale line.

use std::{collections::VecDeque, f64::consts::TAU, sync::Arc};

use cisynth_core::EngineConfig;
use realfft::{RealFftPlanner, RealToComplex};
use rustfft::num_complex::Complex;

use crate::{lfo::VibratoLfo, voice::VoicePool};

const SMOOTHING_ALPHA: f64 = 0.1;

pub struct SpectralSynth {
    sample_rate: f64,
    max_oscillators: usize,
    master_gain: f64,

    fft: Arc<dyn RealToComplex<f64>>,
    line_window: VecDeque<Vec<f64>>,
    window_size: usize,
    fft_input: Vec<f64>,
    fft_scratch: Vec<Complex<f64>>,
    fft_output: Vec<Complex<f64>>,
    smoothed_magnitudes: Vec<f64>,

    lfo: VibratoLfo,
    vibrato_depth_semitones: f64,
    base_cutoff: f64,
    filter_depth: f64,

    norm_factor_bin0: f64,
    norm_factor_harmonics: f64,
    amplitude_gamma: f64,

    pub voices: VoicePool,
}

impl SpectralSynth {
    pub fn new(config: &EngineConfig) -> Self {
        let pixels_per_line = config.pixels_per_line;
        let mut planner = RealFftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(pixels_per_line);

        let fft_input = fft.make_input_vec();
        let fft_output = fft.make_output_vec();
        let fft_scratch = fft.make_scratch_vec();
        let bins = fft_output.len();

        let voices = VoicePool::new(
            config.max_voices,
            config.max_mapped_oscillators,
            (0.01, 0.1, 0.7, 0.3),
            (0.01, 0.2, 0.5, 0.3),
        );

        Self {
            sample_rate: config.sample_rate,
            max_oscillators: config.max_mapped_oscillators,
            master_gain: 1.0,
            fft,
            line_window: VecDeque::with_capacity(config.moving_average_window),
            window_size: config.moving_average_window,
            fft_input,
            fft_scratch,
            fft_output,
            smoothed_magnitudes: vec![0.0; bins],
            lfo: VibratoLfo::new(5.0),
            vibrato_depth_semitones: 0.1,
            base_cutoff: 4_000.0,
            filter_depth: 2_000.0,
            norm_factor_bin0: config.spectral_norm_factor_bin0,
            norm_factor_harmonics: config.spectral_norm_factor_harmonics,
            amplitude_gamma: config.spectral_amplitude_gamma,
            voices,
        }
    }

    pub fn note_on(&mut self, note: u8, velocity: f64) {
        self.voices.note_on(note, velocity);
    }

    pub fn note_off(&mut self, note: u8) {
        self.voices.note_off(note);
    }

    pub fn set_master_gain(&mut self, gain: f64) {
        self.master_gain = gain.clamp(0.0, 1.0);
    }

    /// Feed one new grayscale line into the moving-average window and
    /// refresh the smoothed per-bin magnitude spectrum used as timbre.
    pub fn push_line(&mut self, grayscale: &[u16]) {
        if self.line_window.len() == self.window_size {
            self.line_window.pop_front();
        }
        self.line_window.push_back(grayscale.iter().map(|&v| v as f64).collect());

        let n = self.line_window.len();
        for (i, sample) in self.fft_input.iter_mut().enumerate() {
            let sum: f64 = self.line_window.iter().map(|line| line[i]).sum();
            *sample = sum / n as f64;
        }

        self.fft
            .process_with_scratch(&mut self.fft_input, &mut self.fft_output, &mut self.fft_scratch)
            .expect("fixed-size FFT plan always matches buffer lengths");

        for (bin, value) in self.fft_output.iter().enumerate() {
            let magnitude = value.norm();
            let norm_factor = if bin == 0 { self.norm_factor_bin0 } else { self.norm_factor_harmonics };
            let target = (magnitude / norm_factor).clamp(0.0, 1.0);
            let smoothed = &mut self.smoothed_magnitudes[bin];
            *smoothed = SMOOTHING_ALPHA * target + (1.0 - SMOOTHING_ALPHA) * *smoothed;
        }
    }

    /// Synthesize one audio buffer's worth of samples into `output`.
    pub fn process(&mut self, output: &mut [f32]) {
        self.voices.tick_envelopes(self.sample_rate);

        for sample in output.iter_mut() {
            let lfo_value = self.lfo.next_sample(self.sample_rate);
            let mut mix = 0.0f64;

            for voice in self.voices.voices.iter_mut() {
                if voice.midi_note.is_none() {
                    continue;
                }

                let volume = voice.volume_env.current_output();
                let filter_env = voice.filter_env.current_output();
                let cutoff = (self.base_cutoff + filter_env * self.filter_depth).clamp(20.0, self.sample_rate / 2.0 - 1.0);
                let f0 = voice.frequency * 2f64.powf(lfo_value * self.vibrato_depth_semitones / 12.0);

                let mut voice_sum = 0.0f64;
                for k in 0..self.max_oscillators.min(voice.harmonic_phases.len()) {
                    let harmonic_number = if k == 0 { 1.0 } else { (k + 1) as f64 };
                    let fk = f0 * harmonic_number;
                    if fk >= self.sample_rate / 2.0 {
                        break;
                    }

                    let bin = k.min(self.smoothed_magnitudes.len() - 1);
                    let magnitude = self.smoothed_magnitudes[bin].max(0.0);
                    let amplitude = magnitude.powf(self.amplitude_gamma);
                    let attenuation = 1.0 / (1.0 + (fk / cutoff).powi(2)).sqrt();

                    let phase = &mut voice.harmonic_phases[k];
                    voice_sum += amplitude * attenuation * phase.sin();
                    *phase += TAU * fk / self.sample_rate;
                    if *phase >= TAU {
                        *phase -= TAU;
                    }
                }

                mix += voice_sum * volume * voice.velocity;
            }

            let mut value = (mix * self.master_gain) as f32;
            value = value.clamp(-1.0, 1.0);
            *sample = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> EngineConfig {
        let mut config = EngineConfig::default();
        config.pixels_per_line = 64;
        config.total_fragments = 8;
        config.fragment_size = 8;
        config.audio_buffer_size = 32;
        config.max_voices = 4;
        config.max_mapped_oscillators = 6;
        config
    }

    #[test]
    fn silence_with_no_active_voices() {
        let config = small_config();
        let mut synth = SpectralSynth::new(&config);
        synth.push_line(&vec![1000u16; config.pixels_per_line]);

        let mut output = vec![0.0f32; config.audio_buffer_size];
        synth.process(&mut output);

        for &s in &output {
            assert_eq!(s, 0.0);
        }
    }

    #[test]
    fn magnitude_normalization_is_not_full_saturation() {
        let config = small_config();
        let mut synth = SpectralSynth::new(&config);
        let line: Vec<u16> = (0..config.pixels_per_line)
            .map(|i| (i as f64 / config.pixels_per_line as f64 * 20_000.0) as u16)
            .collect();
        synth.push_line(&line);

        // With the real normalization divisors, a moderate gradient leaves
        // most bins well under saturation. Dividing by 1.0 (the defect this
        // guards against) saturates every bin to 1.0 regardless of content.
        let saturated = synth.smoothed_magnitudes.iter().filter(|&&m| m >= 0.999).count();
        assert!(
            saturated < synth.smoothed_magnitudes.len(),
            "expected some bins below saturation, all {} bins saturated",
            synth.smoothed_magnitudes.len()
        );
    }

    #[test]
    fn note_on_produces_nonzero_bounded_output() {
        let config = small_config();
        let mut synth = SpectralSynth::new(&config);
        synth.push_line(&vec![40000u16; config.pixels_per_line]);
        synth.note_on(69, 1.0);

        let mut output = vec![0.0f32; config.audio_buffer_size];
        for _ in 0..20 {
            synth.process(&mut output);
        }

        assert!(output.iter().any(|&s| s.abs() > 0.0));
        for &s in &output {
            assert!((-1.0..=1.0).contains(&s));
        }
    }

    #[test]
    fn harmonic_iteration_stops_at_nyquist() {
        let config = small_config();
        let mut synth = SpectralSynth::new(&config);
        synth.push_line(&vec![40000u16; config.pixels_per_line]);
        synth.voices.note_on(127, 1.0); // very high fundamental

        let mut output = vec![0.0f32; config.audio_buffer_size];
        // must not panic/overflow despite most harmonics exceeding Nyquist
        synth.process(&mut output);
        for &s in &output {
            assert!(s.is_finite());
        }
    }

    #[test]
    fn note_off_eventually_silences_voice() {
        let config = small_config();
        let mut synth = SpectralSynth::new(&config);
        synth.push_line(&vec![40000u16; config.pixels_per_line]);
        synth.note_on(69, 1.0);
        let mut output = vec![0.0f32; config.audio_buffer_size];
        for _ in 0..5 {
            synth.process(&mut output);
        }
        synth.note_off(69);
        for _ in 0..2000 {
            synth.process(&mut output);
        }
        assert!(synth.voices.voices.iter().all(|v| v.midi_note.is_none()));
    }
}
