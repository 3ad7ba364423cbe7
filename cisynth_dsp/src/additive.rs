//! Additive (inverse-FFT) synth: one oscillator per pixel, amplitude-driven
//! by grayscale intensity, summed into an audio buffer per incoming line.

use cisynth_core::EngineConfig;

use crate::{rng::NoteSeed, wave_table::WaveTable};

pub struct AdditiveSynth {
    wave_table: WaveTable,
    config_gamma: f64,
    color_inverted: bool,
    relative_mode: bool,
    non_linear_mapping: bool,
    gap_limiter: bool,
    contrast_min: f64,
    contrast_stride: f64,
    contrast_adjustment_power: f64,
    wave_amp_resolution: f64,
    volume_amp_resolution: f64,

    note_values: Vec<f64>,
    wave_buffer: Vec<f32>,
    volume_buffer: Vec<f32>,
    sum_volume_buffer: Vec<f64>,
    max_volume_buffer: Vec<f64>,
    ifft_buffer: Vec<f64>,
}

impl AdditiveSynth {
    pub fn new(config: &EngineConfig) -> Self {
        let number_of_notes = config.number_of_notes();
        let wave_table = WaveTable::build(
            number_of_notes,
            config.start_frequency,
            config.sample_rate,
            config.semitone_per_octave,
            config.comma_per_semitone,
            config.wave_amp_resolution,
            config.volume_amp_resolution,
            config.volume_increment,
            config.volume_decrement,
            NoteSeed::new(1),
        )
        .expect("wave table must fit in its preallocated region");

        let buffer_size = config.audio_buffer_size;
        Self {
            wave_table,
            config_gamma: config.gamma_value,
            color_inverted: config.color_inverted,
            relative_mode: config.relative_mode,
            non_linear_mapping: config.non_linear_mapping,
            gap_limiter: config.gap_limiter,
            contrast_min: config.contrast_min,
            contrast_stride: config.contrast_stride,
            contrast_adjustment_power: config.contrast_adjustment_power,
            wave_amp_resolution: config.wave_amp_resolution,
            volume_amp_resolution: config.volume_amp_resolution,

            note_values: vec![0.0; number_of_notes],
            wave_buffer: vec![0.0; buffer_size],
            volume_buffer: vec![0.0; buffer_size],
            sum_volume_buffer: vec![0.0; buffer_size],
            max_volume_buffer: vec![0.0; buffer_size],
            ifft_buffer: vec![0.0; buffer_size],
        }
    }

    /// Process one reassembled grayscale line (16-bit scale, one value per
    /// note) into `output`, which must be `audio_buffer_size` long.
    pub fn process_line(&mut self, grayscale: &[u16], output: &mut [f32]) {
        let number_of_notes = self.note_values.len();
        debug_assert_eq!(grayscale.len(), number_of_notes);

        let vmax = self.volume_amp_resolution;
        for (n, &g) in grayscale.iter().enumerate() {
            let mut v = g as f64;
            if self.color_inverted {
                v = (vmax - v).clamp(0.0, vmax);
            }
            self.note_values[n] = v;
        }

        if self.relative_mode {
            for n in 0..number_of_notes - 1 {
                self.note_values[n] = (self.note_values[n] - self.note_values[n + 1]).clamp(0.0, vmax);
            }
            self.note_values[number_of_notes - 1] = 0.0;
        }

        if self.non_linear_mapping {
            for v in self.note_values.iter_mut() {
                let normalized = (*v / vmax).powf(self.config_gamma);
                *v = normalized * vmax;
            }
        }

        let buffer_size = output.len();
        self.ifft_buffer[..buffer_size].fill(0.0);
        self.sum_volume_buffer[..buffer_size].fill(0.0);
        self.max_volume_buffer[..buffer_size].fill(0.0);

        for note in 0..number_of_notes {
            let target = self.note_values[note];

            for i in 0..buffer_size {
                self.wave_buffer[i] = self.wave_table.step(note);
            }

            self.fill_volume_ramp(note, target, buffer_size);

            for i in 0..buffer_size {
                let volume = self.volume_buffer[i] as f64;
                let sample = self.wave_buffer[i] as f64 * volume;
                self.ifft_buffer[i] += sample;
                self.sum_volume_buffer[i] += volume;
                if volume > self.max_volume_buffer[i] {
                    self.max_volume_buffer[i] = volume;
                }
            }
        }

        let half_volume_max = self.volume_amp_resolution / 2.0;
        for i in 0..buffer_size {
            let denom = self.sum_volume_buffer[i] * half_volume_max;
            let raw = if denom != 0.0 {
                (self.ifft_buffer[i] * self.max_volume_buffer[i]) / denom
            } else {
                0.0
            };
            let mut sample = (raw / self.wave_amp_resolution) as f32;
            if !sample.is_finite() {
                sample = 0.0;
            }
            output[i] = sample;
        }

        let contrast = self.contrast_factor(grayscale);
        for sample in output.iter_mut() {
            *sample = (*sample * contrast as f32).clamp(-1.0, 1.0);
        }
    }

    /// Gap limiter: slews `current_volume` toward `target` at the note's
    /// bounded rate, then fully fills the remainder of the slot with the
    /// settled value (§9 open question: never leave stale trailing values).
    fn fill_volume_ramp(&mut self, note: usize, target: f64, buffer_size: usize) {
        if !self.gap_limiter {
            self.volume_buffer[..buffer_size].fill(target as f32);
            self.wave_table.entries[note].current_volume = target;
            return;
        }

        let entry = &mut self.wave_table.entries[note];
        let mut filled = buffer_size;
        for i in 0..buffer_size {
            if entry.current_volume < target {
                entry.current_volume += entry.volume_increment;
                if entry.current_volume > target {
                    entry.current_volume = target;
                    self.volume_buffer[i] = entry.current_volume as f32;
                    filled = i + 1;
                    break;
                }
            } else {
                entry.current_volume -= entry.volume_decrement;
                if entry.current_volume < target {
                    entry.current_volume = target;
                    self.volume_buffer[i] = entry.current_volume as f32;
                    filled = i + 1;
                    break;
                }
            }
            self.volume_buffer[i] = entry.current_volume as f32;
        }

        if filled < buffer_size {
            self.volume_buffer[filled..buffer_size].fill(entry.current_volume as f32);
        }
    }

    fn contrast_factor(&self, grayscale: &[u16]) -> f64 {
        let stride = (self.contrast_stride.max(1.0)) as usize;
        let sampled: Vec<f64> = grayscale.iter().step_by(stride.max(1)).map(|&v| v as f64).collect();
        if sampled.is_empty() {
            return 1.0;
        }

        let mean = sampled.iter().sum::<f64>() / sampled.len() as f64;
        let variance = sampled.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / sampled.len() as f64;
        let variance_max = (self.volume_amp_resolution / 2.0).powi(2);

        let mut c = (variance / variance_max).sqrt();
        if !c.is_finite() {
            return 1.0;
        }
        c = c.powf(self.contrast_adjustment_power);
        let result = self.contrast_min + (1.0 - self.contrast_min) * c;
        if !result.is_finite() {
            1.0
        } else {
            result.clamp(self.contrast_min, 1.0)
        }
    }
}
