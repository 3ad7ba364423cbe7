//! Precomputed per-note wave table for the additive (IFFT) synth.
//!
//! Each note reuses a single shared region of precomputed sine cells (one
//! cell per comma in the reference octave); higher octaves are reached by
//! striding through the same cell rather than storing a separate waveform,
//! following the original engine's `init_waves` strategy.

use std::f64::consts::PI;

/// Per-note playback state and pointer into the shared waveform region.
#[derive(Debug, Clone, Copy)]
pub struct WaveEntry {
    pub frequency: f64,
    /// Offset into the shared waveform region where this note's cell begins.
    pub start_offset: usize,
    /// Number of samples in the underlying cell (always the reference-octave size).
    pub area_size: usize,
    /// Index stride used to read the cell at this note's octave.
    pub octave_coeff: usize,
    pub max_volume_increment: f64,
    pub max_volume_decrement: f64,
    pub current_idx: usize,
    pub current_volume: f64,
    pub volume_increment: f64,
    pub volume_decrement: f64,
}

/// Error raised when the wave table cannot be constructed within its
/// preallocated region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WaveTableError {
    #[error("wave table region overflow: needed {needed} samples, limit {limit}")]
    RegionOverflow { needed: usize, limit: usize },
    #[error("could not place all {expected} notes; placed {placed}")]
    IncompleteCoverage { expected: usize, placed: usize },
}

/// Upper bound on the shared precomputed waveform region, matching the
/// original firmware's sanity check.
const MAX_REGION_SAMPLES: usize = 2_400_000;

pub struct WaveTable {
    pub region: Vec<f32>,
    pub entries: Vec<WaveEntry>,
}

impl WaveTable {
    /// Build the wave table for `number_of_notes` pitches spanning
    /// successive octaves above a logarithmic comma grid anchored at
    /// `start_frequency`.
    pub fn build(
        number_of_notes: usize,
        start_frequency: f64,
        sample_rate: f64,
        semitone_per_octave: u32,
        comma_per_semitone: u32,
        wave_amp_resolution: f64,
        volume_amp_resolution: f64,
        volume_increment_setting: f64,
        volume_decrement_setting: f64,
        mut seed: crate::rng::NoteSeed,
    ) -> Result<Self, WaveTableError> {
        let commas_per_octave = (semitone_per_octave * comma_per_semitone) as usize;

        let frequencies: Vec<f64> = (0..commas_per_octave)
            .map(|c| calculate_frequency(c as u32, start_frequency, semitone_per_octave, comma_per_semitone))
            .collect();

        let region_len: usize = frequencies.iter().map(|f| (sample_rate / f) as usize).sum();
        if region_len > MAX_REGION_SAMPLES {
            return Err(WaveTableError::RegionOverflow {
                needed: region_len,
                limit: MAX_REGION_SAMPLES,
            });
        }

        let mut region = vec![0.0f32; region_len];
        let mut entries = vec![
            WaveEntry {
                frequency: 0.0,
                start_offset: 0,
                area_size: 0,
                octave_coeff: 1,
                max_volume_increment: 0.0,
                max_volume_decrement: 0.0,
                current_idx: 0,
                current_volume: 0.0,
                volume_increment: 0.0,
                volume_decrement: 0.0,
            };
            number_of_notes
        ];

        let mut cursor = 0usize;
        let mut placed = 0usize;
        let max_octave = number_of_notes / commas_per_octave;

        for (comma, &frequency) in frequencies.iter().enumerate() {
            let area_size = ((sample_rate / frequency) / 2.0) as usize;
            let cell_start = cursor;
            fill_sine_cell(&mut region[cell_start..cell_start + area_size], area_size, wave_amp_resolution);
            cursor += area_size;

            for octave in 0..=max_octave {
                let note = comma + commas_per_octave * octave;
                if note >= number_of_notes {
                    continue;
                }

                let (octave_coeff, sample_at_stride) = if octave == 0 {
                    (1usize, region[cell_start + 1] as f64)
                } else {
                    let coeff = 1usize << (octave - 1);
                    (coeff, region[cell_start + coeff.min(area_size - 1)] as f64)
                };

                let max_volume_step = (sample_at_stride / (if octave == 0 { 2.0 } else { 1.0 })).abs()
                    / (wave_amp_resolution / volume_amp_resolution);

                entries[note] = WaveEntry {
                    frequency: frequency * 2f64.powi(octave as i32),
                    start_offset: cell_start,
                    area_size,
                    octave_coeff,
                    max_volume_increment: max_volume_step,
                    max_volume_decrement: max_volume_step,
                    current_idx: seed.next_index(area_size),
                    current_volume: 0.0,
                    volume_increment: 0.0,
                    volume_decrement: 0.0,
                };
                placed += 1;
            }
        }

        if placed < number_of_notes {
            return Err(WaveTableError::IncompleteCoverage {
                expected: number_of_notes,
                placed,
            });
        }

        for entry in entries.iter_mut() {
            entry.volume_increment = scaled_rate(volume_increment_setting, entry.max_volume_increment);
            entry.volume_decrement = scaled_rate(volume_decrement_setting, entry.max_volume_decrement);
        }

        Ok(WaveTable { region, entries })
    }

    /// Advance `note`'s phase by one sample (by `octave_coeff`, wrapping at
    /// `area_size`) and return the raw waveform value at the new index.
    #[inline]
    pub fn step(&mut self, note: usize) -> f32 {
        let entry = &mut self.entries[note];
        let mut new_idx = entry.current_idx + entry.octave_coeff;
        if new_idx >= entry.area_size {
            new_idx -= entry.area_size;
        }
        entry.current_idx = new_idx;
        self.region[entry.start_offset + new_idx]
    }
}

fn scaled_rate(setting: f64, max_rate: f64) -> f64 {
    let clamped = if setting <= 0.0 {
        0.0
    } else if setting > 1000.0 {
        100.0
    } else {
        setting
    };
    if clamped == 0.0 {
        0.0
    } else {
        (1.0 / clamped) * max_rate
    }
}

fn calculate_frequency(comma: u32, start_frequency: f64, semitone_per_octave: u32, comma_per_semitone: u32) -> f64 {
    let commas_per_octave = (semitone_per_octave * comma_per_semitone) as f64;
    start_frequency * 2f64.powf(comma as f64 / commas_per_octave)
}

fn fill_sine_cell(cell: &mut [f32], area_size: usize, wave_amp_resolution: f64) {
    for (x, slot) in cell.iter_mut().enumerate() {
        let phase = (x as f64 * 2.0 * PI) / area_size as f64;
        *slot = (phase.sin() * (wave_amp_resolution / 2.0)) as f32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::NoteSeed;

    fn build_small() -> WaveTable {
        WaveTable::build(
            432,
            65.41,
            48_000.0,
            12,
            36,
            16_777_215.0,
            65_535.0,
            1.0,
            1.0,
            NoteSeed::new(1),
        )
        .unwrap()
    }

    #[test]
    fn covers_every_note() {
        let table = build_small();
        assert_eq!(table.entries.len(), 432);
        for entry in &table.entries {
            assert!(entry.frequency > 0.0);
            assert!(entry.area_size > 0);
        }
    }

    #[test]
    fn frequencies_increase_with_note_index() {
        let table = build_small();
        assert!(table.entries[0].frequency < table.entries[431].frequency);
    }

    #[test]
    fn phase_identity_after_full_area_advance() {
        let mut table = build_small();
        let note = 10;
        let start_idx = table.entries[note].current_idx;
        let coeff = table.entries[note].octave_coeff;
        let area = table.entries[note].area_size;
        let steps = area / coeff;
        for _ in 0..steps {
            table.step(note);
        }
        assert_eq!(table.entries[note].current_idx, start_idx);
    }

    #[test]
    fn region_never_indexed_out_of_bounds() {
        let mut table = build_small();
        for note in 0..table.entries.len() {
            for _ in 0..16 {
                table.step(note);
            }
        }
    }

    #[test]
    fn overflow_is_reported_as_fatal_error() {
        let result = WaveTable::build(
            3456 * 20,
            1.0,
            48_000.0,
            12,
            36,
            16_777_215.0,
            65_535.0,
            1.0,
            1.0,
            NoteSeed::new(1),
        );
        assert!(result.is_err());
    }
}
