//! Engine-wide runtime configuration.

/// Every tunable constant referenced by the synthesis, image, and DMX
/// pipelines, gathered into a single value constructed once at startup and
/// threaded read-only through the worker threads.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    // --- Image / network ---
    pub pixels_per_line: usize,
    pub total_fragments: usize,
    pub fragment_size: usize,
    pub udp_port: u16,

    // --- Audio ---
    pub sample_rate: f64,
    pub audio_buffer_size: usize,

    // --- Wave table ---
    pub start_frequency: f64,
    pub semitone_per_octave: u32,
    pub comma_per_semitone: u32,
    pub wave_amp_resolution: f64,
    pub volume_amp_resolution: f64,
    pub volume_increment: f64,
    pub volume_decrement: f64,

    // --- Additive synth feature toggles ---
    pub color_inverted: bool,
    pub relative_mode: bool,
    pub non_linear_mapping: bool,
    pub gap_limiter: bool,
    pub gamma_value: f64,
    pub contrast_min: f64,
    pub contrast_stride: f64,
    pub contrast_adjustment_power: f64,

    // --- Spectral synth ---
    pub max_voices: usize,
    pub max_mapped_oscillators: usize,
    pub moving_average_window: usize,
    pub spectral_norm_factor_bin0: f64,
    pub spectral_norm_factor_harmonics: f64,
    pub spectral_amplitude_gamma: f64,

    // --- DMX ---
    pub dmx_num_spots: usize,
    pub dmx_red_factor: f64,
    pub dmx_green_factor: f64,
    pub dmx_blue_factor: f64,
    pub dmx_smoothing_factor: f64,
    pub dmx_gamma: f64,
    pub dmx_frame_period_ms: u64,
    pub dmx_baud: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let pixels_per_line = 3456;
        let total_fragments = 12;
        EngineConfig {
            pixels_per_line,
            total_fragments,
            fragment_size: pixels_per_line / total_fragments,
            udp_port: 55151,

            sample_rate: 48_000.0,
            audio_buffer_size: if cfg!(target_arch = "arm") || cfg!(target_arch = "aarch64") {
                1024
            } else {
                512
            },

            start_frequency: 65.41,
            semitone_per_octave: 12,
            comma_per_semitone: 36,
            wave_amp_resolution: 16_777_215.0,
            volume_amp_resolution: 65_535.0,
            volume_increment: 1.0,
            volume_decrement: 1.0,

            color_inverted: true,
            relative_mode: false,
            non_linear_mapping: true,
            gap_limiter: true,
            gamma_value: 1.8,
            contrast_min: 0.0,
            contrast_stride: 4.0,
            contrast_adjustment_power: 1.5,

            max_voices: 32,
            max_mapped_oscillators: 30,
            moving_average_window: 8,
            spectral_norm_factor_bin0: 881_280.0 * 1.1,
            spectral_norm_factor_harmonics: 220_320.0 * 2.0,
            spectral_amplitude_gamma: 2.0,

            dmx_num_spots: 18,
            dmx_red_factor: 1.0,
            dmx_green_factor: 1.5,
            dmx_blue_factor: 1.0,
            dmx_smoothing_factor: 0.80,
            dmx_gamma: 1.2,
            dmx_frame_period_ms: 25,
            dmx_baud: 250_000,
        }
    }
}

impl EngineConfig {
    /// Total number of addressable notes, one per pixel.
    pub fn number_of_notes(&self) -> usize {
        self.pixels_per_line
    }
}
