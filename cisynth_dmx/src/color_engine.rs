//! Per-zone average color derivation with gamma/luminance modulation and
//! exponential-moving-average temporal smoothing.
//!
//! Grounded directly in `computeAverageColorPerZone`/`applyColorProfile`
//! from the original engine: the extended blob-detection and
//! saturation/threshold constants present in its `config.h` belong to an
//! unused, more elaborate zone-segmentation variant and are not ported —
//! this is the simple per-zone-mean algorithm the function actually runs.

use cisynth_core::EngineConfig;

/// One DMX-addressable spot: smoothed RGB plus its fixed channel offset in
/// the 513-byte universe frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct DmxSpot {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub channel_offset: usize,
}

struct SmoothingState {
    initialized: bool,
    red: f64,
    green: f64,
    blue: f64,
}

impl Default for SmoothingState {
    fn default() -> Self {
        Self { initialized: false, red: 0.0, green: 0.0, blue: 0.0 }
    }
}

pub struct ColorEngine {
    num_spots: usize,
    red_factor: f64,
    green_factor: f64,
    blue_factor: f64,
    smoothing_factor: f64,
    gamma: f64,
    state: Vec<SmoothingState>,
    pub spots: Vec<DmxSpot>,
}

impl ColorEngine {
    pub fn new(config: &EngineConfig) -> Self {
        let num_spots = config.dmx_num_spots;
        let spots = (0..num_spots)
            .map(|i| DmxSpot {
                red: 0,
                green: 0,
                blue: 0,
                channel_offset: 1 + i * 3,
            })
            .collect();

        Self {
            num_spots,
            red_factor: config.dmx_red_factor,
            green_factor: config.dmx_green_factor,
            blue_factor: config.dmx_blue_factor,
            smoothing_factor: config.dmx_smoothing_factor,
            gamma: config.dmx_gamma,
            state: (0..num_spots).map(|_| SmoothingState::default()).collect(),
            spots,
        }
    }

    /// Recompute every spot's color from one reassembled RGB line.
    pub fn update(&mut self, red: &[u8], green: &[u8], blue: &[u8]) {
        let num_pixels = red.len();
        let zone_size = num_pixels / self.num_spots;

        for i in 0..self.num_spots {
            let start = i * zone_size;
            let end = if i == self.num_spots - 1 { num_pixels } else { start + zone_size };
            let count = (end - start).max(1);

            let sum_r: u64 = red[start..end].iter().map(|&v| v as u64).sum();
            let sum_g: u64 = green[start..end].iter().map(|&v| v as u64).sum();
            let sum_b: u64 = blue[start..end].iter().map(|&v| v as u64).sum();

            let avg_r = sum_r as f64 / count as f64;
            let avg_g = sum_g as f64 / count as f64;
            let avg_b = sum_b as f64 / count as f64;

            let luminance = 0.299 * avg_r + 0.587 * avg_g + 0.114 * avg_b;
            let inverted = 255.0 - luminance;
            let intensity = (inverted / 255.0).powf(self.gamma);

            let final_r = avg_r * intensity;
            let final_g = avg_g * intensity;
            let final_b = avg_b * intensity;

            let state = &mut self.state[i];
            let alpha = self.smoothing_factor;
            if !state.initialized {
                state.red = final_r;
                state.green = final_g;
                state.blue = final_b;
                state.initialized = true;
            } else {
                state.red = alpha * state.red + (1.0 - alpha) * final_r;
                state.green = alpha * state.green + (1.0 - alpha) * final_g;
                state.blue = alpha * state.blue + (1.0 - alpha) * final_b;
            }

            let (r, g, b) = apply_color_profile(state.red, state.green, state.blue, self.red_factor, self.green_factor, self.blue_factor);
            self.spots[i].red = r;
            self.spots[i].green = g;
            self.spots[i].blue = b;
        }
    }
}

/// Scale each channel by its profile factor and clamp to a byte.
fn apply_color_profile(red: f64, green: f64, blue: f64, red_factor: f64, green_factor: f64, blue_factor: f64) -> (u8, u8, u8) {
    let clamp = |v: f64| v.clamp(0.0, 255.0) as u8;
    (clamp(red * red_factor), clamp(green * green_factor), clamp(blue * blue_factor))
}
