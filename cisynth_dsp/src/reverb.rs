//! Schroeder/Moorer-style reverb: four parallel comb filters feeding two
//! series allpass stages, driven by the MIDI control-surface reverb CCs
//! (mix, room size, damping, stereo width).

use cisynth_core::flush_denormal_f64;

const COMB_DELAYS_MS: [f64; 4] = [29.7, 37.1, 41.1, 43.7];
const ALLPASS_DELAYS_MS: [f64; 2] = [5.0, 1.7];
const ALLPASS_GAIN: f64 = 0.5;

struct Comb {
    buffer: Vec<f64>,
    pos: usize,
    filter_state: f64,
    feedback: f64,
    damping: f64,
}

impl Comb {
    fn new(delay_samples: usize) -> Self {
        Self {
            buffer: vec![0.0; delay_samples.max(1)],
            pos: 0,
            filter_state: 0.0,
            feedback: 0.5,
            damping: 0.5,
        }
    }

    #[inline]
    fn process(&mut self, input: f64) -> f64 {
        let output = self.buffer[self.pos];
        self.filter_state = output * (1.0 - self.damping) + self.filter_state * self.damping;
        self.filter_state = flush_denormal_f64(self.filter_state);
        self.buffer[self.pos] = input + self.filter_state * self.feedback;
        self.pos = (self.pos + 1) % self.buffer.len();
        output
    }
}

struct Allpass {
    buffer: Vec<f64>,
    pos: usize,
}

impl Allpass {
    fn new(delay_samples: usize) -> Self {
        Self {
            buffer: vec![0.0; delay_samples.max(1)],
            pos: 0,
        }
    }

    #[inline]
    fn process(&mut self, input: f64) -> f64 {
        let delayed = self.buffer[self.pos];
        let output = -input * ALLPASS_GAIN + delayed;
        self.buffer[self.pos] = input + delayed * ALLPASS_GAIN;
        self.pos = (self.pos + 1) % self.buffer.len();
        output
    }
}

/// Schroeder reverb effector, one instance per channel.
pub struct Reverb {
    combs: [Comb; 4],
    allpasses: [Allpass; 2],

    pub mix: f64,
    pub room_size: f64,
    pub damping: f64,
    pub width: f64,
}

impl Reverb {
    pub fn new(sample_rate: f64) -> Self {
        let delay_samples = |ms: f64| ((ms / 1000.0) * sample_rate) as usize;

        Self {
            combs: COMB_DELAYS_MS.map(|ms| Comb::new(delay_samples(ms))),
            allpasses: ALLPASS_DELAYS_MS.map(|ms| Allpass::new(delay_samples(ms))),
            // Bypassed until the first reverb CC arrives (original's
            // enableReverb(true) on first touch).
            mix: 0.0,
            room_size: 0.5,
            damping: 0.5,
            width: 1.0,
        }
    }

    /// Set the wet/dry mix from a normalized MIDI CC value in `[0, 1]`.
    pub fn set_mix(&mut self, value: f64) {
        self.mix = value.clamp(0.0, 1.0);
    }

    pub fn set_room_size(&mut self, value: f64) {
        self.room_size = value.clamp(0.0, 1.0);
        let feedback = 0.28 + self.room_size * 0.7;
        for comb in self.combs.iter_mut() {
            comb.feedback = feedback;
        }
    }

    pub fn set_damping(&mut self, value: f64) {
        self.damping = value.clamp(0.0, 1.0);
        for comb in self.combs.iter_mut() {
            comb.damping = self.damping;
        }
    }

    pub fn set_width(&mut self, value: f64) {
        self.width = value.clamp(0.0, 1.0);
    }

    /// Process one mono sample, returning the mix of dry and reverberated
    /// signal. Stereo width is applied by the caller, which should pan two
    /// instances (left/right) apart using `width`.
    pub fn process(&mut self, input: f32) -> f32 {
        let dry = input as f64;

        let mut wet = 0.0;
        for comb in self.combs.iter_mut() {
            wet += comb.process(dry);
        }
        wet /= self.combs.len() as f64;

        for allpass in self.allpasses.iter_mut() {
            wet = allpass.process(wet);
        }

        let output = dry * (1.0 - self.mix) + wet * self.mix;
        output.clamp(-1.0, 1.0) as f32
    }

    pub fn process_buffer(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_mix_passes_signal_through_unchanged() {
        let mut reverb = Reverb::new(44_100.0);
        reverb.set_mix(0.0);
        let input = 0.5f32;
        let output = reverb.process(input);
        assert!((output - input).abs() < 1e-6);
    }

    #[test]
    fn impulse_response_stays_bounded() {
        let mut reverb = Reverb::new(44_100.0);
        reverb.set_mix(1.0);
        reverb.set_room_size(0.9);
        reverb.set_damping(0.2);

        let mut buffer = vec![0.0f32; 4096];
        buffer[0] = 1.0;
        reverb.process_buffer(&mut buffer);

        for &s in &buffer {
            assert!(s.is_finite());
            assert!((-1.0..=1.0).contains(&s));
        }
    }

    #[test]
    fn cc_setters_clamp_to_unit_range() {
        let mut reverb = Reverb::new(44_100.0);
        reverb.set_mix(2.0);
        reverb.set_room_size(-1.0);
        reverb.set_damping(5.0);
        reverb.set_width(-5.0);
        assert_eq!(reverb.mix, 1.0);
        assert_eq!(reverb.room_size, 0.0);
        assert_eq!(reverb.damping, 1.0);
        assert_eq!(reverb.width, 0.0);
    }

    #[test]
    fn silence_in_silence_out() {
        let mut reverb = Reverb::new(44_100.0);
        reverb.set_mix(1.0);
        let mut buffer = vec![0.0f32; 1024];
        reverb.process_buffer(&mut buffer);
        for &s in &buffer {
            assert_eq!(s, 0.0);
        }
    }
}
