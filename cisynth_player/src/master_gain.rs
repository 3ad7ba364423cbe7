//! Linear master gain, applied to the ring's output just before it reaches
//! the host callback. Stored as bit-pattern atomics so the MIDI control
//! surface thread can update it without a lock.

use std::sync::atomic::{AtomicU32, Ordering};

pub struct MasterGain {
    bits: AtomicU32,
}

impl MasterGain {
    pub fn new(initial: f32) -> Self {
        Self { bits: AtomicU32::new(initial.to_bits()) }
    }

    pub fn set(&self, value: f32) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn get(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

impl Default for MasterGain {
    fn default() -> Self {
        Self::new(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_unity_gain() {
        assert_eq!(MasterGain::default().get(), 1.0);
    }

    #[test]
    fn set_then_get_round_trips() {
        let gain = MasterGain::new(1.0);
        gain.set(0.25);
        assert_eq!(gain.get(), 0.25);
    }
}
