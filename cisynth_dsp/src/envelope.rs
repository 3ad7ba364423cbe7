//! ADSR envelope generator for spectral-synth voices.

/// ADSR envelope stages.
///
/// The envelope progresses through: Idle -> Attack -> Decay -> Sustain -> Release -> Idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

/// Minimum envelope stage time in seconds, to avoid division by zero.
const MIN_TIME: f64 = 0.001;
/// Maximum envelope stage time in seconds.
const MAX_TIME: f64 = 10.0;
/// Envelope floor (~-120dB) below which release is considered complete.
const ENVELOPE_FLOOR: f64 = 1e-6;

/// A single ADSR envelope, stepped one sample at a time.
///
/// Each ramping stage (attack/decay/release) recomputes its per-sample
/// increment every sample from the voice's *current* output and its
/// *remaining* samples in the stage, rather than from a fixed endpoint and
/// elapsed time. A live change to `attack`/`decay`/`release`/`sustain`
/// while a voice is mid-envelope therefore lands on target without a
/// discontinuity, instead of jumping.
#[derive(Debug, Clone)]
pub struct AdsrEnvelope {
    pub attack: f64,
    pub decay: f64,
    pub sustain: f64,
    pub release: f64,

    stage: EnvelopeStage,
    current_output: f64,
    stage_time: f64,
    release_level: f64,
}

impl AdsrEnvelope {
    pub fn new(attack: f64, decay: f64, sustain: f64, release: f64) -> Self {
        Self {
            attack,
            decay,
            sustain: sustain.clamp(0.0, 1.0),
            release,
            stage: EnvelopeStage::Idle,
            current_output: 0.0,
            stage_time: 0.0,
            release_level: 0.0,
        }
    }

    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    pub fn current_output(&self) -> f64 {
        self.current_output
    }

    pub fn is_idle(&self) -> bool {
        self.stage == EnvelopeStage::Idle
    }

    /// Trigger attack (note on). Jumps straight past a zero-length attack
    /// or decay stage.
    pub fn trigger_attack(&mut self) {
        self.current_output = 0.0;
        self.stage_time = 0.0;
        self.stage = EnvelopeStage::Attack;
        if self.clamped_attack() <= MIN_TIME {
            self.current_output = 1.0;
            self.enter_decay();
        }
    }

    /// Trigger release (note off). No-op from Idle.
    pub fn trigger_release(&mut self) {
        if self.stage != EnvelopeStage::Idle {
            self.release_level = self.current_output;
            self.stage = EnvelopeStage::Release;
            self.stage_time = 0.0;
        }
    }

    pub fn reset(&mut self) {
        self.stage = EnvelopeStage::Idle;
        self.current_output = 0.0;
        self.stage_time = 0.0;
        self.release_level = 0.0;
    }

    fn enter_decay(&mut self) {
        self.stage = EnvelopeStage::Decay;
        self.stage_time = 0.0;
        if self.clamped_decay() <= MIN_TIME || self.sustain >= 1.0 {
            self.current_output = self.sustain;
            self.stage = EnvelopeStage::Sustain;
        }
    }

    fn clamped_attack(&self) -> f64 {
        self.attack.clamp(MIN_TIME, MAX_TIME)
    }

    fn clamped_decay(&self) -> f64 {
        self.decay.clamp(MIN_TIME, MAX_TIME)
    }

    fn clamped_release(&self) -> f64 {
        self.release.clamp(MIN_TIME, MAX_TIME)
    }

    /// Advance the envelope by one sample and return the new output.
    pub fn next_sample(&mut self, sample_rate: f64) -> f64 {
        let dt = 1.0 / sample_rate;

        match self.stage {
            EnvelopeStage::Idle => {
                self.current_output = 0.0;
            }
            EnvelopeStage::Attack => {
                let remaining = (self.clamped_attack() - self.stage_time).max(0.0);
                self.current_output = Self::step_toward(self.current_output, 1.0, remaining, sample_rate);
                if self.current_output >= 1.0 {
                    self.current_output = 1.0;
                    self.enter_decay();
                }
            }
            EnvelopeStage::Decay => {
                let remaining = (self.clamped_decay() - self.stage_time).max(0.0);
                self.current_output = Self::step_toward(self.current_output, self.sustain, remaining, sample_rate);
                if self.current_output <= self.sustain {
                    self.current_output = self.sustain;
                    self.stage = EnvelopeStage::Sustain;
                    self.stage_time = 0.0;
                }
            }
            EnvelopeStage::Sustain => {
                self.current_output = self.sustain;
            }
            EnvelopeStage::Release => {
                let remaining = (self.clamped_release() - self.stage_time).max(0.0);
                self.current_output = Self::step_toward(self.current_output, 0.0, remaining, sample_rate);
                if self.current_output <= ENVELOPE_FLOOR {
                    self.current_output = 0.0;
                    self.stage = EnvelopeStage::Idle;
                    self.stage_time = 0.0;
                }
            }
        }

        if self.stage != EnvelopeStage::Idle && self.stage != EnvelopeStage::Sustain {
            self.stage_time += dt;
        }

        self.current_output.clamp(0.0, 1.0)
    }

    /// One sample's step from `current` toward `target`, sized so that
    /// holding the same remaining-time estimate for every step of the
    /// stage would land exactly on `target` when `remaining_time` reaches
    /// zero. Recomputing from `current` (rather than a cached endpoint)
    /// every sample is what makes a live stage-duration change land
    /// smoothly instead of snapping.
    fn step_toward(current: f64, target: f64, remaining_time: f64, sample_rate: f64) -> f64 {
        let remaining_samples = (remaining_time * sample_rate).max(1.0);
        current + (target - current) / remaining_samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f64 = 44_100.0;

    fn run(env: &mut AdsrEnvelope, samples: usize) -> Vec<f64> {
        (0..samples).map(|_| env.next_sample(SR)).collect()
    }

    #[test]
    fn idle_produces_zero() {
        let mut env = AdsrEnvelope::new(0.01, 0.1, 0.5, 0.2);
        for v in run(&mut env, 512) {
            assert!(v.abs() < 1e-9);
        }
    }

    #[test]
    fn output_stays_in_unit_range() {
        let mut env = AdsrEnvelope::new(0.01, 0.05, 0.7, 0.1);
        env.trigger_attack();
        for _ in 0..10 {
            for v in run(&mut env, 512) {
                assert!((0.0..=1.0).contains(&v));
            }
        }
    }

    #[test]
    fn attack_rises_and_reaches_peak() {
        let mut env = AdsrEnvelope::new(0.01, 0.5, 0.5, 0.5);
        env.trigger_attack();
        let mut peak = 0.0_f64;
        for _ in 0..10 {
            for v in run(&mut env, 512) {
                peak = peak.max(v);
            }
        }
        assert!(peak > 0.95, "expected attack to reach near 1.0, got {peak}");
    }

    #[test]
    fn sustain_holds_level() {
        let sustain = 0.6;
        let mut env = AdsrEnvelope::new(0.001, 0.001, sustain, 0.5);
        env.trigger_attack();
        run(&mut env, 20 * 512);
        let output = run(&mut env, 512);
        let avg: f64 = output.iter().sum::<f64>() / output.len() as f64;
        assert!((avg - sustain).abs() < 0.01);
    }

    #[test]
    fn release_falls_and_returns_to_zero() {
        let mut env = AdsrEnvelope::new(0.001, 0.001, 0.7, 0.01);
        env.trigger_attack();
        run(&mut env, 10 * 512);
        env.trigger_release();

        let first = run(&mut env, 256);
        let mut reached_zero = false;
        for _ in 0..20 {
            let batch = run(&mut env, 256);
            if *batch.last().unwrap() == 0.0 {
                reached_zero = true;
                break;
            }
        }
        assert!(first[0] > 0.0);
        assert!(reached_zero, "release should reach exactly zero");
        assert!(env.is_idle());
    }

    #[test]
    fn zero_time_envelope_jumps_to_sustain_within_one_sample() {
        let mut env = AdsrEnvelope::new(0.0, 0.0, 0.42, 0.1);
        env.trigger_attack();
        let first = env.next_sample(SR);
        assert!((first - 0.42).abs() < 1e-9);
    }

    #[test]
    fn retrigger_restarts_attack() {
        let mut env = AdsrEnvelope::new(0.001, 0.001, 0.5, 0.1);
        env.trigger_attack();
        run(&mut env, 5000);
        env.trigger_attack();
        assert!(env.next_sample(SR) < 0.5);
    }

    #[test]
    fn live_parameter_change_during_release_still_reaches_zero_in_time() {
        let mut env = AdsrEnvelope::new(0.001, 0.001, 0.8, 0.1);
        env.trigger_attack();
        run(&mut env, 5000);
        env.trigger_release();
        run(&mut env, 100);
        // change release time mid-flight
        env.release = 0.02;
        let release_samples = (0.02 * SR).ceil() as usize + 10;
        let output = run(&mut env, release_samples);
        assert_eq!(*output.last().unwrap(), 0.0);
    }

    #[test]
    fn shortening_release_mid_flight_does_not_jump() {
        let mut env = AdsrEnvelope::new(0.001, 0.001, 0.8, 1.0);
        env.trigger_attack();
        run(&mut env, 5000);
        env.trigger_release();
        let before = run(&mut env, 100);
        let last_before = *before.last().unwrap();

        // A shorter release (but still longer than the time already elapsed
        // in this stage) should still move smoothly from here, not snap to
        // a value implied by the new duration and the old elapsed time.
        env.release = 0.01;
        let after = env.next_sample(SR);
        assert!(
            (after - last_before).abs() < 0.05,
            "expected a small step, got {last_before} -> {after}"
        );
    }

    #[test]
    fn shortening_decay_mid_flight_does_not_jump() {
        let mut env = AdsrEnvelope::new(0.001, 1.0, 0.2, 0.1);
        env.trigger_attack();
        run(&mut env, 50);
        assert_eq!(env.stage(), EnvelopeStage::Decay);
        let before = run(&mut env, 50);
        let last_before = *before.last().unwrap();

        env.decay = 0.01;
        let after = env.next_sample(SR);
        assert!(
            (after - last_before).abs() < 0.05,
            "expected a small step, got {last_before} -> {after}"
        );
    }

    #[test]
    fn note_off_from_idle_is_noop() {
        let mut env = AdsrEnvelope::new(0.1, 0.1, 0.5, 0.1);
        env.trigger_release();
        assert!(env.is_idle());
        assert_eq!(env.next_sample(SR), 0.0);
    }
}
