//! Polyphonic voice pool for the spectral synth.

use crate::envelope::AdsrEnvelope;

/// Convert a MIDI note number to frequency in Hz (A4 = note 69 = 440 Hz).
pub fn midi_note_to_frequency(note: u8) -> f64 {
    440.0 * 2f64.powf((note as f64 - 69.0) / 12.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Idle,
    Active,
    Releasing,
}

/// One polyphonic slot: a fundamental frequency, a bank of harmonic phases,
/// a volume and filter ADSR, and note-ownership bookkeeping for voice
/// stealing.
pub struct Voice {
    pub midi_note: Option<u8>,
    pub frequency: f64,
    pub velocity: f64,
    pub last_triggered_order: u64,
    pub harmonic_phases: Vec<f64>,
    pub volume_env: AdsrEnvelope,
    pub filter_env: AdsrEnvelope,
}

impl Voice {
    pub fn new(max_oscillators: usize, volume_env: AdsrEnvelope, filter_env: AdsrEnvelope) -> Self {
        Self {
            midi_note: None,
            frequency: 0.0,
            velocity: 0.0,
            last_triggered_order: 0,
            harmonic_phases: vec![0.0; max_oscillators],
            volume_env,
            filter_env,
        }
    }

    pub fn state(&self) -> VoiceState {
        use crate::envelope::EnvelopeStage::Release;

        if self.volume_env.is_idle() {
            VoiceState::Idle
        } else if self.volume_env.stage() == Release {
            VoiceState::Releasing
        } else {
            VoiceState::Active
        }
    }

    pub fn trigger(&mut self, note: u8, velocity: f64, order: u64) {
        self.midi_note = Some(note);
        self.frequency = midi_note_to_frequency(note);
        self.velocity = velocity;
        self.last_triggered_order = order;
        self.harmonic_phases.iter_mut().for_each(|p| *p = 0.0);
        self.volume_env.trigger_attack();
        self.filter_env.trigger_attack();
    }

    pub fn release(&mut self) {
        self.volume_env.trigger_release();
        self.filter_env.trigger_release();
    }
}

/// A fixed-size pool implementing the voice-stealing policy from the
/// spectral synth contract: first idle voice, else oldest non-releasing
/// voice, else the releasing voice with the smallest current output, else
/// voice 0.
pub struct VoicePool {
    pub voices: Vec<Voice>,
    next_order: u64,
}

impl VoicePool {
    pub fn new(count: usize, max_oscillators: usize, volume_adsr: (f64, f64, f64, f64), filter_adsr: (f64, f64, f64, f64)) -> Self {
        let voices = (0..count)
            .map(|_| {
                Voice::new(
                    max_oscillators,
                    AdsrEnvelope::new(volume_adsr.0, volume_adsr.1, volume_adsr.2, volume_adsr.3),
                    AdsrEnvelope::new(filter_adsr.0, filter_adsr.1, filter_adsr.2, filter_adsr.3),
                )
            })
            .collect();
        Self { voices, next_order: 0 }
    }

    pub fn note_on(&mut self, note: u8, velocity: f64) {
        let order = self.next_order;
        self.next_order += 1;

        let index = self.choose_voice_for_stealing();
        self.voices[index].trigger(note, velocity, order);
    }

    pub fn note_off(&mut self, note: u8) {
        for voice in self.voices.iter_mut() {
            if voice.midi_note == Some(note) {
                voice.release();
            }
        }
    }

    fn choose_voice_for_stealing(&self) -> usize {
        if let Some(idx) = self.voices.iter().position(|v| v.state() == VoiceState::Idle) {
            return idx;
        }

        if let Some(idx) = self
            .voices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.state() == VoiceState::Active)
            .min_by_key(|(_, v)| v.last_triggered_order)
            .map(|(i, _)| i)
        {
            return idx;
        }

        if let Some(idx) = self
            .voices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.state() == VoiceState::Releasing)
            .min_by(|(_, a), (_, b)| a.volume_env.current_output().total_cmp(&b.volume_env.current_output()))
            .map(|(i, _)| i)
        {
            return idx;
        }

        0
    }

    /// Advance every active voice's envelopes by one sample and mark any
    /// newly-completed release as idle (clearing its note association).
    pub fn tick_envelopes(&mut self, sample_rate: f64) {
        for voice in self.voices.iter_mut() {
            if voice.midi_note.is_some() {
                voice.volume_env.next_sample(sample_rate);
                voice.filter_env.next_sample(sample_rate);
                if voice.volume_env.is_idle() {
                    voice.midi_note = None;
                }
            }
        }
    }
}
