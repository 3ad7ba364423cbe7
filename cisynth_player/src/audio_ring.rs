//! Two-slot lock-step ring between a synth-engine producer and the audio
//! callback consumer.
//!
//! Each slot is `AUDIO_BUFFER_SIZE` frames. The producer writes one full
//! slot, publishes it with `Release`, and flips its own write index; the
//! callback drains what's `ready` with `Acquire` and flips its own read
//! index only once a slot is fully consumed. A not-ready slot mid-batch is
//! silence-filled for the remainder of the host's request without
//! advancing the read index — the underrun is absorbed, not stalled past.

use std::{
    cell::UnsafeCell,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

struct Slot {
    data: UnsafeCell<Vec<f32>>,
    ready: AtomicBool,
}

// SAFETY: the producer only writes `data` while `ready` is false (observed
// with Acquire), and the consumer only reads it while `ready` is true
// (also observed with Acquire); the two threads never touch `data`
// concurrently.
unsafe impl Sync for Slot {}

struct Ring {
    slots: [Slot; 2],
}

pub fn audio_ring(buffer_size: usize) -> (RingProducer, RingConsumer) {
    let ring = Arc::new(Ring {
        slots: [
            Slot { data: UnsafeCell::new(vec![0.0; buffer_size]), ready: AtomicBool::new(false) },
            Slot { data: UnsafeCell::new(vec![0.0; buffer_size]), ready: AtomicBool::new(false) },
        ],
    });

    (
        RingProducer { ring: Arc::clone(&ring), write_index: 0 },
        RingConsumer { ring, read_index: 0, read_offset: 0 },
    )
}

pub struct RingProducer {
    ring: Arc<Ring>,
    write_index: usize,
}

impl RingProducer {
    /// Write one full slot's worth of samples and publish it. Returns
    /// `false` without writing if the target slot is still marked ready
    /// (the callback hasn't drained the previous cycle's data yet) — the
    /// caller should retry on its next line rather than overwrite live data.
    pub fn try_publish(&mut self, samples: &[f32]) -> bool {
        let slot = &self.ring.slots[self.write_index];
        if slot.ready.load(Ordering::Acquire) {
            return false;
        }

        // SAFETY: the slot is confirmed not-ready, so the consumer isn't
        // reading it; only the producer writes, so no other writer exists.
        let data = unsafe { &mut *slot.data.get() };
        let n = samples.len().min(data.len());
        data[..n].copy_from_slice(&samples[..n]);
        if n < data.len() {
            data[n..].fill(0.0);
        }

        slot.ready.store(true, Ordering::Release);
        self.write_index = 1 - self.write_index;
        true
    }
}

pub struct RingConsumer {
    ring: Arc<Ring>,
    read_index: usize,
    read_offset: usize,
}

impl RingConsumer {
    /// Fill `output` from the ring, silence-padding any remainder that a
    /// not-yet-ready slot can't supply. Never blocks.
    pub fn fill(&mut self, output: &mut [f32]) {
        let mut pos = 0;
        while pos < output.len() {
            let slot = &self.ring.slots[self.read_index];
            if !slot.ready.load(Ordering::Acquire) {
                output[pos..].fill(0.0);
                return;
            }

            // SAFETY: `ready` observed true, so the producer has finished
            // writing this slot and moved to the other one.
            let data = unsafe { &*slot.data.get() };
            let available = data.len() - self.read_offset;
            let remaining = output.len() - pos;
            let n = available.min(remaining);

            output[pos..pos + n].copy_from_slice(&data[self.read_offset..self.read_offset + n]);
            self.read_offset += n;
            pos += n;

            if self.read_offset == data.len() {
                slot.ready.store(false, Ordering::Release);
                self.read_index = 1 - self.read_index;
                self.read_offset = 0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fully_ready_slot_is_copied_through() {
        let (mut producer, mut consumer) = audio_ring(4);
        assert!(producer.try_publish(&[1.0, 2.0, 3.0, 4.0]));

        let mut output = vec![0.0f32; 4];
        consumer.fill(&mut output);
        assert_eq!(output, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn underrun_silences_remainder_without_advancing_read_index() {
        let (_producer, mut consumer) = audio_ring(4);
        let mut output = vec![9.0f32; 4];
        consumer.fill(&mut output);
        assert_eq!(output, vec![0.0, 0.0, 0.0, 0.0]);
        assert_eq!(consumer.read_offset, 0, "underrun must not advance the partially-drained offset");
    }

    #[test]
    fn batch_smaller_than_slot_splits_across_two_calls() {
        let (mut producer, mut consumer) = audio_ring(4);
        producer.try_publish(&[1.0, 2.0, 3.0, 4.0]);

        let mut first = vec![0.0f32; 2];
        consumer.fill(&mut first);
        assert_eq!(first, vec![1.0, 2.0]);

        let mut second = vec![0.0f32; 2];
        consumer.fill(&mut second);
        assert_eq!(second, vec![3.0, 4.0]);
    }

    #[test]
    fn producer_refuses_to_overwrite_an_unread_slot() {
        let (mut producer, _consumer) = audio_ring(2);
        assert!(producer.try_publish(&[1.0, 2.0]));
        assert!(!producer.try_publish(&[3.0, 4.0]), "write slot still ready, not yet drained");
    }

    #[test]
    fn slot_becomes_writable_again_after_full_drain() {
        let (mut producer, mut consumer) = audio_ring(2);
        producer.try_publish(&[1.0, 2.0]);
        let mut output = vec![0.0f32; 2];
        consumer.fill(&mut output);

        assert!(producer.try_publish(&[5.0, 6.0]));
    }
}
