//! The three per-thread-context termination flags, set together on
//! shutdown signal and re-checked by each worker at every loop iteration
//! and timed-wait expiry, per spec.md §5.

use std::sync::{atomic::{AtomicBool, Ordering}, Arc};

#[derive(Clone)]
pub struct Shutdown {
    pub dmx: Arc<AtomicBool>,
    pub net: Arc<AtomicBool>,
    pub dsp: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self {
            dmx: Arc::new(AtomicBool::new(false)),
            net: Arc::new(AtomicBool::new(false)),
            dsp: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn request(&self) {
        self.dmx.store(true, Ordering::SeqCst);
        self.net.store(true, Ordering::SeqCst);
        self.dsp.store(true, Ordering::SeqCst);
    }

    pub fn requested(&self) -> bool {
        self.dsp.load(Ordering::SeqCst)
    }
}
