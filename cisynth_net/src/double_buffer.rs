//! One-writer/many-reader handoff of the latest complete image line.
//!
//! Readers block on a condvar until a line is ready; the first reader to
//! observe it clears the ready flag and takes ownership of the line.
//! Frame-skipping is explicit policy here: this engine favors latest data
//! over complete delivery, so a reader that wakes late may find the flag
//! already cleared by a faster sibling and simply waits for the next line.

use std::sync::{Arc, Condvar, Mutex};

/// One fully reassembled RGB line.
#[derive(Debug, Clone)]
pub struct ImageLine {
    pub line_id: u32,
    pub red: Vec<u8>,
    pub green: Vec<u8>,
    pub blue: Vec<u8>,
}

impl ImageLine {
    /// BT.601 luma weights, scaled to 16-bit per the data model.
    pub fn to_grayscale_u16(&self) -> Vec<u16> {
        self.red
            .iter()
            .zip(&self.green)
            .zip(&self.blue)
            .map(|((&r, &g), &b)| {
                let luma = (299 * r as u32 + 587 * g as u32 + 114 * b as u32) / 1000;
                ((luma * 65535) / 255) as u16
            })
            .collect()
    }
}

struct State {
    line: Option<ImageLine>,
}

/// Shared handoff slot. Clone the `Arc` to hand out multiple reader
/// handles; the reassembler holds the writer side.
pub struct ImageDoubleBuffer {
    state: Mutex<State>,
    condvar: Condvar,
}

impl ImageDoubleBuffer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(State { line: None }),
            condvar: Condvar::new(),
        })
    }

    /// Publish a newly completed line, overwriting any unread line from the
    /// previous publish. Never blocks on a slow reader.
    pub fn publish(&self, line: ImageLine) {
        let mut state = self.state.lock().unwrap();
        state.line = Some(line);
        self.condvar.notify_all();
    }

    /// Block until a line is ready, then take it. Returns `None` only if the
    /// buffer was poisoned (producer panicked mid-publish).
    pub fn wait_for_line(&self) -> Option<ImageLine> {
        let mut state = self.state.lock().ok()?;
        while state.line.is_none() {
            state = self.condvar.wait(state).ok()?;
        }
        state.line.take()
    }

    /// Non-blocking poll: take the ready line if there is one.
    pub fn try_take(&self) -> Option<ImageLine> {
        self.state.lock().ok()?.line.take()
    }

    /// Wait up to `timeout` for a line, then take whatever is ready (which
    /// may be nothing). Used by the DMX thread, which re-checks its
    /// shutdown flag on every timeout per spec.md §5.
    pub fn wait_for_line_timeout(&self, timeout: std::time::Duration) -> Option<ImageLine> {
        let mut state = self.state.lock().ok()?;
        if state.line.is_none() {
            let (guard, _timeout_result) = self.condvar.wait_timeout(state, timeout).ok()?;
            state = guard;
        }
        state.line.take()
    }
}
