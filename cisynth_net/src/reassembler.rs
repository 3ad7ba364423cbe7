//! Reconstructs full RGB lines from UDP fragments.

use crate::{
    double_buffer::ImageLine,
    packet::{FragmentPacket, PacketError},
};

/// Accumulates fragments for the line currently in flight. `line_id` changes
/// reset tracking unconditionally: a line with missing fragments is
/// abandoned the moment a newer `line_id` arrives, never partially
/// published.
pub struct LineReassembler {
    pixels_per_line: usize,
    expected_fragments: usize,
    fragment_size: usize,

    current_line_id: Option<u32>,
    received: Vec<bool>,
    red: Vec<u8>,
    green: Vec<u8>,
    blue: Vec<u8>,
}

impl LineReassembler {
    pub fn new(pixels_per_line: usize, total_fragments: usize, fragment_size: usize) -> Self {
        Self {
            pixels_per_line,
            expected_fragments: total_fragments,
            fragment_size,
            current_line_id: None,
            received: vec![false; total_fragments],
            red: vec![0u8; pixels_per_line],
            green: vec![0u8; pixels_per_line],
            blue: vec![0u8; pixels_per_line],
        }
    }

    /// Feed one raw datagram. Returns `Some(line)` when this fragment
    /// completes a line, `None` otherwise (including on a dropped or
    /// malformed packet).
    pub fn accept(&mut self, datagram: &[u8]) -> Option<ImageLine> {
        let packet = FragmentPacket::parse(datagram).ok()?;
        self.accept_packet(&packet)
    }

    fn accept_packet(&mut self, packet: &FragmentPacket<'_>) -> Option<ImageLine> {
        if packet.fragment_id as usize >= self.expected_fragments {
            return None;
        }

        if self.current_line_id != Some(packet.line_id) {
            self.reset_for(packet.line_id);
        }

        let fragment_id = packet.fragment_id as usize;
        if self.received[fragment_id] {
            // Idempotent per (line_id, fragment_id): duplicates are dropped.
            return None;
        }

        let offset = fragment_id * self.fragment_size;
        let end = (offset + self.fragment_size).min(self.pixels_per_line);
        let copy_len = end.saturating_sub(offset);
        self.red[offset..end].copy_from_slice(&packet.red[..copy_len]);
        self.green[offset..end].copy_from_slice(&packet.green[..copy_len]);
        self.blue[offset..end].copy_from_slice(&packet.blue[..copy_len]);
        self.received[fragment_id] = true;

        if self.received.iter().all(|&r| r) {
            let line = ImageLine {
                line_id: packet.line_id,
                red: self.red.clone(),
                green: self.green.clone(),
                blue: self.blue.clone(),
            };
            self.current_line_id = None;
            self.received.iter_mut().for_each(|r| *r = false);
            Some(line)
        } else {
            None
        }
    }

    fn reset_for(&mut self, line_id: u32) {
        self.current_line_id = Some(line_id);
        self.received.iter_mut().for_each(|r| *r = false);
    }
}

/// Error surfaced by a malformed datagram, kept separate from
/// `LineReassembler::accept`'s silent-drop policy so callers that want to
/// log rejected packets can do so.
pub fn inspect(datagram: &[u8]) -> Result<(), PacketError> {
    FragmentPacket::parse(datagram).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::encode;

    fn fragment(line_id: u32, fragment_id: u32, total: u32, fragment_size: usize, fill: u8) -> Vec<u8> {
        let channel = vec![fill; fragment_size];
        encode(0, line_id, fragment_id, total, &channel, &channel, &channel)
    }

    #[test]
    fn completes_a_line_once_all_fragments_arrive() {
        let mut reassembler = LineReassembler::new(8, 4, 2);
        assert!(reassembler.accept(&fragment(1, 0, 4, 2, 10)).is_none());
        assert!(reassembler.accept(&fragment(1, 1, 4, 2, 20)).is_none());
        assert!(reassembler.accept(&fragment(1, 2, 4, 2, 30)).is_none());
        let line = reassembler.accept(&fragment(1, 3, 4, 2, 40)).unwrap();

        assert_eq!(line.line_id, 1);
        assert_eq!(line.red, vec![10, 10, 20, 20, 30, 30, 40, 40]);
    }

    #[test]
    fn accepts_out_of_order_fragments() {
        let mut reassembler = LineReassembler::new(8, 4, 2);
        assert!(reassembler.accept(&fragment(1, 3, 4, 2, 4)).is_none());
        assert!(reassembler.accept(&fragment(1, 0, 4, 2, 1)).is_none());
        assert!(reassembler.accept(&fragment(1, 1, 4, 2, 2)).is_none());
        let line = reassembler.accept(&fragment(1, 2, 4, 2, 3)).unwrap();
        assert_eq!(line.red, vec![1, 1, 2, 2, 3, 3, 4, 4]);
    }

    #[test]
    fn duplicate_fragment_is_dropped_not_overwritten() {
        let mut reassembler = LineReassembler::new(8, 4, 2);
        reassembler.accept(&fragment(1, 0, 4, 2, 10));
        reassembler.accept(&fragment(1, 0, 4, 2, 99)); // duplicate, ignored
        reassembler.accept(&fragment(1, 1, 4, 2, 20));
        reassembler.accept(&fragment(1, 2, 4, 2, 30));
        let line = reassembler.accept(&fragment(1, 3, 4, 2, 40)).unwrap();
        assert_eq!(line.red[0], 10);
    }

    #[test]
    fn newer_line_id_abandons_incomplete_line() {
        let mut reassembler = LineReassembler::new(8, 4, 2);
        reassembler.accept(&fragment(1, 0, 4, 2, 1));
        reassembler.accept(&fragment(1, 1, 4, 2, 2));
        // line 1 never completes; line 2 starts fresh
        assert!(reassembler.accept(&fragment(2, 0, 4, 2, 9)).is_none());
        reassembler.accept(&fragment(2, 1, 4, 2, 9));
        reassembler.accept(&fragment(2, 2, 4, 2, 9));
        let line = reassembler.accept(&fragment(2, 3, 4, 2, 9)).unwrap();
        assert_eq!(line.line_id, 2);
        assert!(line.red.iter().all(|&b| b == 9));
    }

    #[test]
    fn malformed_packet_is_silently_dropped() {
        let mut reassembler = LineReassembler::new(8, 4, 2);
        assert!(reassembler.accept(&[0u8; 2]).is_none());
    }
}
