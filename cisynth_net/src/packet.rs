//! UDP line-fragment packet format.
//!
//! Wire layout (little-endian, matching the source image sensor's native
//! order): `header_tag: u32`, `packet_id: u32`, `line_id: u32`,
//! `fragment_id: u32`, `total_fragments: u32`, `fragment_size: u32`,
//! followed by `fragment_size` bytes each of R, G, B in that order.

const HEADER_LEN: usize = 6 * 4;

/// Tag identifying an image-data fragment. Any other value is ignored.
pub const IMAGE_DATA: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PacketError {
    #[error("packet too short: {len} bytes, need at least {min} for the header")]
    TooShortForHeader { len: usize, min: usize },
    #[error("unrecognized header tag {tag}")]
    UnrecognizedTag { tag: u32 },
    #[error("packet too short for declared fragment_size {fragment_size}: {len} bytes, need {needed}")]
    TooShortForPayload { len: usize, needed: usize, fragment_size: u32 },
}

/// A parsed line fragment, borrowing its pixel payload from the original
/// datagram buffer.
#[derive(Debug, PartialEq)]
pub struct FragmentPacket<'a> {
    pub packet_id: u32,
    pub line_id: u32,
    pub fragment_id: u32,
    pub total_fragments: u32,
    pub fragment_size: u32,
    pub red: &'a [u8],
    pub green: &'a [u8],
    pub blue: &'a [u8],
}

impl<'a> FragmentPacket<'a> {
    pub fn parse(data: &'a [u8]) -> Result<Self, PacketError> {
        if data.len() < HEADER_LEN {
            return Err(PacketError::TooShortForHeader { len: data.len(), min: HEADER_LEN });
        }

        let tag = read_u32(data, 0);
        if tag != IMAGE_DATA {
            return Err(PacketError::UnrecognizedTag { tag });
        }

        let packet_id = read_u32(data, 4);
        let line_id = read_u32(data, 8);
        let fragment_id = read_u32(data, 12);
        let total_fragments = read_u32(data, 16);
        let fragment_size = read_u32(data, 20);

        let payload_len = fragment_size as usize * 3;
        let needed = HEADER_LEN + payload_len;
        if data.len() < needed {
            return Err(PacketError::TooShortForPayload { len: data.len(), needed, fragment_size });
        }

        let red = &data[HEADER_LEN..HEADER_LEN + fragment_size as usize];
        let green = &data[HEADER_LEN + fragment_size as usize..HEADER_LEN + 2 * fragment_size as usize];
        let blue = &data[HEADER_LEN + 2 * fragment_size as usize..needed];

        Ok(Self {
            packet_id,
            line_id,
            fragment_id,
            total_fragments,
            fragment_size,
            red,
            green,
            blue,
        })
    }
}

#[inline]
fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(data[offset..offset + 4].try_into().unwrap())
}

/// Encode a fragment packet, used by tests and by any loopback tooling.
pub fn encode(packet_id: u32, line_id: u32, fragment_id: u32, total_fragments: u32, red: &[u8], green: &[u8], blue: &[u8]) -> Vec<u8> {
    let fragment_size = red.len() as u32;
    let mut buf = Vec::with_capacity(HEADER_LEN + red.len() + green.len() + blue.len());
    buf.extend_from_slice(&IMAGE_DATA.to_le_bytes());
    buf.extend_from_slice(&packet_id.to_le_bytes());
    buf.extend_from_slice(&line_id.to_le_bytes());
    buf.extend_from_slice(&fragment_id.to_le_bytes());
    buf.extend_from_slice(&total_fragments.to_le_bytes());
    buf.extend_from_slice(&fragment_size.to_le_bytes());
    buf.extend_from_slice(red);
    buf.extend_from_slice(green);
    buf.extend_from_slice(blue);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_well_formed_fragment() {
        let red = vec![1u8; 8];
        let green = vec![2u8; 8];
        let blue = vec![3u8; 8];
        let bytes = encode(5, 10, 2, 4, &red, &green, &blue);

        let packet = FragmentPacket::parse(&bytes).unwrap();
        assert_eq!(packet.packet_id, 5);
        assert_eq!(packet.line_id, 10);
        assert_eq!(packet.fragment_id, 2);
        assert_eq!(packet.total_fragments, 4);
        assert_eq!(packet.fragment_size, 8);
        assert_eq!(packet.red, &red[..]);
        assert_eq!(packet.green, &green[..]);
        assert_eq!(packet.blue, &blue[..]);
    }

    #[test]
    fn rejects_unrecognized_tag() {
        let mut bytes = encode(0, 0, 0, 1, &[0u8; 4], &[0u8; 4], &[0u8; 4]);
        bytes[0..4].copy_from_slice(&99u32.to_le_bytes());
        assert_eq!(FragmentPacket::parse(&bytes), Err(PacketError::UnrecognizedTag { tag: 99 }));
    }

    #[test]
    fn rejects_too_short_header() {
        assert!(matches!(FragmentPacket::parse(&[0u8; 4]), Err(PacketError::TooShortForHeader { .. })));
    }

    #[test]
    fn rejects_truncated_payload() {
        let mut bytes = encode(0, 0, 0, 1, &[0u8; 8], &[0u8; 8], &[0u8; 8]);
        bytes.truncate(bytes.len() - 1);
        assert!(matches!(FragmentPacket::parse(&bytes), Err(PacketError::TooShortForPayload { .. })));
    }
}
