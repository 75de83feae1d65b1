use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Frame terminator: `\t\r\n`.
pub const TERMINATOR: [u8; 3] = [0x09, 0x0D, 0x0A];

/// Length of the frame terminator.
pub const TERMINATOR_LEN: usize = TERMINATOR.len();

/// One complete message as cut from the stream: payload plus terminator.
#[derive(Debug, Clone)]
pub struct Frame {
    bytes: Bytes,
}

impl Frame {
    /// Build a frame from a payload (appends the terminator).
    pub fn from_payload(payload: &[u8]) -> Self {
        let mut bytes = BytesMut::with_capacity(payload.len() + TERMINATOR_LEN);
        bytes.put_slice(payload);
        bytes.put_slice(&TERMINATOR);
        Self {
            bytes: bytes.freeze(),
        }
    }

    pub(crate) fn from_wire(bytes: Bytes) -> Self {
        debug_assert!(bytes.len() >= TERMINATOR_LEN);
        debug_assert_eq!(&bytes[bytes.len() - TERMINATOR_LEN..], TERMINATOR);
        Self { bytes }
    }

    /// The payload, terminator excluded.
    pub fn payload(&self) -> &[u8] {
        &self.bytes[..self.bytes.len() - TERMINATOR_LEN]
    }

    /// The full on-wire bytes, terminator included.
    pub fn wire(&self) -> &[u8] {
        &self.bytes
    }

    /// Total wire size of this frame (payload + terminator).
    pub fn wire_len(&self) -> usize {
        self.bytes.len()
    }
}

/// Encode a payload into the wire format: `payload || terminator`.
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) {
    dst.reserve(payload.len() + TERMINATOR_LEN);
    dst.put_slice(payload);
    dst.put_slice(&TERMINATOR);
}

/// Cut the next complete frame out of `src`.
///
/// `scan_from` is the caller-held scan cursor: positions before it have
/// already been checked for the terminator. On a hit the frame bytes are
/// consumed from `src` and the cursor resets; on a miss the cursor advances
/// so re-scanning is cheap. Returns `Ok(None)` when no complete frame is
/// buffered yet.
pub fn decode_frame(
    src: &mut BytesMut,
    scan_from: &mut usize,
    max_frame: usize,
) -> Result<Option<Frame>> {
    if src.len() >= TERMINATOR_LEN {
        let start = (*scan_from).min(src.len() - TERMINATOR_LEN + 1);
        if let Some(at) = find_terminator(&src[..], start) {
            let frame = src.split_to(at + TERMINATOR_LEN).freeze();
            *scan_from = 0;
            return Ok(Some(Frame::from_wire(frame)));
        }
    }

    // Keep the last two bytes scannable; they may be a terminator prefix.
    *scan_from = src.len().saturating_sub(TERMINATOR_LEN - 1);

    if src.len() > max_frame {
        return Err(FrameError::FrameTooLong {
            len: src.len(),
            max: max_frame,
        });
    }

    Ok(None)
}

fn find_terminator(haystack: &[u8], start: usize) -> Option<usize> {
    if haystack.len() < TERMINATOR_LEN {
        return None;
    }
    (start..=haystack.len() - TERMINATOR_LEN)
        .find(|&i| haystack[i..i + TERMINATOR_LEN] == TERMINATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_LIMIT: usize = usize::MAX;

    #[test]
    fn encode_decode_roundtrip() {
        let mut buf = BytesMut::new();
        let payload = b"pose bytes";
        encode_frame(payload, &mut buf);
        assert_eq!(buf.len(), payload.len() + TERMINATOR_LEN);

        let mut cursor = 0;
        let frame = decode_frame(&mut buf, &mut cursor, NO_LIMIT)
            .unwrap()
            .unwrap();
        assert_eq!(frame.payload(), payload);
        assert_eq!(frame.wire_len(), payload.len() + TERMINATOR_LEN);
        assert!(buf.is_empty());
    }

    #[test]
    fn incomplete_frame_returns_none() {
        let mut buf = BytesMut::from(&b"partial"[..]);
        let mut cursor = 0;
        let result = decode_frame(&mut buf, &mut cursor, NO_LIMIT).unwrap();
        assert!(result.is_none());
        // All but the possible terminator prefix was scanned.
        assert_eq!(cursor, buf.len() - 2);
    }

    #[test]
    fn multiple_frames_decode_in_order() {
        let mut buf = BytesMut::new();
        encode_frame(b"first", &mut buf);
        encode_frame(b"second", &mut buf);

        let mut cursor = 0;
        let f1 = decode_frame(&mut buf, &mut cursor, NO_LIMIT)
            .unwrap()
            .unwrap();
        let f2 = decode_frame(&mut buf, &mut cursor, NO_LIMIT)
            .unwrap()
            .unwrap();
        assert_eq!(f1.payload(), b"first");
        assert_eq!(f2.payload(), b"second");
        assert!(buf.is_empty());
    }

    #[test]
    fn empty_payload_is_a_valid_frame() {
        let mut buf = BytesMut::new();
        encode_frame(b"", &mut buf);

        let mut cursor = 0;
        let frame = decode_frame(&mut buf, &mut cursor, NO_LIMIT)
            .unwrap()
            .unwrap();
        assert!(frame.payload().is_empty());
        assert_eq!(frame.wire_len(), TERMINATOR_LEN);
    }

    #[test]
    fn terminator_split_across_decode_calls() {
        let mut buf = BytesMut::new();
        buf.extend_from_slice(b"data\x09\x0d");
        let mut cursor = 0;
        assert!(decode_frame(&mut buf, &mut cursor, NO_LIMIT)
            .unwrap()
            .is_none());

        buf.extend_from_slice(b"\x0a");
        let frame = decode_frame(&mut buf, &mut cursor, NO_LIMIT)
            .unwrap()
            .unwrap();
        assert_eq!(frame.payload(), b"data");
    }

    #[test]
    fn over_limit_without_terminator_errors() {
        let mut buf = BytesMut::from(&[0u8; 64][..]);
        let mut cursor = 0;
        let err = decode_frame(&mut buf, &mut cursor, 32).unwrap_err();
        assert!(matches!(err, FrameError::FrameTooLong { len: 64, max: 32 }));
    }

    #[test]
    fn from_payload_matches_wire_layout() {
        let frame = Frame::from_payload(b"abc");
        assert_eq!(frame.wire(), b"abc\x09\x0d\x0a");
    }

    #[test]
    fn embedded_terminator_splits_early() {
        // Known wire-format limitation: the scan cuts at the first match.
        let mut buf = BytesMut::new();
        buf.extend_from_slice(b"ab\x09\x0d\x0acd\x09\x0d\x0a");
        let mut cursor = 0;
        let f1 = decode_frame(&mut buf, &mut cursor, NO_LIMIT)
            .unwrap()
            .unwrap();
        assert_eq!(f1.payload(), b"ab");
        let f2 = decode_frame(&mut buf, &mut cursor, NO_LIMIT)
            .unwrap()
            .unwrap();
        assert_eq!(f2.payload(), b"cd");
    }
}
