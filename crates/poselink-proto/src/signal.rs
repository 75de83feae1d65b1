use crate::error::{ProtoError, Result};

/// Size of the type-selected data region in a tracking-channel signal.
const SIGNAL_DATA_SIZE: usize = 64;

/// Fixed payload size of every tracking-channel signal.
pub const SIGNAL_PAYLOAD_SIZE: usize = 4 + SIGNAL_DATA_SIZE;

const TYPE_BAD_FRAME: u32 = 10;
const TYPE_SHUTDOWN: u32 = 20;

/// Unsolicited host → producer message on the tracking channel.
///
/// These are the only bytes the host ever sends on the tracking channel.
/// `BadFrame` is flow control, not an error: right after a catalogue change
/// the producer is expected to keep sending stale-shaped frames until this
/// tells it the new size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingSignal {
    /// The last frame's length did not match the current catalogue.
    BadFrame {
        /// Expected wire size, terminator included.
        expected_size: u32,
        /// Generation of the catalogue the size was computed from.
        generation: u64,
    },
    /// The host is closing the channel; stop sending and exit.
    Shutdown,
}

impl TrackingSignal {
    /// Encode into the fixed signal payload; unused data bytes are zero.
    pub fn encode(&self) -> [u8; SIGNAL_PAYLOAD_SIZE] {
        let mut out = [0u8; SIGNAL_PAYLOAD_SIZE];
        match self {
            TrackingSignal::BadFrame {
                expected_size,
                generation,
            } => {
                out[0..4].copy_from_slice(&TYPE_BAD_FRAME.to_le_bytes());
                out[4..8].copy_from_slice(&expected_size.to_le_bytes());
                out[8..16].copy_from_slice(&generation.to_le_bytes());
            }
            TrackingSignal::Shutdown => {
                out[0..4].copy_from_slice(&TYPE_SHUTDOWN.to_le_bytes());
            }
        }
        out
    }

    /// Decode a signal payload (the frame payload, terminator stripped).
    pub fn decode(payload: &[u8]) -> Result<Self> {
        if payload.len() != SIGNAL_PAYLOAD_SIZE {
            return Err(ProtoError::WrongSize {
                len: payload.len(),
                expected: SIGNAL_PAYLOAD_SIZE,
            });
        }

        let type_code = u32::from_le_bytes(payload[0..4].try_into().unwrap());
        match type_code {
            TYPE_BAD_FRAME => Ok(TrackingSignal::BadFrame {
                expected_size: u32::from_le_bytes(payload[4..8].try_into().unwrap()),
                generation: u64::from_le_bytes(payload[8..16].try_into().unwrap()),
            }),
            TYPE_SHUTDOWN => Ok(TrackingSignal::Shutdown),
            other => Err(ProtoError::UnknownSignal(other)),
        }
    }
}
