//! Wire codec for the manager protocol and tracking-channel signals.
//!
//! Control messages travel producer → host on the manager channel as a
//! fixed 524-byte payload: a u32 type tag followed by a 520-byte data
//! region whose layout the tag selects. The host answers every well-formed
//! request with a 4-byte status code. On the tracking channel the host can
//! push two unsolicited signals back at the producer: the bad-frame notice
//! (carrying the currently expected frame size and catalogue generation)
//! and the shutdown notice.
//!
//! All layouts here are decoded by tag into typed variants; raw regions are
//! never reinterpreted in place.

pub mod control;
pub mod error;
pub mod signal;
pub mod status;

pub use control::{ControlMessage, CONTROL_DATA_SIZE, CONTROL_PAYLOAD_SIZE, MAX_CATALOG_ENTRIES};
pub use error::{ProtoError, Result};
pub use signal::{TrackingSignal, SIGNAL_PAYLOAD_SIZE};
pub use status::{Status, STATUS_PAYLOAD_SIZE};
