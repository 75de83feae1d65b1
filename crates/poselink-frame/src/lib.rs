//! Terminator-delimited message framing for poselink channels.
//!
//! Messages carry no length prefix; both ends agree on payload sizes out of
//! band (the manager channel negotiates them) and every message ends with a
//! fixed 3-byte terminator. The receiver accumulates stream bytes and cuts
//! frames at the terminator; the payload size is validated by the layer
//! above, not by the framing.
//!
//! A payload that itself contains the terminator sequence will split early
//! and desynchronize the peer until the next real frame boundary. The wire
//! format offers no escape hatch for this; producers of binary payloads
//! must tolerate the transient bad-frame rejections it causes.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{decode_frame, encode_frame, Frame, TERMINATOR, TERMINATOR_LEN};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;
