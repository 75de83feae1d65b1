//! TCP transport for poselink channels.
//!
//! A poselink session uses two plain TCP connections to the same listener:
//! a high-rate tracking channel and a low-rate manager channel. Each
//! connection identifies its role with a fixed 6-byte tag immediately after
//! connecting, so the listening side can route the pair regardless of
//! accept order.

pub mod error;
pub mod role;
pub mod stream;
pub mod tcp;

pub use error::{Result, TransportError};
pub use role::{ChannelRole, ROLE_TAG_LEN};
pub use stream::PoseStream;
pub use tcp::{connect_channel, connect_channel_timeout, ChannelPair, PairListener};
