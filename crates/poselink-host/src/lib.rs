//! Host and producer runtimes for the poselink protocol.
//!
//! The host (consumer) side connects a tracking channel and a manager
//! channel to a pose producer, multiplexes incoming frames onto the device
//! catalogue, and keeps that catalogue renegotiable at runtime without
//! misrouting a single frame. The producer side is the listening end:
//! it streams tracking frames and drives catalogue/parameter changes over
//! the manager channel.
//!
//! Protocol logic is entirely callback-driven: two receiver threads and a
//! periodic scheduler do the work, the embedding application only
//! implements [`DeviceHost`].

pub mod config;
pub mod error;
pub mod events;
pub mod host;
pub mod mux;
pub mod producer;
pub mod receiver;
pub mod registry;
pub mod scheduler;

pub use config::HostConfig;
pub use error::{HostError, Result};
pub use events::{DeviceHost, ParamChange};
pub use host::TrackingHost;
pub use mux::{dispatch, ShapeMismatch};
pub use producer::{ProducerLink, ProducerListener, DEFAULT_RESPONSE_TIMEOUT};
pub use receiver::ResizeHandle;
pub use registry::DeviceRegistry;
pub use scheduler::Scheduler;

// The layered crates this runtime is built from, re-exported for callers
// that only take one dependency.
pub use poselink_catalog::{Catalog, DeviceKind, DeviceSerial, SharedCatalog};
pub use poselink_proto::{ControlMessage, Status, TrackingSignal};
pub use poselink_transport::ChannelRole;
