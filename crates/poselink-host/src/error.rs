/// Errors that can occur in host and producer endpoint operations.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] poselink_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] poselink_frame::FrameError),

    /// Catalogue error.
    #[error("catalog error: {0}")]
    Catalog(#[from] poselink_catalog::CatalogError),

    /// Protocol codec error.
    #[error("protocol error: {0}")]
    Proto(#[from] poselink_proto::ProtoError),

    /// The peer disconnected.
    #[error("peer disconnected: {0}")]
    Disconnected(String),

    /// A control request got no response in time.
    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The configured address could not be parsed.
    #[error("bad address: {0}")]
    Addr(#[from] std::net::AddrParseError),

    /// Configuration JSON error.
    #[error("config error: {0}")]
    Json(#[from] serde_json::Error),

    /// An I/O error outside the framing layer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HostError>;
