use std::net::SocketAddr;

/// Errors that can occur in channel transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to bind the listening socket.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// Failed to connect to the listening side.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// Failed to accept an incoming connection.
    #[error("failed to accept connection: {0}")]
    Accept(std::io::Error),

    /// An I/O error occurred on the channel stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connecting side sent a tag that names no known role.
    #[error("unknown role tag {0:02x?}")]
    UnknownTag([u8; crate::role::ROLE_TAG_LEN]),

    /// Two connections claimed the same role.
    #[error("duplicate connection for role {0}")]
    DuplicateRole(crate::role::ChannelRole),

    /// The connection closed before a complete role tag arrived.
    #[error("connection closed during role identification")]
    ClosedDuringIdentification,
}

pub type Result<T> = std::result::Result<T, TransportError>;
