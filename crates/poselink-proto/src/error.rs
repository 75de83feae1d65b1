/// Errors that can occur decoding protocol messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtoError {
    /// The payload length does not match the fixed message size.
    #[error("wrong message size: {len} bytes (expected {expected})")]
    WrongSize { len: usize, expected: usize },

    /// The type tag names no known control message.
    #[error("unknown control message type {0}")]
    UnknownType(u32),

    /// A catalogue entry carried an unknown device-kind code.
    #[error("unknown device kind code {0}")]
    UnknownKindCode(u32),

    /// A catalogue entry declared a record size that contradicts its kind.
    #[error("device kind '{kind}' declares {declared}-byte records (expected {expected})")]
    RecordSizeMismatch {
        kind: char,
        declared: u32,
        expected: u32,
    },

    /// A catalogue replace named more devices than the region can hold.
    #[error("too many catalogue entries: {count} (max {max})")]
    TooManyEntries { count: u32, max: usize },

    /// The status code names no known status.
    #[error("unknown status code {0}")]
    UnknownStatus(u32),

    /// The signal type names no known tracking-channel signal.
    #[error("unknown signal type {0}")]
    UnknownSignal(u32),
}

pub type Result<T> = std::result::Result<T, ProtoError>;
