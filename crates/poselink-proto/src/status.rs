use std::fmt;

use crate::error::{ProtoError, Result};

/// Fixed payload size of a status response.
pub const STATUS_PAYLOAD_SIZE: usize = 4;

/// Manager-channel acknowledgement, host → producer.
///
/// Sent strictly in reply to a control message, one per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Request rejected as unrecognizable.
    Invalid,
    /// Unsolicited informational notice.
    Notification,
    /// Request applied.
    Ok,
    /// Request applied, but takes effect after a host restart.
    OkRestartRequired,
    /// Request understood but could not be applied.
    Failed,
    /// Request arrived at a moment the host could not process it.
    FailedToProcess,
}

impl Status {
    /// The wire code for this status.
    pub const fn code(self) -> u32 {
        match self {
            Status::Invalid => 0,
            Status::Notification => 100,
            Status::Ok => 200,
            Status::OkRestartRequired => 201,
            Status::Failed => 400,
            Status::FailedToProcess => 401,
        }
    }

    /// Resolve a wire code to a status.
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Status::Invalid),
            100 => Some(Status::Notification),
            200 => Some(Status::Ok),
            201 => Some(Status::OkRestartRequired),
            400 => Some(Status::Failed),
            401 => Some(Status::FailedToProcess),
            _ => None,
        }
    }

    /// Encode into the fixed status payload.
    pub fn encode(self) -> [u8; STATUS_PAYLOAD_SIZE] {
        self.code().to_le_bytes()
    }

    /// Decode a status payload (the frame payload, terminator stripped).
    pub fn decode(payload: &[u8]) -> Result<Self> {
        if payload.len() != STATUS_PAYLOAD_SIZE {
            return Err(ProtoError::WrongSize {
                len: payload.len(),
                expected: STATUS_PAYLOAD_SIZE,
            });
        }
        let code = u32::from_le_bytes(payload.try_into().unwrap());
        Status::from_code(code).ok_or(ProtoError::UnknownStatus(code))
    }

    /// Whether the request was applied.
    pub fn is_ok(self) -> bool {
        matches!(self, Status::Ok | Status::OkRestartRequired)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Invalid => "invalid",
            Status::Notification => "notification",
            Status::Ok => "ok",
            Status::OkRestartRequired => "ok-restart-required",
            Status::Failed => "failed",
            Status::FailedToProcess => "failed-to-process",
        };
        write!(f, "{name} ({})", self.code())
    }
}
