use std::fmt;

/// Length of the fixed role identification tag.
pub const ROLE_TAG_LEN: usize = 6;

/// The role a TCP connection plays within a session.
///
/// Sent as a fixed literal by the connecting side as the very first bytes
/// on the wire; nothing else is transmitted until the tag is out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelRole {
    /// High-rate per-frame device data.
    Tracking,
    /// Low-rate request/response configuration traffic.
    Manager,
}

impl ChannelRole {
    /// The wire tag identifying this role.
    pub const fn tag(self) -> [u8; ROLE_TAG_LEN] {
        match self {
            ChannelRole::Tracking => *b"track\n",
            ChannelRole::Manager => *b"manag\n",
        }
    }

    /// Resolve a received tag back to a role.
    pub fn from_tag(tag: &[u8; ROLE_TAG_LEN]) -> Option<Self> {
        if *tag == ChannelRole::Tracking.tag() {
            Some(ChannelRole::Tracking)
        } else if *tag == ChannelRole::Manager.tag() {
            Some(ChannelRole::Manager)
        } else {
            None
        }
    }
}

impl fmt::Display for ChannelRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelRole::Tracking => f.write_str("tracking"),
            ChannelRole::Manager => f.write_str("manager"),
        }
    }
}
