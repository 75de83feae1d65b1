use std::fmt;

/// A logical device kind carried inside tracking frames.
///
/// Each kind maps to an exact per-frame record size; the sizes are wire
/// constants and must match the producer byte for byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    /// Head-mounted display: pose only.
    Headset,
    /// Hand controller: pose plus input axes/buttons.
    Controller,
    /// Generic tracked puck: pose only.
    Tracker,
    /// Eye-tracking state.
    GazeMaster,
}

impl DeviceKind {
    /// All kinds, in wire-code order.
    pub const ALL: [DeviceKind; 4] = [
        DeviceKind::Headset,
        DeviceKind::Controller,
        DeviceKind::Tracker,
        DeviceKind::GazeMaster,
    ];

    /// The single-character catalogue token for this kind.
    pub const fn token(self) -> char {
        match self {
            DeviceKind::Headset => 'h',
            DeviceKind::Controller => 'c',
            DeviceKind::Tracker => 't',
            DeviceKind::GazeMaster => 'g',
        }
    }

    /// Resolve a catalogue token to a kind.
    pub fn from_token(token: char) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.token() == token)
    }

    /// The u32 code used in catalogue-replace control messages.
    pub const fn code(self) -> u32 {
        match self {
            DeviceKind::Headset => 0,
            DeviceKind::Controller => 1,
            DeviceKind::Tracker => 2,
            DeviceKind::GazeMaster => 3,
        }
    }

    /// Resolve a wire code to a kind.
    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.code() == code)
    }

    /// Size in bytes of this kind's per-frame record.
    ///
    /// Headset/Tracker: position 3f, orientation 4f, velocity 3f, angular
    /// velocity 3f. Controller adds 9 input floats. GazeMaster: status u32,
    /// age f32, two gaze vec2s, two gaze quats.
    pub const fn payload_size(self) -> usize {
        match self {
            DeviceKind::Headset => 52,
            DeviceKind::Controller => 88,
            DeviceKind::Tracker => 52,
            DeviceKind::GazeMaster => 56,
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_roundtrip() {
        for kind in DeviceKind::ALL {
            assert_eq!(DeviceKind::from_token(kind.token()), Some(kind));
        }
        assert_eq!(DeviceKind::from_token('x'), None);
    }

    #[test]
    fn codes_roundtrip() {
        for kind in DeviceKind::ALL {
            assert_eq!(DeviceKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(DeviceKind::from_code(4), None);
    }

    #[test]
    fn record_sizes_are_pinned() {
        assert_eq!(DeviceKind::Headset.payload_size(), 52);
        assert_eq!(DeviceKind::Controller.payload_size(), 88);
        assert_eq!(DeviceKind::Tracker.payload_size(), 52);
        assert_eq!(DeviceKind::GazeMaster.payload_size(), 56);
    }
}
