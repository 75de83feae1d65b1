use std::fmt;

use poselink_frame::TERMINATOR_LEN;

use crate::error::{CatalogError, Result};
use crate::kind::DeviceKind;

/// Stable identity of one device slot: kind plus per-kind index.
///
/// Indices are dense and zero-based per kind, counted in catalogue order,
/// so the second controller is always `c1` no matter what sits around it.
/// Serials are what survives a catalogue replacement: a device that keeps
/// its serial keeps its host-side handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceSerial {
    pub kind: DeviceKind,
    pub index: u32,
}

impl fmt::Display for DeviceSerial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.token(), self.index)
    }
}

/// The ordered device catalogue defining the current frame shape.
///
/// Immutable once built; replacement produces a successor with a bumped
/// generation. Holding an `Arc<Catalog>` therefore guarantees a consistent
/// (entries, expected-size, generation) triple — there is no way to observe
/// a torn update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<DeviceKind>,
    generation: u64,
}

impl Catalog {
    /// Build a first-generation catalogue from an ordered kind list.
    pub fn new(entries: Vec<DeviceKind>) -> Self {
        Self {
            entries,
            generation: 0,
        }
    }

    /// An empty first-generation catalogue.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Parse a catalogue string such as `"h c c t"` or `"hcct"`.
    ///
    /// Whitespace and commas separate tokens; anything else that is not a
    /// device token is an error.
    pub fn parse(s: &str) -> Result<Self> {
        let mut entries = Vec::new();
        for ch in s.chars() {
            if ch.is_whitespace() || ch == ',' {
                continue;
            }
            let kind = DeviceKind::from_token(ch).ok_or(CatalogError::UnknownToken(ch))?;
            entries.push(kind);
        }
        Ok(Self::new(entries))
    }

    /// Produce the successor catalogue with a new kind list.
    pub fn advance(&self, entries: Vec<DeviceKind>) -> Self {
        Self {
            entries,
            generation: self.generation + 1,
        }
    }

    /// The ordered kind list.
    pub fn kinds(&self) -> &[DeviceKind] {
        &self.entries
    }

    /// Number of devices in the catalogue.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Monotonic replacement counter, starting at 0.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Total device payload bytes per frame (terminator excluded).
    pub fn payload_size(&self) -> usize {
        self.entries.iter().map(|k| k.payload_size()).sum()
    }

    /// Total expected wire size per frame (terminator included).
    pub fn frame_size(&self) -> usize {
        self.payload_size() + TERMINATOR_LEN
    }

    /// Serials in catalogue order, indices dense per kind.
    pub fn serials(&self) -> Vec<DeviceSerial> {
        let mut counts = [0u32; DeviceKind::ALL.len()];
        self.entries
            .iter()
            .map(|&kind| {
                let slot = kind.code() as usize;
                let serial = DeviceSerial {
                    kind,
                    index: counts[slot],
                };
                counts[slot] += 1;
                serial
            })
            .collect()
    }
}

impl fmt::Display for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, kind) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{kind}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_separated_and_packed_tokens() {
        let spaced = Catalog::parse("h c c t").unwrap();
        let packed = Catalog::parse("hcct").unwrap();
        assert_eq!(spaced.kinds(), packed.kinds());
        assert_eq!(
            spaced.kinds(),
            &[
                DeviceKind::Headset,
                DeviceKind::Controller,
                DeviceKind::Controller,
                DeviceKind::Tracker,
            ]
        );
    }

    #[test]
    fn parse_rejects_unknown_tokens() {
        let err = Catalog::parse("h x c").unwrap_err();
        assert!(matches!(err, CatalogError::UnknownToken('x')));
    }

    #[test]
    fn parse_empty_yields_empty_catalog() {
        let cat = Catalog::parse("").unwrap();
        assert!(cat.is_empty());
        assert_eq!(cat.frame_size(), TERMINATOR_LEN);
    }

    #[test]
    fn frame_size_sums_records_plus_terminator() {
        let cat = Catalog::parse("h c c t").unwrap();
        assert_eq!(cat.payload_size(), 52 + 88 + 88 + 52);
        assert_eq!(cat.frame_size(), 52 + 88 + 88 + 52 + 3);
    }

    #[test]
    fn serials_are_dense_per_kind_in_order() {
        let cat = Catalog::parse("h c c t g c").unwrap();
        let serials: Vec<String> = cat.serials().iter().map(|s| s.to_string()).collect();
        assert_eq!(serials, ["h0", "c0", "c1", "t0", "g0", "c2"]);
    }

    #[test]
    fn advance_bumps_generation_only() {
        let cat = Catalog::parse("h").unwrap();
        assert_eq!(cat.generation(), 0);
        let next = cat.advance(vec![DeviceKind::Headset, DeviceKind::Controller]);
        assert_eq!(next.generation(), 1);
        assert_eq!(next.len(), 2);
        let again = next.advance(Vec::new());
        assert_eq!(again.generation(), 2);
        assert!(again.is_empty());
    }
}
