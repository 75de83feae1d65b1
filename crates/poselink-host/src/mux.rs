use poselink_catalog::Catalog;
use poselink_frame::Frame;

use crate::events::DeviceHost;

/// A frame whose length contradicts the active catalogue.
///
/// Expected steady-state traffic right after a catalogue change — the
/// producer keeps sending old-shape frames until it sees the bad-frame
/// signal built from this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeMismatch {
    pub got: usize,
    pub expected_size: usize,
    pub generation: u64,
}

/// Deliver one tracking frame to its devices, in catalogue order.
///
/// The frame length is checked against the catalogue once, up front; on a
/// match each device receives exactly its fixed-size slice and the offset
/// advances past it. The wire format is positional — there are no
/// per-record tags — so a mismatched length means none of the slices can
/// be trusted and nothing is delivered.
pub fn dispatch(
    frame: &Frame,
    catalog: &Catalog,
    sink: &mut dyn DeviceHost,
) -> Result<usize, ShapeMismatch> {
    if frame.wire_len() != catalog.frame_size() {
        return Err(ShapeMismatch {
            got: frame.wire_len(),
            expected_size: catalog.frame_size(),
            generation: catalog.generation(),
        });
    }

    let payload = frame.payload();
    let mut offset = 0usize;
    for serial in catalog.serials() {
        let size = serial.kind.payload_size();
        sink.pose_update(serial, &payload[offset..offset + size]);
        offset += size;
    }

    Ok(catalog.len())
}
