use poselink_catalog::DeviceSerial;
use poselink_transport::ChannelRole;

/// A parameter update received on the manager channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamChange {
    /// Interpupillary distance, meters.
    Ipd(f32),
    /// Seconds added to every delivered pose timestamp.
    PoseTimeOffset(f32),
    /// Lens distortion coefficients and zoom factors.
    Distortion {
        k1: f32,
        k2: f32,
        zoom_width: f32,
        zoom_height: f32,
    },
    /// Horizontal eye gap offset, pixels.
    EyeGap(i32),
    /// Position of the settings-manager reference device.
    SelfPose([f32; 3]),
}

/// The host-side device-management collaborator.
///
/// Everything the transport layer learns flows out through this trait; the
/// implementation owns the actual device objects, settings store and event
/// plumbing. Callbacks arrive from the receiver and scheduler threads, one
/// at a time, never concurrently.
pub trait DeviceHost: Send {
    /// A serial appears in the catalogue for the first time.
    fn device_added(&mut self, serial: DeviceSerial);

    /// A serial left the catalogue; its handle is retained for reuse.
    fn device_parked(&mut self, serial: DeviceSerial);

    /// A previously parked serial reappeared in the catalogue.
    fn device_resumed(&mut self, serial: DeviceSerial);

    /// One device's slice of a tracking frame, in catalogue order.
    fn pose_update(&mut self, serial: DeviceSerial, payload: &[u8]);

    /// A parameter-set request was applied.
    fn parameter_changed(&mut self, change: ParamChange);

    /// Slow-cadence per-device upkeep (battery, update polling).
    fn maintenance(&mut self, _serial: DeviceSerial) {}

    /// Slow-cadence host-level heartbeat.
    fn heartbeat(&mut self) {}

    /// A channel's receiver loop exited. The other channel is unaffected.
    fn channel_lost(&mut self, _role: ChannelRole, _reason: &str) {}
}
