//! Minimal tracking host — connects to a running pose producer and logs
//! everything the protocol delivers.
//!
//! Run the pose-producer example first, then:
//!   cargo run --example tracking-host

use std::time::Duration;

use poselink_host::{
    ChannelRole, DeviceHost, DeviceSerial, HostConfig, ParamChange, TrackingHost,
};
use tracing::info;

struct LoggingHost;

impl DeviceHost for LoggingHost {
    fn device_added(&mut self, serial: DeviceSerial) {
        info!(%serial, "device added");
    }

    fn device_parked(&mut self, serial: DeviceSerial) {
        info!(%serial, "device parked");
    }

    fn device_resumed(&mut self, serial: DeviceSerial) {
        info!(%serial, "device resumed");
    }

    fn pose_update(&mut self, serial: DeviceSerial, payload: &[u8]) {
        // Position is the first three floats of every pose record.
        let x = f32::from_le_bytes(payload[0..4].try_into().unwrap());
        let y = f32::from_le_bytes(payload[4..8].try_into().unwrap());
        let z = f32::from_le_bytes(payload[8..12].try_into().unwrap());
        info!(%serial, x, y, z, "pose");
    }

    fn parameter_changed(&mut self, change: ParamChange) {
        info!(?change, "parameter changed");
    }

    fn channel_lost(&mut self, role: ChannelRole, reason: &str) {
        info!(%role, reason, "channel lost");
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = HostConfig {
        address: "127.0.0.1:6969".to_string(),
        ..HostConfig::default()
    };

    let mut host = TrackingHost::connect(&config, Box::new(LoggingHost))?;
    eprintln!("connected; running for 30 seconds");

    std::thread::sleep(Duration::from_secs(30));

    host.shutdown();
    Ok(())
}
