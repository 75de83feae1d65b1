//! Minimal pose producer — listens for a host, negotiates a catalogue of
//! one headset and two controllers, then streams synthetic poses.
//!
//! Run with:
//!   cargo run --example pose-producer
//!
//! In another terminal:
//!   cargo run --example tracking-host

use std::time::Duration;

use poselink_host::{Catalog, ProducerListener, TrackingSignal};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let listener = ProducerListener::bind("127.0.0.1:6969".parse()?)?;
    eprintln!("listening on {}", listener.local_addr());

    let mut link = listener.accept_link()?;
    eprintln!("host connected");

    let catalog = Catalog::parse("h c c")?;
    let status = link.replace_catalog(&catalog)?;
    eprintln!("catalogue [{catalog}] -> {status}");

    let mut frame = vec![0u8; catalog.payload_size()];
    let mut tick = 0u64;

    loop {
        // Headset bobs on a sine wave; controllers hold identity poses.
        let t = tick as f32 / 60.0;
        write_pose(&mut frame[0..52], [0.0, (t).sin() * 0.1, 0.0]);
        write_pose(&mut frame[52..104], [-0.2, 0.0, -0.5]);
        write_pose(&mut frame[140..192], [0.2, 0.0, -0.5]);

        link.send_frame(&frame)?;
        tick += 1;

        match link.poll_signal()? {
            Some(TrackingSignal::BadFrame {
                expected_size,
                generation,
            }) => {
                eprintln!("host expects {expected_size}-byte frames (generation {generation})");
            }
            Some(TrackingSignal::Shutdown) => {
                eprintln!("host is shutting down, exiting");
                return Ok(());
            }
            None => {}
        }

        std::thread::sleep(Duration::from_millis(16));
    }
}

/// Fill one pose record: position, identity orientation, zero velocities.
fn write_pose(record: &mut [u8], position: [f32; 3]) {
    let mut values = [0.0f32; 13];
    values[0..3].copy_from_slice(&position);
    values[3] = 1.0; // quaternion w
    for (i, v) in values.iter().enumerate() {
        record[i * 4..i * 4 + 4].copy_from_slice(&v.to_le_bytes());
    }
}
