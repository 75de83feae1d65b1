use std::io::Read;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

use poselink_frame::{Frame, FrameError, FrameReader};
use tracing::{debug, warn};

/// Cross-thread request to change a receiver's expected frame size.
///
/// The receiver owns its buffer exclusively; the sync path only signals.
/// The request is applied between reads, before any further scanning, and
/// discards bytes buffered for the old shape.
#[derive(Clone, Default)]
pub struct ResizeHandle {
    pending: Arc<Mutex<Option<usize>>>,
}

impl ResizeHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a switch to the given expected frame size.
    pub fn request(&self, frame_size: usize) {
        *self.lock() = Some(frame_size);
    }

    /// Whether a resize is waiting to be applied.
    pub fn is_pending(&self) -> bool {
        self.lock().is_some()
    }

    fn take(&self) -> Option<usize> {
        self.lock().take()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<usize>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Spawn a channel receiver loop on a dedicated thread.
///
/// Emits every complete frame to `on_frame`; the first receive failure
/// (including peer shutdown) calls `on_close` and exits the loop. Errors
/// are not retried here — reconnect policy belongs to the owner.
pub(crate) fn spawn_channel_receiver<T: Read + Send + 'static>(
    name: &'static str,
    mut reader: FrameReader<T>,
    resize: ResizeHandle,
    mut on_frame: impl FnMut(Frame) + Send + 'static,
    on_close: impl FnOnce(FrameError) + Send + 'static,
) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name(format!("poselink-{name}"))
        .spawn(move || {
            loop {
                if let Some(frame_size) = resize.take() {
                    debug!(channel = name, frame_size, "applying receiver resize");
                    reader.set_expected_frame_size(frame_size);
                }

                match reader.read_frame() {
                    Ok(frame) => {
                        // A resize that landed while this frame was being
                        // buffered means the frame has the old shape.
                        if resize.is_pending() {
                            debug!(channel = name, "discarding frame read across a resize");
                            continue;
                        }
                        on_frame(frame);
                    }
                    Err(err) => {
                        warn!(channel = name, error = %err, "receiver loop exiting");
                        on_close(err);
                        break;
                    }
                }
            }
        })
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::net::{TcpListener, TcpStream};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::time::Duration;

    use poselink_frame::FrameWriter;

    use super::*;

    fn tcp_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = std::thread::spawn(move || TcpStream::connect(addr).unwrap());
        let (server, _) = listener.accept().unwrap();
        (server, client.join().unwrap())
    }

    #[test]
    fn emits_frames_and_reports_close() {
        let (server, client) = tcp_pair();

        let frames = Arc::new(AtomicUsize::new(0));
        let (closed_tx, closed_rx) = mpsc::channel();

        let handle = spawn_channel_receiver(
            "test",
            FrameReader::new(server),
            ResizeHandle::new(),
            {
                let frames = Arc::clone(&frames);
                move |_frame| {
                    frames.fetch_add(1, Ordering::SeqCst);
                }
            },
            move |err| {
                let _ = closed_tx.send(err);
            },
        )
        .unwrap();

        let mut writer = FrameWriter::new(client);
        writer.send(b"one").unwrap();
        writer.send(b"two").unwrap();
        drop(writer);

        let err = closed_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(err, FrameError::ConnectionClosed));
        handle.join().unwrap();
        assert_eq!(frames.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn resize_applies_before_the_next_frame() {
        let (server, mut client) = tcp_pair();

        let payloads = Arc::new(Mutex::new(Vec::<Vec<u8>>::new()));
        let (closed_tx, closed_rx) = mpsc::channel::<FrameError>();

        // The resize is pending before the loop starts; it is applied ahead
        // of the first read, so the following frame is delivered against
        // the new shape.
        let resize = ResizeHandle::new();
        resize.request(8);
        let handle = spawn_channel_receiver(
            "test",
            FrameReader::new(server),
            resize.clone(),
            {
                let payloads = Arc::clone(&payloads);
                move |frame: Frame| {
                    payloads.lock().unwrap().push(frame.payload().to_vec());
                }
            },
            move |err| {
                let _ = closed_tx.send(err);
            },
        )
        .unwrap();
        std::thread::sleep(Duration::from_millis(50));

        client.write_all(b"keep\x09\x0d\x0a").unwrap();
        client.flush().unwrap();
        std::thread::sleep(Duration::from_millis(100));
        drop(client);

        let _ = closed_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        handle.join().unwrap();
        assert_eq!(payloads.lock().unwrap().as_slice(), &[b"keep".to_vec()]);
    }

    #[test]
    fn frame_completed_across_a_pending_resize_is_dropped() {
        let (server, mut client) = tcp_pair();

        let payloads = Arc::new(Mutex::new(Vec::<Vec<u8>>::new()));
        let (closed_tx, closed_rx) = mpsc::channel::<FrameError>();

        let resize = ResizeHandle::new();
        let handle = spawn_channel_receiver(
            "test",
            FrameReader::new(server),
            resize.clone(),
            {
                let payloads = Arc::clone(&payloads);
                move |frame: Frame| {
                    payloads.lock().unwrap().push(frame.payload().to_vec());
                }
            },
            move |err| {
                let _ = closed_tx.send(err);
            },
        )
        .unwrap();

        // Park the receiver in a blocking read, then request the resize
        // while the old-shape frame is still in flight.
        std::thread::sleep(Duration::from_millis(50));
        resize.request(8);
        client.write_all(b"stale\x09\x0d\x0a").unwrap();
        client.flush().unwrap();
        std::thread::sleep(Duration::from_millis(100));

        // The next frame arrives after the resize was applied and survives.
        client.write_all(b"fresh\x09\x0d\x0a").unwrap();
        client.flush().unwrap();
        std::thread::sleep(Duration::from_millis(100));
        drop(client);

        let _ = closed_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        handle.join().unwrap();
        assert_eq!(payloads.lock().unwrap().as_slice(), &[b"fresh".to_vec()]);
    }

    #[test]
    fn resize_handle_roundtrip() {
        let handle = ResizeHandle::new();
        assert!(!handle.is_pending());
        handle.request(55);
        assert!(handle.is_pending());
        assert_eq!(handle.take(), Some(55));
        assert!(!handle.is_pending());
        assert_eq!(handle.take(), None);
    }
}
