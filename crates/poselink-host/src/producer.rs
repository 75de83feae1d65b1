use std::io::ErrorKind;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use poselink_catalog::Catalog;
use poselink_frame::{FrameError, FrameReader, FrameWriter, TERMINATOR_LEN};
use poselink_proto::{
    ControlMessage, Status, TrackingSignal, SIGNAL_PAYLOAD_SIZE, STATUS_PAYLOAD_SIZE,
};
use poselink_transport::{PairListener, PoseStream};
use tracing::{debug, info};

use crate::error::{HostError, Result};

/// Default wait for a status response to a control request.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Read timeout used by non-blocking signal polls.
const SIGNAL_POLL_TIMEOUT: Duration = Duration::from_millis(1);

/// The producer endpoint: listens for a host's channel pair.
pub struct ProducerListener {
    inner: PairListener,
}

impl ProducerListener {
    /// Bind the producer's listening socket.
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        Ok(Self {
            inner: PairListener::bind(addr)?,
        })
    }

    /// The bound address (useful when binding port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.inner.local_addr()
    }

    /// Accept one host session: both channels, routed by role tag.
    pub fn accept_link(&self) -> Result<ProducerLink> {
        let pair = self.inner.accept_pair()?;
        info!("host connected on both channels");
        ProducerLink::from_pair(pair.tracking, pair.manager)
    }
}

/// One connected host session, seen from the producer side.
///
/// Tracking frames go out fire-and-forget; control requests are strictly
/// serial — one request, then a blocking wait for its status response,
/// bounded by the response timeout. There is no pipelining and no request
/// identifier on the wire, so issuing the next request before the previous
/// response arrived would misattribute responses; `&mut self` on
/// `request` makes that impossible.
pub struct ProducerLink {
    tracking_tx: FrameWriter<PoseStream>,
    tracking_rx: FrameReader<PoseStream>,
    manager_tx: FrameWriter<PoseStream>,
    manager_rx: FrameReader<PoseStream>,
    response_timeout: Duration,
}

impl ProducerLink {
    fn from_pair(tracking: PoseStream, manager: PoseStream) -> Result<Self> {
        let tracking_rx = FrameReader::for_stream(
            tracking.try_clone()?,
            SIGNAL_PAYLOAD_SIZE + TERMINATOR_LEN,
            Some(SIGNAL_POLL_TIMEOUT),
        )?;
        let manager_rx = FrameReader::for_stream(
            manager.try_clone()?,
            STATUS_PAYLOAD_SIZE + TERMINATOR_LEN,
            Some(DEFAULT_RESPONSE_TIMEOUT),
        )?;

        Ok(Self {
            tracking_tx: FrameWriter::new(tracking),
            tracking_rx,
            manager_tx: FrameWriter::new(manager),
            manager_rx,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
        })
    }

    /// Change the control-response timeout.
    pub fn set_response_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.manager_rx
            .get_ref()
            .set_read_timeout(Some(timeout))?;
        self.response_timeout = timeout;
        Ok(())
    }

    /// Send one tracking frame carrying the given device payload bytes.
    pub fn send_frame(&mut self, payload: &[u8]) -> Result<()> {
        self.tracking_tx.send(payload)?;
        Ok(())
    }

    /// Send a control request and block for its status response.
    pub fn request(&mut self, msg: &ControlMessage) -> Result<Status> {
        self.manager_tx.send(&msg.encode())?;
        let deadline = Instant::now() + self.response_timeout;

        loop {
            match self.manager_rx.read_frame() {
                Ok(frame) => match Status::decode(frame.payload()) {
                    Ok(status) => {
                        debug!(%status, "control request answered");
                        return Ok(status);
                    }
                    Err(err) => {
                        debug!(error = %err, "ignoring non-status frame while awaiting response");
                    }
                },
                Err(FrameError::Io(err)) if is_timeout(&err) => {}
                Err(FrameError::ConnectionClosed) => {
                    return Err(HostError::Disconnected(
                        "manager channel closed while awaiting response".to_string(),
                    ));
                }
                Err(err) => return Err(err.into()),
            }

            if Instant::now() >= deadline {
                return Err(HostError::Timeout(self.response_timeout));
            }
        }
    }

    /// Replace the host's device catalogue.
    pub fn replace_catalog(&mut self, catalog: &Catalog) -> Result<Status> {
        self.request(&ControlMessage::ReplaceCatalog(catalog.kinds().to_vec()))
    }

    pub fn set_ipd(&mut self, meters: f32) -> Result<Status> {
        self.request(&ControlMessage::SetIpd(meters))
    }

    pub fn set_pose_time_offset(&mut self, seconds: f32) -> Result<Status> {
        self.request(&ControlMessage::SetPoseTimeOffset(seconds))
    }

    pub fn set_eye_gap(&mut self, pixels: i32) -> Result<Status> {
        self.request(&ControlMessage::SetEyeGap(pixels))
    }

    pub fn set_self_pose(&mut self, position: [f32; 3]) -> Result<Status> {
        self.request(&ControlMessage::SetSelfPose(position))
    }

    /// Check the tracking channel for a host signal without blocking long.
    ///
    /// Returns `Ok(None)` when nothing (or nothing intelligible) arrived
    /// within the poll window.
    pub fn poll_signal(&mut self) -> Result<Option<TrackingSignal>> {
        match self.tracking_rx.read_frame() {
            Ok(frame) => match TrackingSignal::decode(frame.payload()) {
                Ok(signal) => Ok(Some(signal)),
                Err(err) => {
                    debug!(error = %err, "ignoring unintelligible tracking signal");
                    Ok(None)
                }
            },
            Err(FrameError::Io(err)) if is_timeout(&err) => Ok(None),
            Err(FrameError::ConnectionClosed) => Err(HostError::Disconnected(
                "tracking channel closed".to_string(),
            )),
            Err(err) => Err(err.into()),
        }
    }

    /// Block until a host signal arrives or the deadline passes.
    pub fn wait_signal(&mut self, timeout: Duration) -> Result<Option<TrackingSignal>> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(signal) = self.poll_signal()? {
                return Ok(Some(signal));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
        }
    }
}

fn is_timeout(err: &std::io::Error) -> bool {
    matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
}

#[cfg(test)]
mod tests {
    use std::thread;

    use poselink_transport::{connect_channel, ChannelRole};

    use super::*;

    #[test]
    fn request_times_out_against_a_silent_host() {
        let listener = ProducerListener::bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr();

        let client = thread::spawn(move || {
            let t = connect_channel(addr, ChannelRole::Tracking).unwrap();
            let m = connect_channel(addr, ChannelRole::Manager).unwrap();
            // Hold the sockets open but never answer.
            thread::sleep(Duration::from_millis(600));
            drop((t, m));
        });

        let mut link = listener.accept_link().unwrap();
        link.set_response_timeout(Duration::from_millis(150)).unwrap();

        let started = Instant::now();
        let err = link.request(&ControlMessage::SetIpd(0.06)).unwrap_err();
        assert!(matches!(err, HostError::Timeout(_)));
        assert!(started.elapsed() < Duration::from_millis(500));

        client.join().unwrap();
    }

    #[test]
    fn poll_signal_is_quiet_when_nothing_arrived() {
        let listener = ProducerListener::bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr();

        let client = thread::spawn(move || {
            let t = connect_channel(addr, ChannelRole::Tracking).unwrap();
            let m = connect_channel(addr, ChannelRole::Manager).unwrap();
            thread::sleep(Duration::from_millis(200));
            drop((t, m));
        });

        let mut link = listener.accept_link().unwrap();
        assert!(link.poll_signal().unwrap().is_none());
        client.join().unwrap();
    }
}
