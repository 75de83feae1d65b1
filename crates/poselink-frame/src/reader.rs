use std::io::{ErrorKind, Read};

use bytes::BytesMut;
use tracing::debug;

use crate::codec::{decode_frame, Frame};
use crate::error::{FrameError, Result};

const MIN_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Headroom multiplier over the expected frame size. The producer may burst
/// several frames between reads; buffering well past one frame keeps the
/// receive loop from thrashing.
const SIZE_HEADROOM: usize = 10;

/// Reads complete terminator-delimited frames from any `Read` stream.
///
/// Handles partial reads internally — callers always get complete frames.
/// The expected frame size is advisory: it sizes the buffer and bounds how
/// far the scan will run without a terminator. Changing it (a catalogue
/// change) discards any partially-buffered frame, because bytes buffered
/// for the old shape would misalign every frame after the resize.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    scan_from: usize,
    expected_frame: usize,
}

impl<T: Read> FrameReader<T> {
    /// Create a frame reader with no particular expected frame size.
    pub fn new(inner: T) -> Self {
        Self::with_expected_frame_size(inner, 0)
    }

    /// Create a frame reader sized for frames of `frame_size` bytes.
    pub fn with_expected_frame_size(inner: T, frame_size: usize) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(buffer_capacity(frame_size)),
            scan_from: 0,
            expected_frame: frame_size,
        }
    }

    /// Read the next complete frame (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached.
    pub fn read_frame(&mut self) -> Result<Frame> {
        let max_buffered = self.max_buffered();
        loop {
            if let Some(frame) = decode_frame(&mut self.buf, &mut self.scan_from, max_buffered)? {
                return Ok(frame);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Switch to a new expected frame size.
    ///
    /// Discards all buffered bytes and zeroes the scan cursor: a partial
    /// frame of the old shape must never leak into the new one.
    pub fn set_expected_frame_size(&mut self, frame_size: usize) {
        if !self.buf.is_empty() {
            debug!(
                discarded = self.buf.len(),
                "frame size changed, dropping partial buffer"
            );
        }
        self.buf.clear();
        self.scan_from = 0;
        self.expected_frame = frame_size;
        let want = buffer_capacity(frame_size);
        if self.buf.capacity() < want {
            self.buf.reserve(want - self.buf.capacity());
        }
    }

    /// Currently expected frame size (payload + terminator), 0 if unset.
    pub fn expected_frame_size(&self) -> usize {
        self.expected_frame
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    fn max_buffered(&self) -> usize {
        buffer_capacity(self.expected_frame)
    }
}

impl FrameReader<poselink_transport::PoseStream> {
    /// Create a frame reader for a channel stream with a read timeout.
    ///
    /// A timed-out read surfaces as `FrameError::Io` with kind
    /// `WouldBlock`/`TimedOut`; callers polling rather than blocking
    /// forever should treat those kinds as "no frame yet".
    pub fn for_stream(
        inner: poselink_transport::PoseStream,
        frame_size: usize,
        read_timeout: Option<std::time::Duration>,
    ) -> Result<Self> {
        inner
            .set_read_timeout(read_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_expected_frame_size(inner, frame_size))
    }
}

pub(crate) fn transport_to_frame_error(
    err: poselink_transport::TransportError,
) -> FrameError {
    match err {
        poselink_transport::TransportError::Io(io)
        | poselink_transport::TransportError::Accept(io) => FrameError::Io(io),
        poselink_transport::TransportError::Bind { source, .. }
        | poselink_transport::TransportError::Connect { source, .. } => FrameError::Io(source),
        other => FrameError::Io(std::io::Error::other(other.to_string())),
    }
}

fn buffer_capacity(frame_size: usize) -> usize {
    (frame_size * SIZE_HEADROOM).max(MIN_BUFFER_CAPACITY)
}
