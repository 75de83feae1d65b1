use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use tracing::warn;

use crate::codec::{encode_frame, Frame, TERMINATOR};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 4 * 1024;

/// Writes complete terminator-delimited frames to any `Write` stream.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Encode and send one payload as a complete frame (blocking).
    pub fn send(&mut self, payload: &[u8]) -> Result<()> {
        if contains_terminator(payload) {
            // The peer will cut this frame early; it recovers at the next
            // real boundary, but the frame itself is lost to rejection.
            warn!(
                len = payload.len(),
                "payload contains the frame terminator; peer will desync briefly"
            );
        }

        self.buf.clear();
        encode_frame(payload, &mut self.buf);

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()
    }

    /// Send an already-framed message.
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.send(frame.payload())
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl FrameWriter<poselink_transport::PoseStream> {
    /// Create a frame writer for a channel stream with a write timeout.
    pub fn for_stream(
        inner: poselink_transport::PoseStream,
        write_timeout: Option<std::time::Duration>,
    ) -> Result<Self> {
        inner
            .set_write_timeout(write_timeout)
            .map_err(crate::reader::transport_to_frame_error)?;
        Ok(Self::new(inner))
    }
}

fn contains_terminator(payload: &[u8]) -> bool {
    payload.windows(TERMINATOR.len()).any(|w| w == TERMINATOR)
}
