use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::role::{ChannelRole, ROLE_TAG_LEN};
use crate::stream::PoseStream;

/// How long the listening side waits for a role tag after accepting.
const IDENTIFICATION_TIMEOUT: Duration = Duration::from_secs(5);

/// The two routed connections of one session.
#[derive(Debug)]
pub struct ChannelPair {
    pub tracking: PoseStream,
    pub manager: PoseStream,
}

/// Listens for the two channel connections of a session.
pub struct PairListener {
    listener: TcpListener,
    addr: SocketAddr,
}

impl PairListener {
    /// Bind and listen on a TCP address.
    ///
    /// Bind to port 0 to let the OS pick; `local_addr` reports the result.
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr).map_err(|e| TransportError::Bind {
            addr,
            source: e,
        })?;
        let addr = listener.local_addr()?;
        info!(%addr, "listening for channel pair");
        Ok(Self { listener, addr })
    }

    /// The bound address.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Accept both channel connections and route them by role tag.
    ///
    /// Blocks until two connections have identified themselves. Connect
    /// order does not matter; a duplicate or unknown tag fails the accept.
    pub fn accept_pair(&self) -> Result<ChannelPair> {
        let mut tracking: Option<PoseStream> = None;
        let mut manager: Option<PoseStream> = None;

        while tracking.is_none() || manager.is_none() {
            let (stream, peer) = self.listener.accept().map_err(TransportError::Accept)?;
            let (role, stream) = identify(stream)?;
            debug!(%peer, %role, "channel identified");

            let slot = match role {
                ChannelRole::Tracking => &mut tracking,
                ChannelRole::Manager => &mut manager,
            };
            if slot.is_some() {
                return Err(TransportError::DuplicateRole(role));
            }
            *slot = Some(stream);
        }

        match (tracking, manager) {
            (Some(tracking), Some(manager)) => Ok(ChannelPair { tracking, manager }),
            _ => Err(TransportError::ClosedDuringIdentification),
        }
    }
}

fn identify(stream: TcpStream) -> Result<(ChannelRole, PoseStream)> {
    stream.set_read_timeout(Some(IDENTIFICATION_TIMEOUT))?;

    let mut tag = [0u8; ROLE_TAG_LEN];
    let mut filled = 0;
    while filled < ROLE_TAG_LEN {
        let mut half = &stream;
        let n = half.read(&mut tag[filled..])?;
        if n == 0 {
            return Err(TransportError::ClosedDuringIdentification);
        }
        filled += n;
    }

    let role = ChannelRole::from_tag(&tag).ok_or(TransportError::UnknownTag(tag))?;

    stream.set_read_timeout(None)?;
    Ok((role, PoseStream::from_tcp(stream)?))
}

/// Connect one channel to a listening session and announce its role.
pub fn connect_channel(addr: SocketAddr, role: ChannelRole) -> Result<PoseStream> {
    let stream = TcpStream::connect(addr).map_err(|e| TransportError::Connect {
        addr,
        source: e,
    })?;
    announce(stream, addr, role)
}

/// Connect one channel with an explicit connect timeout.
pub fn connect_channel_timeout(
    addr: SocketAddr,
    role: ChannelRole,
    timeout: Duration,
) -> Result<PoseStream> {
    let stream =
        TcpStream::connect_timeout(&addr, timeout).map_err(|e| TransportError::Connect {
            addr,
            source: e,
        })?;
    announce(stream, addr, role)
}

fn announce(stream: TcpStream, addr: SocketAddr, role: ChannelRole) -> Result<PoseStream> {
    let mut stream = PoseStream::from_tcp(stream)?;
    stream.write_all(&role.tag())?;
    stream.flush()?;
    debug!(%addr, %role, "channel connected");
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::thread;

    use super::*;

    fn loopback() -> SocketAddr {
        "127.0.0.1:0".parse().expect("loopback addr should parse")
    }

    #[test]
    fn routes_pair_in_connect_order() {
        let listener = PairListener::bind(loopback()).unwrap();
        let addr = listener.local_addr();

        let client = thread::spawn(move || {
            let t = connect_channel(addr, ChannelRole::Tracking).unwrap();
            let m = connect_channel(addr, ChannelRole::Manager).unwrap();
            (t, m)
        });

        let pair = listener.accept_pair().unwrap();
        let (_t, _m) = client.join().unwrap();
        assert!(pair.tracking.peer_addr().is_ok());
        assert!(pair.manager.peer_addr().is_ok());
    }

    #[test]
    fn routes_pair_in_reverse_order() {
        let listener = PairListener::bind(loopback()).unwrap();
        let addr = listener.local_addr();

        let client = thread::spawn(move || {
            let m = connect_channel(addr, ChannelRole::Manager).unwrap();
            let t = connect_channel(addr, ChannelRole::Tracking).unwrap();
            (m, t)
        });

        let pair = listener.accept_pair().unwrap();
        let (_m, _t) = client.join().unwrap();
        assert!(pair.tracking.peer_addr().is_ok());
        assert!(pair.manager.peer_addr().is_ok());
    }

    #[test]
    fn unknown_tag_fails_accept() {
        let listener = PairListener::bind(loopback()).unwrap();
        let addr = listener.local_addr();

        let client = thread::spawn(move || {
            let mut raw = TcpStream::connect(addr).unwrap();
            raw.write_all(b"wrong!").unwrap();
            raw
        });

        let err = listener.accept_pair().unwrap_err();
        assert!(matches!(err, TransportError::UnknownTag(_)));
        let _ = client.join().unwrap();
    }

    #[test]
    fn duplicate_role_fails_accept() {
        let listener = PairListener::bind(loopback()).unwrap();
        let addr = listener.local_addr();

        let client = thread::spawn(move || {
            let a = connect_channel(addr, ChannelRole::Tracking).unwrap();
            let b = connect_channel(addr, ChannelRole::Tracking).unwrap();
            (a, b)
        });

        let err = listener.accept_pair().unwrap_err();
        assert!(matches!(
            err,
            TransportError::DuplicateRole(ChannelRole::Tracking)
        ));
        let _ = client.join().unwrap();
    }

    #[test]
    fn connect_timeout_variant_connects() {
        let listener = PairListener::bind(loopback()).unwrap();
        let addr = listener.local_addr();

        let client = thread::spawn(move || {
            connect_channel_timeout(addr, ChannelRole::Tracking, Duration::from_secs(2)).unwrap()
        });
        let (stream, _peer) = listener.listener.accept().unwrap();
        let (role, _stream) = identify(stream).unwrap();
        assert_eq!(role, ChannelRole::Tracking);
        let _ = client.join().unwrap();
    }
}
