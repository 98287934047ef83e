//! Byte stream abstraction and the deadline-bounded wait.
//!
//! Payloads are never read piecemeal: the dispatcher first waits until the
//! whole payload is buffered, then reads it in one go. If the bytes do not
//! show up within the socket timeout nothing is consumed.

use std::io::{self, Read};
use std::net::{SocketAddr, TcpStream};
use std::time::{Duration, Instant};

use crate::protocol::{CommandError, MAX_READ_LEN};

/// A connection the dispatcher can read one command from.
pub trait CommandStream {
    /// Bytes buffered and readable without blocking.
    fn available(&mut self) -> io::Result<usize>;

    /// Block until more data may be available, for at most `timeout`.
    ///
    /// Returning early is always allowed; callers re-check [`available`].
    ///
    /// [`available`]: CommandStream::available
    fn wait_readable(&mut self, timeout: Duration) -> io::Result<()>;

    /// Fill `buf` completely. Only called once [`available`] covers it.
    ///
    /// [`available`]: CommandStream::available
    fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()>;
}

/// Wait until at least `needed` bytes are buffered or `timeout` passes.
///
/// On timeout nothing has been read from the stream.
pub fn wait_for_bytes<C>(stream: &mut C, needed: usize, timeout: Duration) -> Result<(), CommandError>
where
    C: CommandStream + ?Sized,
{
    let started = Instant::now();
    let deadline = started + timeout;

    loop {
        let available = stream.available()?;
        if available >= needed {
            return Ok(());
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(CommandError::Timeout {
                needed,
                available,
                waited: now - started,
            });
        }

        stream.wait_readable(deadline - now)?;
    }
}

/// Wait for `buf.len()` bytes, then read them all.
pub fn read_payload<C>(stream: &mut C, buf: &mut [u8], timeout: Duration) -> Result<(), CommandError>
where
    C: CommandStream + ?Sized,
{
    wait_for_bytes(stream, buf.len(), timeout)?;
    stream.read_exact(buf)?;
    Ok(())
}

/// An accepted TCP client.
///
/// `available` peeks into a scratch buffer sized for the largest payload, so
/// it never reports more than [`MAX_READ_LEN`] bytes.
#[derive(Debug)]
pub struct TcpConnection {
    stream: TcpStream,
    peer: Option<SocketAddr>,
    scratch: Box<[u8; MAX_READ_LEN]>,
    poll_interval: Duration,
}

impl TcpConnection {
    /// Wrap an accepted stream. `poll_interval` is how long to back off while
    /// a partial payload is buffered.
    pub fn new(stream: TcpStream, poll_interval: Duration) -> io::Result<Self> {
        // Accepted sockets may inherit non-blocking mode from the listener
        stream.set_nonblocking(false)?;
        let peer = stream.peer_addr().ok();
        Ok(Self {
            stream,
            peer,
            scratch: Box::new([0; MAX_READ_LEN]),
            poll_interval,
        })
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }

    fn peek_nonblocking(&mut self) -> io::Result<usize> {
        self.stream.set_nonblocking(true)?;
        let peeked = self.stream.peek(&mut self.scratch[..]);
        self.stream.set_nonblocking(false)?;

        match peeked {
            Ok(0) => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "peer closed the connection",
            )),
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(0),
            Err(e) => Err(e),
        }
    }
}

impl CommandStream for TcpConnection {
    fn available(&mut self) -> io::Result<usize> {
        self.peek_nonblocking()
    }

    fn wait_readable(&mut self, timeout: Duration) -> io::Result<()> {
        if self.peek_nonblocking()? > 0 {
            // Partial payload buffered: a blocking peek would return at once
            std::thread::sleep(self.poll_interval.min(timeout));
            return Ok(());
        }

        // Nothing buffered: sleep in the kernel until the first byte arrives
        self.stream.set_read_timeout(Some(timeout))?;
        let mut probe = [0u8; 1];
        let result = match self.stream.peek(&mut probe) {
            Ok(_) => Ok(()),
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                Ok(())
            }
            Err(e) => Err(e),
        };
        self.stream.set_read_timeout(None)?;
        result
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        Read::read_exact(&mut self.stream, buf)
    }
}
