use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use crate::connection::CommandStream;

/// Scripted client connection.
///
/// The first chunk is buffered immediately. Each later chunk lands when the
/// reader waits for more data. Once the script runs dry the stream stalls,
/// which lets tests drive the socket timeout.
#[derive(Debug, Clone, Default)]
pub struct ScriptedStream {
    buffered: VecDeque<u8>,
    pending: VecDeque<Vec<u8>>,
    consumed: usize,
}

impl ScriptedStream {
    pub fn new(bytes: &[u8]) -> Self {
        Self {
            buffered: bytes.iter().copied().collect(),
            pending: VecDeque::new(),
            consumed: 0,
        }
    }

    /// Queue a chunk that arrives on the next wait.
    pub fn then(mut self, bytes: &[u8]) -> Self {
        self.pending.push_back(bytes.to_vec());
        self
    }

    /// Bytes read so far.
    #[inline]
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Bytes buffered but not read.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buffered.len()
    }
}

impl CommandStream for ScriptedStream {
    fn available(&mut self) -> io::Result<usize> {
        Ok(self.buffered.len())
    }

    fn wait_readable(&mut self, timeout: Duration) -> io::Result<()> {
        match self.pending.pop_front() {
            Some(chunk) => self.buffered.extend(chunk),
            None => std::thread::sleep(timeout.min(Duration::from_millis(1))),
        }
        Ok(())
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        let len = buf.len();
        if self.buffered.len() < len {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }
        for (dst, src) in buf.iter_mut().zip(self.buffered.drain(..len)) {
            *dst = src;
        }
        self.consumed += len;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_chunks_arrive_on_wait() {
        let mut stream = ScriptedStream::new(&[1, 2]).then(&[3]);
        assert_eq!(stream.available().unwrap(), 2);

        stream.wait_readable(Duration::from_millis(1)).unwrap();

        assert_eq!(stream.available().unwrap(), 3);
    }

    #[test]
    fn read_consumes_in_order() {
        let mut stream = ScriptedStream::new(&[1, 2, 3]);
        let mut buf = [0u8; 2];

        stream.read_exact(&mut buf).unwrap();

        assert_eq!(buf, [1, 2]);
        assert_eq!(stream.consumed(), 2);
        assert_eq!(stream.remaining(), 1);
    }

    #[test]
    fn short_read_fails() {
        let mut stream = ScriptedStream::new(&[1]);
        let mut buf = [0u8; 2];
        assert!(stream.read_exact(&mut buf).is_err());
    }
}
