use std::io::{ErrorKind, Read};

use bytes::{Buf, Bytes, BytesMut};
use tracing::debug;

use crate::codec::{decode_frame_with_config, Frame, FrameConfig, SYSEX_END, SYSEX_START};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 4 * 1024;
const READ_CHUNK_SIZE: usize = 4 * 1024;

/// Reads complete SysEx messages from any `Read` stream, such as a `.syx`
/// dump file.
///
/// Handles partial reads internally. Bytes outside an `F0 .. F7` span are
/// skipped, so files holding several dumps back to back (or stray running
/// status bytes) read cleanly.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
    eof: bool,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
            eof: false,
        }
    }

    /// Read the next raw `F0 .. F7` message without decoding it (blocking).
    ///
    /// Returns `Err(FrameError::EndOfStream)` once the stream is exhausted.
    /// A message cut off by EOF is reported as `Truncated`.
    pub fn read_message(&mut self) -> Result<Bytes> {
        loop {
            if let Some(message) = self.take_buffered()? {
                return Ok(message);
            }

            if self.eof {
                if self.buf.is_empty() {
                    return Err(FrameError::EndOfStream);
                }
                let len = self.buf.len();
                self.buf.clear();
                return Err(FrameError::Truncated { len });
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                self.eof = true;
                continue;
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Read and decode the next vendor frame (blocking).
    pub fn read_frame(&mut self) -> Result<Frame> {
        let message = self.read_message()?;
        decode_frame_with_config(&message, &self.config)
    }

    /// Cut the next complete message out of the buffer, if there is one.
    fn take_buffered(&mut self) -> Result<Option<Bytes>> {
        // Discard everything before the next start byte.
        match self.buf.iter().position(|&b| b == SYSEX_START) {
            Some(0) => {}
            Some(skip) => {
                debug!(skip, "skipping bytes outside sysex");
                self.buf.advance(skip);
            }
            None => {
                if !self.buf.is_empty() {
                    debug!(skip = self.buf.len(), "skipping bytes outside sysex");
                    self.buf.clear();
                }
                return Ok(None);
            }
        }

        let Some(end) = self.buf.iter().position(|&b| b == SYSEX_END) else {
            let limit = self.config.max_payload_size + crate::codec::FRAME_OVERHEAD;
            if self.buf.len() > limit {
                let size = self.buf.len();
                self.buf.clear();
                return Err(FrameError::PayloadTooLarge { size, max: limit });
            }
            return Ok(None);
        };

        Ok(Some(self.buf.split_to(end + 1).freeze()))
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl<T: Read> Iterator for FrameReader<T> {
    type Item = Result<Bytes>;

    /// Yields raw messages until the stream ends.
    fn next(&mut self) -> Option<Self::Item> {
        match self.read_message() {
            Err(FrameError::EndOfStream) => None,
            other => Some(other),
        }
    }
}
