use std::io::{ErrorKind, Write};

use crate::codec::{encode_frame_with_config, Frame, FrameConfig};
use crate::error::{FrameError, Result};

/// Writes complete frames to any `Write` stream, such as a `.syx` file.
pub struct FrameWriter<T> {
    inner: T,
    config: FrameConfig,
    written: usize,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            config,
            written: 0,
        }
    }

    /// Write an already-built frame (blocking).
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.write_all(frame.as_bytes())?;
        self.written += 1;
        self.flush()
    }

    /// Encode and write a frame for a command id and payload.
    pub fn send(&mut self, command_id: u8, payload: &[u8]) -> Result<()> {
        let frame = encode_frame_with_config(command_id, payload, &self.config)?;
        self.write_frame(&frame)
    }

    /// Number of frames written so far.
    pub fn frames_written(&self) -> usize {
        self.written
    }

    fn write_all(&mut self, mut bytes: &[u8]) -> Result<()> {
        while !bytes.is_empty() {
            match self.inner.write(bytes) {
                Ok(0) => return Err(FrameError::Io(ErrorKind::WriteZero.into())),
                Ok(n) => bytes = &bytes[n..],
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        Ok(())
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

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::codec::{decode_frame, encode_frame};
    use crate::reader::FrameReader;

    #[test]
    fn write_single_frame() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.send(0x09, &[7]).unwrap();

        let bytes = writer.into_inner().into_inner();
        let frame = decode_frame(&bytes).unwrap();
        assert_eq!(frame.command_id(), 0x09);
        assert_eq!(frame.payload(), &[7]);
    }

    #[test]
    fn written_frames_read_back() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.send(0x50, &[]).unwrap();
        writer
            .write_frame(&encode_frame(0x31, &[0, 2, 50, 0]).unwrap())
            .unwrap();
        writer.send(0x51, &[]).unwrap();
        assert_eq!(writer.frames_written(), 3);

        let bytes = writer.into_inner().into_inner();
        let mut reader = FrameReader::new(Cursor::new(bytes));
        let ids: Vec<u8> = (0..3).map(|_| reader.read_frame().unwrap().command_id()).collect();
        assert_eq!(ids, vec![0x50, 0x31, 0x51]);
    }

    #[test]
    fn invalid_payload_writes_nothing() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        let err = writer.send(0x31, &[0xFF]).unwrap_err();
        assert!(matches!(err, FrameError::NonDataByte { .. }));
        assert_eq!(writer.frames_written(), 0);
        assert!(writer.into_inner().into_inner().is_empty());
    }

    #[test]
    fn write_zero_is_an_error() {
        let mut writer = FrameWriter::new(ZeroWriter);
        let err = writer.send(0x29, &[]).unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::WriteZero));
    }

    #[test]
    fn handles_interrupted_write() {
        let mut writer = FrameWriter::new(InterruptedOnce {
            interrupted: false,
            data: Vec::new(),
        });
        writer.send(0x29, &[]).unwrap();
        assert_eq!(writer.into_inner().data.len(), 6);
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct InterruptedOnce {
        interrupted: bool,
        data: Vec<u8>,
    }

    impl Write for InterruptedOnce {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
