/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The first byte is not the SysEx start byte `0xF0`.
    #[error("bad start byte {found:#04x} (expected 0xf0)")]
    BadStart { found: u8 },

    /// The manufacturer/device header does not match the configured device.
    #[error("bad vendor header {found:02x?} (expected {expected:02x?})")]
    BadVendor { expected: [u8; 3], found: [u8; 3] },

    /// The message ends before a complete frame was seen.
    #[error("truncated frame ({len} bytes)")]
    Truncated { len: usize },

    /// A terminator exists but the message does not end with it.
    #[error("bad end byte {found:#04x} (expected 0xf7)")]
    BadEnd { found: u8 },

    /// A command or payload byte has its high bit set.
    #[error("non-data byte {byte:#04x} at offset {offset}")]
    NonDataByte { offset: usize, byte: u8 },

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended before another complete message was received.
    #[error("end of stream")]
    EndOfStream,
}

pub type Result<T> = std::result::Result<T, FrameError>;
