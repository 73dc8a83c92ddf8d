use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// SysEx start byte.
pub const SYSEX_START: u8 = 0xF0;

/// SysEx terminator.
pub const SYSEX_END: u8 = 0xF7;

/// Zoom manufacturer id.
pub const ZOOM_VENDOR_ID: u8 = 0x52;

/// Device id of the G1X Four / G1 Four.
pub const G1X_FOUR_DEVICE_ID: u8 = 0x64;

/// Start (1) + header (3) + command id (1) = 5 bytes.
pub const HEADER_SIZE: usize = 5;

/// Header plus terminator: the size of a frame with an empty payload.
pub const FRAME_OVERHEAD: usize = HEADER_SIZE + 1;

/// Default maximum payload size in bytes.
pub const DEFAULT_MAX_PAYLOAD: usize = 1024;

const DATA_MASK: u8 = 0x80;

/// A complete, validated SysEx frame.
///
/// The wire bytes are owned and never modified after construction; accessors
/// return views into them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    wire: Bytes,
}

impl Frame {
    /// The 3-byte manufacturer/device header.
    pub fn header(&self) -> [u8; 3] {
        [self.wire[1], self.wire[2], self.wire[3]]
    }

    /// The device id carried in the header.
    pub fn device_id(&self) -> u8 {
        self.wire[3]
    }

    /// The command id (byte 4).
    pub fn command_id(&self) -> u8 {
        self.wire[4]
    }

    /// The bytes between the command id and the terminator.
    pub fn payload(&self) -> &[u8] {
        &self.wire[HEADER_SIZE..self.wire.len() - 1]
    }

    /// The complete wire representation, `F0 .. F7` inclusive.
    pub fn as_bytes(&self) -> &[u8] {
        &self.wire
    }

    /// Consume the frame and return its wire bytes.
    pub fn into_bytes(self) -> Bytes {
        self.wire
    }

    /// The total wire size of this frame (overhead + payload).
    pub fn wire_size(&self) -> usize {
        self.wire.len()
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// Configuration for the frame codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Device id placed in (and expected in) byte 3. Default: G1X Four.
    pub device_id: u8,
    /// Maximum payload size in bytes. Default: 1024.
    pub max_payload_size: usize,
}

impl FrameConfig {
    /// The 3-byte header this configuration writes and accepts.
    pub fn header(&self) -> [u8; 3] {
        [ZOOM_VENDOR_ID, 0x00, self.device_id]
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            device_id: G1X_FOUR_DEVICE_ID,
            max_payload_size: DEFAULT_MAX_PAYLOAD,
        }
    }
}

/// Encode a frame for the G1X Four using the default configuration.
///
/// Wire format:
/// ```text
/// ┌──────┬──────┬──────┬────────┬─────────┬──────────────┬──────┐
/// │ 0xF0 │ 0x52 │ 0x00 │ device │ command │ payload ...  │ 0xF7 │
/// └──────┴──────┴──────┴────────┴─────────┴──────────────┴──────┘
/// ```
pub fn encode_frame(command_id: u8, payload: &[u8]) -> Result<Frame> {
    encode_frame_with_config(command_id, payload, &FrameConfig::default())
}

/// Encode a frame with explicit configuration.
pub fn encode_frame_with_config(
    command_id: u8,
    payload: &[u8],
    config: &FrameConfig,
) -> Result<Frame> {
    if payload.len() > config.max_payload_size {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: config.max_payload_size,
        });
    }
    if command_id & DATA_MASK != 0 {
        return Err(FrameError::NonDataByte {
            offset: HEADER_SIZE - 1,
            byte: command_id,
        });
    }
    if let Some(pos) = payload.iter().position(|b| b & DATA_MASK != 0) {
        return Err(FrameError::NonDataByte {
            offset: HEADER_SIZE + pos,
            byte: payload[pos],
        });
    }

    let mut dst = BytesMut::with_capacity(FRAME_OVERHEAD + payload.len());
    dst.put_u8(SYSEX_START);
    dst.put_slice(&config.header());
    dst.put_u8(command_id);
    dst.put_slice(payload);
    dst.put_u8(SYSEX_END);

    Ok(Frame { wire: dst.freeze() })
}

/// Decode one complete message using the default configuration.
pub fn decode_frame(bytes: &[u8]) -> Result<Frame> {
    decode_frame_with_config(bytes, &FrameConfig::default())
}

/// Decode one complete message with explicit configuration.
///
/// `bytes` must hold exactly one message, as delivered by a message-oriented
/// channel. Checks run in a fixed order so the first structural problem is
/// the one reported.
pub fn decode_frame_with_config(bytes: &[u8], config: &FrameConfig) -> Result<Frame> {
    let Some(&first) = bytes.first() else {
        return Err(FrameError::Truncated { len: 0 });
    };
    if first != SYSEX_START {
        return Err(FrameError::BadStart { found: first });
    }
    if bytes.len() < 4 {
        return Err(FrameError::Truncated { len: bytes.len() });
    }

    let expected = config.header();
    let found = [bytes[1], bytes[2], bytes[3]];
    if found != expected {
        return Err(FrameError::BadVendor { expected, found });
    }

    if !bytes.contains(&SYSEX_END) {
        return Err(FrameError::Truncated { len: bytes.len() });
    }
    let last = bytes[bytes.len() - 1];
    if last != SYSEX_END {
        return Err(FrameError::BadEnd { found: last });
    }
    if bytes.len() < FRAME_OVERHEAD {
        return Err(FrameError::Truncated { len: bytes.len() });
    }

    let body = &bytes[HEADER_SIZE - 1..bytes.len() - 1];
    if let Some(pos) = body.iter().position(|b| b & DATA_MASK != 0) {
        return Err(FrameError::NonDataByte {
            offset: HEADER_SIZE - 1 + pos,
            byte: body[pos],
        });
    }

    let payload_len = bytes.len() - FRAME_OVERHEAD;
    if payload_len > config.max_payload_size {
        return Err(FrameError::PayloadTooLarge {
            size: payload_len,
            max: config.max_payload_size,
        });
    }

    Ok(Frame {
        wire: Bytes::copy_from_slice(bytes),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_roundtrip() {
        let frame = encode_frame(0x09, &[12]).unwrap();
        assert_eq!(frame.as_bytes(), &[0xF0, 0x52, 0x00, 0x64, 0x09, 12, 0xF7]);

        let decoded = decode_frame(frame.as_bytes()).unwrap();
        assert_eq!(decoded.command_id(), 0x09);
        assert_eq!(decoded.payload(), &[12]);
        assert_eq!(decoded, frame);
    }

    #[test]
    fn test_decode_request_current_patch() {
        let frame = decode_frame(&[0xF0, 0x52, 0x00, 0x64, 0x29, 0xF7]).unwrap();
        assert_eq!(frame.command_id(), 0x29);
        assert!(frame.payload().is_empty());
        assert_eq!(frame.header(), [0x52, 0x00, 0x64]);
        assert_eq!(frame.wire_size(), FRAME_OVERHEAD);
    }

    #[test]
    fn test_decode_bad_start() {
        let err = decode_frame(&[0x00, 0x52, 0x00, 0x64, 0x29, 0xF7]).unwrap_err();
        assert!(matches!(err, FrameError::BadStart { found: 0x00 }));
    }

    #[test]
    fn test_decode_empty_is_truncated() {
        assert!(matches!(
            decode_frame(&[]),
            Err(FrameError::Truncated { len: 0 })
        ));
    }

    #[test]
    fn test_decode_bad_vendor() {
        // Roland manufacturer id
        let err = decode_frame(&[0xF0, 0x41, 0x00, 0x64, 0x29, 0xF7]).unwrap_err();
        assert!(matches!(
            err,
            FrameError::BadVendor {
                found: [0x41, 0x00, 0x64],
                ..
            }
        ));

        // Right vendor, other device
        let err = decode_frame(&[0xF0, 0x52, 0x00, 0x58, 0x29, 0xF7]).unwrap_err();
        assert!(matches!(err, FrameError::BadVendor { .. }));
    }

    #[test]
    fn test_decode_missing_terminator() {
        let err = decode_frame(&[0xF0, 0x52, 0x00, 0x64, 0x28, 0x01, 0x02]).unwrap_err();
        assert!(matches!(err, FrameError::Truncated { len: 7 }));

        let err = decode_frame(&[0xF0, 0x52]).unwrap_err();
        assert!(matches!(err, FrameError::Truncated { len: 2 }));
    }

    #[test]
    fn test_decode_trailing_bytes_after_terminator() {
        let err = decode_frame(&[0xF0, 0x52, 0x00, 0x64, 0x29, 0xF7, 0x00]).unwrap_err();
        assert!(matches!(err, FrameError::BadEnd { found: 0x00 }));
    }

    #[test]
    fn test_decode_terminator_before_command() {
        let err = decode_frame(&[0xF0, 0x52, 0x00, 0x64, 0xF7]).unwrap_err();
        assert!(matches!(err, FrameError::Truncated { len: 5 }));
    }

    #[test]
    fn test_decode_embedded_status_byte() {
        let err = decode_frame(&[0xF0, 0x52, 0x00, 0x64, 0x28, 0x90, 0xF7]).unwrap_err();
        assert!(matches!(
            err,
            FrameError::NonDataByte {
                offset: 5,
                byte: 0x90
            }
        ));
    }

    #[test]
    fn test_decode_payload_too_large() {
        let config = FrameConfig {
            max_payload_size: 2,
            ..FrameConfig::default()
        };
        let wire = [0xF0, 0x52, 0x00, 0x64, 0x28, 1, 2, 3, 0xF7];
        let err = decode_frame_with_config(&wire, &config).unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { size: 3, max: 2 }));
    }

    #[test]
    fn test_encode_rejects_non_data_bytes() {
        let err = encode_frame(0x31, &[0x00, 0x80]).unwrap_err();
        assert!(matches!(
            err,
            FrameError::NonDataByte {
                offset: 6,
                byte: 0x80
            }
        ));

        let err = encode_frame(0xF7, &[]).unwrap_err();
        assert!(matches!(err, FrameError::NonDataByte { offset: 4, .. }));
    }

    #[test]
    fn test_encode_payload_too_large() {
        let payload = vec![0u8; DEFAULT_MAX_PAYLOAD + 1];
        let err = encode_frame(0x28, &payload).unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { .. }));
    }

    #[test]
    fn test_encode_accepts_mtu_sized_payload() {
        let payload = vec![0x7F; 64];
        let frame = encode_frame(0x28, &payload).unwrap();
        assert_eq!(frame.payload().len(), 64);
        assert_eq!(frame.wire_size(), FRAME_OVERHEAD + 64);
    }

    #[test]
    fn test_other_device_id() {
        let config = FrameConfig {
            device_id: 0x58,
            ..FrameConfig::default()
        };
        let frame = encode_frame_with_config(0x50, &[], &config).unwrap();
        assert_eq!(frame.device_id(), 0x58);
        assert!(decode_frame_with_config(frame.as_bytes(), &config).is_ok());
        assert!(decode_frame(frame.as_bytes()).is_err());
    }
}
