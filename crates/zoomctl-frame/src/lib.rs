//! Zoom SysEx frame encoding and decoding.
//!
//! Every vendor message exchanged with the pedal is a MIDI System Exclusive
//! frame:
//! - `0xF0` start byte
//! - a 3-byte header: Zoom manufacturer id `0x52`, `0x00`, device id
//! - a 1-byte command id
//! - zero or more 7-bit payload bytes
//! - `0xF7` terminator
//!
//! Decoding never panics on malformed input; every failure is a
//! [`FrameError`].

pub mod codec;
pub mod command;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{
    decode_frame, decode_frame_with_config, encode_frame, encode_frame_with_config, Frame,
    FrameConfig, DEFAULT_MAX_PAYLOAD, FRAME_OVERHEAD, G1X_FOUR_DEVICE_ID, HEADER_SIZE,
    SYSEX_END, SYSEX_START, ZOOM_VENDOR_ID,
};
pub use command::{
    command_name, is_patch_dump, CURRENT_PATCH_DUMP, DISABLE_EDIT, ENABLE_EDIT, PARAM_EDIT,
    PATCH_DUMP, REQUEST_CURRENT_PATCH, REQUEST_PATCH,
};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;
