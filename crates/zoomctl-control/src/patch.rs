//! Patch dump parsing.
//!
//! Only the name and level positions of a dump are known. They sit at fixed
//! offsets from the end of the wire message (`F0 .. F7`), which puts them
//! 19 and 9 bytes from the end of the payload:
//!
//! ```text
//! message: [ F0 52 00 dev cmd | .......... | name (10) | level | 8 bytes | F7 ]
//!                                          ^wire-20    ^wire-10
//! payload:                    [ .......... | name (10) | level | 8 bytes ]
//!                                          ^len-19     ^len-9
//! ```
//!
//! The per-slot layout is undocumented. Slots are produced by a
//! [`SlotDecoder`]; the default one reports every slot as unknown.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use zoomctl_frame::{decode_frame_with_config, is_patch_dump, Frame, FrameConfig, SYSEX_END};

use crate::command::SLOT_COUNT;
use crate::effect::EffectType;
use crate::error::ParseError;

/// Smallest payload that can hold the name and level fields.
pub const MIN_PATCH_PAYLOAD: usize = 30;

/// Width of the name field.
pub const NAME_LEN: usize = 10;

// Counted from the end of the payload; the F7 trailer is the 20th and 10th
// byte from the end of the message.
const NAME_FROM_END: usize = 19;
const LEVEL_FROM_END: usize = 9;
const UNKNOWN_NAME: &str = "Unknown";

/// State of one effect slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectSlot {
    #[serde(rename = "slot")]
    pub index: u8,
    #[serde(rename = "type")]
    pub effect_type: EffectType,
    pub enabled: bool,
    pub parameters: BTreeMap<u8, i32>,
}

impl EffectSlot {
    /// An undecoded slot: unknown type, off, no parameters.
    pub fn placeholder(index: u8) -> Self {
        Self {
            index,
            effect_type: EffectType::Unknown,
            enabled: false,
            parameters: BTreeMap::new(),
        }
    }
}

/// A parsed patch. Each parse yields a new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Patch {
    pub name: String,
    pub effects: [EffectSlot; SLOT_COUNT],
    /// Patch level. Best effort: the offset is not confirmed for every
    /// firmware.
    pub level: u8,
}

/// Strategy that recovers one slot from a dump payload.
///
/// Returning `None` means "can't tell"; the parser then uses
/// [`EffectSlot::placeholder`]. A decoder must not fail the parse.
pub trait SlotDecoder: Send {
    fn decode_slot(&self, index: u8, payload: &[u8]) -> Option<EffectSlot>;
}

/// Decoder that never recovers slot content.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderSlotDecoder;

impl SlotDecoder for PlaceholderSlotDecoder {
    fn decode_slot(&self, _index: u8, _payload: &[u8]) -> Option<EffectSlot> {
        None
    }
}

impl<F> SlotDecoder for F
where
    F: Fn(u8, &[u8]) -> Option<EffectSlot> + Send,
{
    fn decode_slot(&self, index: u8, payload: &[u8]) -> Option<EffectSlot> {
        self(index, payload)
    }
}

/// Turns patch dump frames into [`Patch`] values.
pub struct PatchParser {
    decoder: Box<dyn SlotDecoder>,
}

impl PatchParser {
    /// Parser with the placeholder slot decoder.
    pub fn new() -> Self {
        Self::with_decoder(PlaceholderSlotDecoder)
    }

    /// Parser with a custom slot decoder.
    pub fn with_decoder(decoder: impl SlotDecoder + 'static) -> Self {
        Self {
            decoder: Box::new(decoder),
        }
    }

    /// Parse a decoded frame.
    pub fn parse(&self, frame: &Frame) -> Result<Patch, ParseError> {
        if !is_patch_dump(frame.command_id()) {
            return Err(ParseError::UnexpectedCommand(frame.command_id()));
        }

        let payload = frame.payload();
        let len = payload.len();
        if len < MIN_PATCH_PAYLOAD {
            return Err(ParseError::TooShort {
                len,
                min: MIN_PATCH_PAYLOAD,
            });
        }

        let name_start = len - NAME_FROM_END;
        let name = extract_name(&payload[name_start..name_start + NAME_LEN]);
        let level = payload[len - LEVEL_FROM_END];

        let effects = std::array::from_fn(|i| {
            let index = i as u8;
            match self.decoder.decode_slot(index, payload) {
                Some(slot) => EffectSlot { index, ..slot },
                None => EffectSlot::placeholder(index),
            }
        });

        Ok(Patch {
            name,
            effects,
            level,
        })
    }

    /// Decode raw bytes as a frame, then parse it.
    pub fn parse_message(&self, bytes: &[u8], config: &FrameConfig) -> Result<Patch, ParseError> {
        let frame = decode_frame_with_config(bytes, config)?;
        self.parse(&frame)
    }
}

impl Default for PatchParser {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PatchParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatchParser").finish_non_exhaustive()
    }
}

/// Parse a frame with the placeholder slot decoder.
pub fn parse_patch(frame: &Frame) -> Result<Patch, ParseError> {
    PatchParser::new().parse(frame)
}

/// Decode and parse raw bytes with the default frame configuration.
pub fn parse_patch_message(bytes: &[u8]) -> Result<Patch, ParseError> {
    PatchParser::new().parse_message(bytes, &FrameConfig::default())
}

fn extract_name(window: &[u8]) -> String {
    let name: String = window
        .iter()
        .take_while(|&&b| b != 0x00 && b != SYSEX_END)
        .filter(|&&b| (32..=126).contains(&b))
        .map(|&b| char::from(b))
        .collect();

    let name = name.trim();
    if name.is_empty() {
        UNKNOWN_NAME.to_string()
    } else {
        name.to_string()
    }
}
