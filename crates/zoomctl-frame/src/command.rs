//! Known command ids (byte 4 of a frame).
//!
//! `0x29` is used in both directions: as a request it asks for the current
//! patch, and the pedal answers with a dump carrying the same id.

/// Enter Edit Mode. Required before parameter edits are accepted.
pub const ENABLE_EDIT: u8 = 0x50;

/// Leave Edit Mode.
pub const DISABLE_EDIT: u8 = 0x51;

/// Request the patch currently loaded on the pedal.
pub const REQUEST_CURRENT_PATCH: u8 = 0x29;

/// Request a stored patch. Payload: one byte, the patch index.
pub const REQUEST_PATCH: u8 = 0x09;

/// Inbound dump of a stored patch.
pub const PATCH_DUMP: u8 = 0x28;

/// Inbound dump of the current patch.
pub const CURRENT_PATCH_DUMP: u8 = 0x29;

/// Edit one parameter of one effect slot in the current patch.
/// Payload: slot, parameter number, value LSB (7 bits), value MSB (7 bits).
pub const PARAM_EDIT: u8 = 0x31;

/// Returns a human-readable name for a command id.
pub fn command_name(id: u8) -> &'static str {
    match id {
        ENABLE_EDIT => "ENABLE_EDIT",
        DISABLE_EDIT => "DISABLE_EDIT",
        REQUEST_CURRENT_PATCH => "CURRENT_PATCH",
        REQUEST_PATCH => "REQUEST_PATCH",
        PATCH_DUMP => "PATCH_DUMP",
        PARAM_EDIT => "PARAM_EDIT",
        _ => "UNKNOWN",
    }
}

/// Returns true if inbound frames with this id carry patch data.
pub fn is_patch_dump(id: u8) -> bool {
    matches!(id, PATCH_DUMP | CURRENT_PATCH_DUMP)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump_ids() {
        assert!(is_patch_dump(0x28));
        assert!(is_patch_dump(0x29));
        assert!(!is_patch_dump(ENABLE_EDIT));
        assert!(!is_patch_dump(REQUEST_PATCH));
    }

    #[test]
    fn names() {
        assert_eq!(command_name(0x50), "ENABLE_EDIT");
        assert_eq!(command_name(0x29), "CURRENT_PATCH");
        assert_eq!(command_name(0x7E), "UNKNOWN");
    }
}
