//! Command encoder: high-level intents to vendor frames.
//!
//! Every bound is checked before a frame is built, so a malformed command
//! never reaches the device.
//!
//! Parameter edits share one frame layout (`PARAM_EDIT`):
//!
//! ```text
//! F0 52 00 64 31 <slot> <param#> <value lsb7> <value msb7> F7
//! ```
//!
//! `param#` 0 switches the effect on/off, 1 selects the effect type and
//! `2 + n` addresses knob `n` of the effect.

use zoomctl_frame::{
    encode_frame_with_config, Frame, FrameConfig, DISABLE_EDIT, ENABLE_EDIT, PARAM_EDIT,
    REQUEST_CURRENT_PATCH, REQUEST_PATCH,
};

use crate::error::EncodeError;
use crate::session::SessionState;

/// Number of effect slots in a patch.
pub const SLOT_COUNT: usize = 5;

/// Highest effect slot index.
pub const MAX_SLOT: u8 = (SLOT_COUNT - 1) as u8;

/// Highest stored patch index (50 patches).
pub const MAX_PATCH: u8 = 49;

/// Highest knob parameter id; `2 + MAX_PARAM` must stay a data byte.
pub const MAX_PARAM: u8 = 125;

/// Highest value carried in two 7-bit bytes.
pub const MAX_VALUE: u16 = 0x3FFF;

const PARAM_ON_OFF: u8 = 0;
const PARAM_EFFECT_TYPE: u8 = 1;
const PARAM_KNOB_BASE: u8 = 2;

const PROGRAM_CHANGE: u8 = 0xC0;

/// Outbound intents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Enter Edit Mode.
    EnableEdit,
    /// Leave Edit Mode.
    DisableEdit,
    /// Ask for a dump of the current patch.
    RequestCurrentPatch,
    /// Ask for a dump of a stored patch.
    RequestPatch { patch: u8 },
    /// Switch an effect slot on or off.
    ToggleEffect { slot: u8, enabled: bool },
    /// Load a different effect into a slot.
    SetEffectType { slot: u8, effect_type: u16 },
    /// Set one knob of the effect in a slot.
    SetEffectParameter { slot: u8, param: u8, value: u16 },
}

impl Command {
    /// Stable name for logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Command::EnableEdit => "enable-edit",
            Command::DisableEdit => "disable-edit",
            Command::RequestCurrentPatch => "request-current-patch",
            Command::RequestPatch { .. } => "request-patch",
            Command::ToggleEffect { .. } => "toggle-effect",
            Command::SetEffectType { .. } => "set-effect-type",
            Command::SetEffectParameter { .. } => "set-effect-parameter",
        }
    }

    /// Whether this command changes the current patch and so needs Edit Mode.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Command::ToggleEffect { .. }
                | Command::SetEffectType { .. }
                | Command::SetEffectParameter { .. }
        )
    }

    /// Whether this command only reads device state.
    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            Command::RequestCurrentPatch | Command::RequestPatch { .. }
        )
    }

    /// Check every field against its domain.
    pub fn validate(&self) -> Result<(), EncodeError> {
        match *self {
            Command::EnableEdit | Command::DisableEdit | Command::RequestCurrentPatch => Ok(()),
            Command::RequestPatch { patch } => check("patch", patch.into(), MAX_PATCH.into()),
            Command::ToggleEffect { slot, .. } => check("slot", slot.into(), MAX_SLOT.into()),
            Command::SetEffectType { slot, effect_type } => {
                check("slot", slot.into(), MAX_SLOT.into())?;
                check("effect_type", effect_type.into(), MAX_VALUE.into())
            }
            Command::SetEffectParameter { slot, param, value } => {
                check("slot", slot.into(), MAX_SLOT.into())?;
                check("param", param.into(), MAX_PARAM.into())?;
                check("value", value.into(), MAX_VALUE.into())
            }
        }
    }

    /// Check that the command may be sent while the session is in `state`.
    pub fn check_mode(&self, state: SessionState) -> Result<(), EncodeError> {
        let allowed = match self {
            Command::EnableEdit => state == SessionState::Idle,
            Command::DisableEdit => state == SessionState::EditMode,
            Command::RequestCurrentPatch | Command::RequestPatch { .. } => state.is_connected(),
            _ => state == SessionState::EditMode,
        };
        if allowed {
            Ok(())
        } else {
            Err(EncodeError::WrongMode {
                command: self.name(),
                state,
            })
        }
    }

    fn wire(&self) -> (u8, Vec<u8>) {
        match *self {
            Command::EnableEdit => (ENABLE_EDIT, Vec::new()),
            Command::DisableEdit => (DISABLE_EDIT, Vec::new()),
            Command::RequestCurrentPatch => (REQUEST_CURRENT_PATCH, Vec::new()),
            Command::RequestPatch { patch } => (REQUEST_PATCH, vec![patch]),
            Command::ToggleEffect { slot, enabled } => {
                param_edit(slot, PARAM_ON_OFF, u16::from(enabled))
            }
            Command::SetEffectType { slot, effect_type } => {
                param_edit(slot, PARAM_EFFECT_TYPE, effect_type)
            }
            Command::SetEffectParameter { slot, param, value } => {
                param_edit(slot, PARAM_KNOB_BASE + param, value)
            }
        }
    }
}

fn check(field: &'static str, value: u32, max: u32) -> Result<(), EncodeError> {
    if value > max {
        return Err(EncodeError::OutOfRange { field, value, max });
    }
    Ok(())
}

fn param_edit(slot: u8, param: u8, value: u16) -> (u8, Vec<u8>) {
    let lsb = (value & 0x7F) as u8;
    let msb = ((value >> 7) & 0x7F) as u8;
    (PARAM_EDIT, vec![slot, param, lsb, msb])
}

/// Encode a command for the G1X Four, given the current session state.
///
/// Bounds are checked first, then the mode. The returned frame is not sent;
/// transmission is the caller's job.
pub fn encode(command: &Command, state: SessionState) -> Result<Frame, EncodeError> {
    encode_with_config(command, state, &FrameConfig::default())
}

/// Encode a command with explicit frame configuration.
pub fn encode_with_config(
    command: &Command,
    state: SessionState,
    config: &FrameConfig,
) -> Result<Frame, EncodeError> {
    command.validate()?;
    command.check_mode(state)?;

    let (command_id, payload) = command.wire();
    Ok(encode_frame_with_config(command_id, &payload, config)?)
}

/// Build the standard program change that selects a stored patch.
///
/// This is a channel message, not a vendor frame, and works outside Edit Mode.
pub fn program_change(patch: u8) -> Result<[u8; 2], EncodeError> {
    check("patch", patch.into(), MAX_PATCH.into())?;
    Ok([PROGRAM_CHANGE, patch])
}

#[cfg(test)]
mod tests {
    use zoomctl_frame::decode_frame;

    use super::*;

    const EDIT: SessionState = SessionState::EditMode;
    const IDLE: SessionState = SessionState::Idle;

    #[test]
    fn edit_mode_frames() {
        let frame = encode(&Command::EnableEdit, IDLE).unwrap();
        assert_eq!(frame.as_bytes(), &[0xF0, 0x52, 0x00, 0x64, 0x50, 0xF7]);

        let frame = encode(&Command::DisableEdit, EDIT).unwrap();
        assert_eq!(frame.as_bytes(), &[0xF0, 0x52, 0x00, 0x64, 0x51, 0xF7]);
    }

    #[test]
    fn request_frames() {
        let frame = encode(&Command::RequestCurrentPatch, IDLE).unwrap();
        assert_eq!(frame.as_bytes(), &[0xF0, 0x52, 0x00, 0x64, 0x29, 0xF7]);

        let frame = encode(&Command::RequestPatch { patch: 49 }, EDIT).unwrap();
        assert_eq!(frame.as_bytes(), &[0xF0, 0x52, 0x00, 0x64, 0x09, 49, 0xF7]);
    }

    #[test]
    fn every_patch_index_in_range_encodes() {
        for patch in 0..=MAX_PATCH {
            assert!(encode(&Command::RequestPatch { patch }, IDLE).is_ok());
        }
        let err = encode(&Command::RequestPatch { patch: 50 }, IDLE).unwrap_err();
        assert!(matches!(
            err,
            EncodeError::OutOfRange {
                field: "patch",
                value: 50,
                max: 49
            }
        ));
    }

    #[test]
    fn every_slot_in_range_encodes() {
        for slot in 0..=MAX_SLOT {
            assert!(encode(&Command::ToggleEffect { slot, enabled: true }, EDIT).is_ok());
            assert!(encode(&Command::SetEffectType { slot, effect_type: 0x20 }, EDIT).is_ok());
            assert!(encode(
                &Command::SetEffectParameter {
                    slot,
                    param: 1,
                    value: 50
                },
                EDIT
            )
            .is_ok());
        }

        let bad = [
            Command::ToggleEffect { slot: 5, enabled: false },
            Command::SetEffectType { slot: 5, effect_type: 0 },
            Command::SetEffectParameter { slot: 5, param: 0, value: 0 },
        ];
        for command in bad {
            assert!(matches!(
                encode(&command, EDIT),
                Err(EncodeError::OutOfRange { field: "slot", .. })
            ));
        }
    }

    #[test]
    fn param_and_value_bounds() {
        let err = encode(
            &Command::SetEffectParameter { slot: 0, param: 126, value: 0 },
            EDIT,
        )
        .unwrap_err();
        assert!(matches!(err, EncodeError::OutOfRange { field: "param", .. }));

        let err = encode(
            &Command::SetEffectParameter { slot: 0, param: 0, value: 0x4000 },
            EDIT,
        )
        .unwrap_err();
        assert!(matches!(err, EncodeError::OutOfRange { field: "value", .. }));

        let err = encode(&Command::SetEffectType { slot: 0, effect_type: 0x4000 }, EDIT)
            .unwrap_err();
        assert!(matches!(
            err,
            EncodeError::OutOfRange { field: "effect_type", .. }
        ));
    }

    #[test]
    fn param_edit_layout() {
        let frame = encode(&Command::ToggleEffect { slot: 2, enabled: true }, EDIT).unwrap();
        assert_eq!(frame.command_id(), PARAM_EDIT);
        assert_eq!(frame.payload(), &[2, 0, 1, 0]);

        let frame = encode(&Command::SetEffectType { slot: 1, effect_type: 0x21 }, EDIT).unwrap();
        assert_eq!(frame.payload(), &[1, 1, 0x21, 0]);

        let frame = encode(
            &Command::SetEffectParameter { slot: 0, param: 1, value: 50 },
            EDIT,
        )
        .unwrap();
        assert_eq!(frame.payload(), &[0, 3, 50, 0]);

        // 300 = 2 * 128 + 44
        let frame = encode(
            &Command::SetEffectParameter { slot: 4, param: 0, value: 300 },
            EDIT,
        )
        .unwrap();
        assert_eq!(frame.payload(), &[4, 2, 44, 2]);
    }

    #[test]
    fn mutations_need_edit_mode() {
        let mutations = [
            Command::ToggleEffect { slot: 0, enabled: true },
            Command::SetEffectType { slot: 0, effect_type: 1 },
            Command::SetEffectParameter { slot: 0, param: 1, value: 50 },
        ];
        for command in mutations {
            for state in [SessionState::PoweredOff, IDLE] {
                assert!(matches!(
                    encode(&command, state),
                    Err(EncodeError::WrongMode { .. })
                ));
            }
            assert!(encode(&command, EDIT).is_ok());
        }
    }

    #[test]
    fn read_only_allowed_when_connected() {
        for command in [Command::RequestCurrentPatch, Command::RequestPatch { patch: 0 }] {
            assert!(encode(&command, IDLE).is_ok());
            assert!(encode(&command, EDIT).is_ok());
            assert!(matches!(
                encode(&command, SessionState::PoweredOff),
                Err(EncodeError::WrongMode { .. })
            ));
        }
    }

    #[test]
    fn edit_toggles_follow_session() {
        assert!(encode(&Command::EnableEdit, EDIT).is_err());
        assert!(encode(&Command::DisableEdit, IDLE).is_err());
        assert!(encode(&Command::EnableEdit, SessionState::PoweredOff).is_err());
    }

    #[test]
    fn range_checked_before_mode() {
        let err = encode(&Command::ToggleEffect { slot: 9, enabled: true }, IDLE).unwrap_err();
        assert!(matches!(err, EncodeError::OutOfRange { .. }));
    }

    #[test]
    fn encoded_frames_decode_to_same_bytes() {
        let commands = [
            (Command::EnableEdit, IDLE),
            (Command::DisableEdit, EDIT),
            (Command::RequestCurrentPatch, IDLE),
            (Command::RequestPatch { patch: 17 }, IDLE),
            (Command::ToggleEffect { slot: 3, enabled: false }, EDIT),
            (Command::SetEffectType { slot: 4, effect_type: MAX_VALUE }, EDIT),
            (Command::SetEffectParameter { slot: 0, param: MAX_PARAM, value: 100 }, EDIT),
        ];
        for (command, state) in commands {
            let frame = encode(&command, state).unwrap();
            let decoded = decode_frame(frame.as_bytes()).unwrap();
            assert_eq!(decoded.command_id(), frame.command_id(), "{}", command.name());
            assert_eq!(decoded.payload(), frame.payload(), "{}", command.name());
        }
    }

    #[test]
    fn program_change_message() {
        assert_eq!(program_change(12).unwrap(), [0xC0, 12]);
        assert!(matches!(
            program_change(50),
            Err(EncodeError::OutOfRange { field: "patch", .. })
        ));
    }

    #[test]
    fn classification_helpers() {
        assert!(Command::ToggleEffect { slot: 0, enabled: true }.is_mutation());
        assert!(!Command::RequestCurrentPatch.is_mutation());
        assert!(Command::RequestPatch { patch: 1 }.is_read_only());
        assert!(!Command::EnableEdit.is_read_only());
    }
}
