//! Edit Mode session state machine.
//!
//! The pedal only accepts parameter edits after it has been told to enter
//! Edit Mode. The device never reports its mode, so the controller tracks it
//! locally from the commands it sent.
//!
//! ```text
//! PoweredOff --Connect--> Idle --EnableEdit--> EditMode
//!                          ^                      |
//!                          +-----DisableEdit------+
//! Idle/EditMode --Disconnect--> PoweredOff
//! ```

use std::fmt;

use serde::Serialize;

use crate::command::Command;
use crate::error::SessionError;

/// Where the device session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No device connection.
    #[default]
    PoweredOff,
    /// Connected; read-only requests allowed.
    Idle,
    /// Connected and in Edit Mode; parameter edits allowed.
    EditMode,
}

impl SessionState {
    /// Whether a device connection is open.
    pub fn is_connected(self) -> bool {
        !matches!(self, SessionState::PoweredOff)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionState::PoweredOff => "powered off",
            SessionState::Idle => "idle",
            SessionState::EditMode => "in edit mode",
        })
    }
}

/// Inputs to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionEvent {
    Connect,
    EnableEdit,
    DisableEdit,
    Disconnect,
}

impl fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionEvent::Connect => "connect",
            SessionEvent::EnableEdit => "enable-edit",
            SessionEvent::DisableEdit => "disable-edit",
            SessionEvent::Disconnect => "disconnect",
        })
    }
}

/// Outcome of an accepted transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: SessionState,
    pub to: SessionState,
    /// Command whose frame accompanies this transition, if any.
    pub emits: Option<Command>,
    /// Whether pending inbound state must be discarded.
    pub discard_pending: bool,
}

/// One device session. Owned by exactly one controller.
#[derive(Debug, Default)]
pub struct Session {
    state: SessionState,
}

impl Session {
    /// A fresh session in [`SessionState::PoweredOff`].
    pub fn new() -> Self {
        Self::default()
    }

    /// The current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Look up the transition for `event` without applying it.
    pub fn plan(&self, event: SessionEvent) -> Result<Transition, SessionError> {
        use SessionEvent::*;
        use SessionState::*;

        let (to, emits, discard_pending) = match (self.state, event) {
            (PoweredOff, Connect) => (Idle, None, false),
            (Idle, SessionEvent::EnableEdit) => (EditMode, Some(Command::EnableEdit), false),
            (EditMode, SessionEvent::DisableEdit) => (Idle, Some(Command::DisableEdit), false),
            (Idle | EditMode, Disconnect) => (PoweredOff, None, true),
            (state, event) => return Err(SessionError::InvalidTransition { state, event }),
        };

        Ok(Transition {
            from: self.state,
            to,
            emits,
            discard_pending,
        })
    }

    /// Apply `event`, returning the transition taken.
    pub fn transition(&mut self, event: SessionEvent) -> Result<Transition, SessionError> {
        let transition = self.plan(event)?;
        tracing::debug!(from = %transition.from, to = %transition.to, %event, "session transition");
        self.state = transition.to;
        Ok(transition)
    }

    /// Fail unless the session is in Edit Mode.
    pub fn require_edit_mode(&self) -> Result<(), SessionError> {
        match self.state {
            SessionState::EditMode => Ok(()),
            other => Err(SessionError::NotInEditMode(other)),
        }
    }
}
