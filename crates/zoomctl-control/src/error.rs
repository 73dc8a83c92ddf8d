use crate::session::{SessionEvent, SessionState};

/// Errors raised by the Edit Mode state machine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// A parameter edit was attempted outside Edit Mode.
    #[error("not in edit mode (state: {0})")]
    NotInEditMode(SessionState),

    /// The event has no transition from the current state.
    #[error("invalid transition: {event} while {state}")]
    InvalidTransition {
        state: SessionState,
        event: SessionEvent,
    },
}

/// Errors raised while turning a command into a frame.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// A command field is outside its domain.
    #[error("{field} out of range: {value} (max {max})")]
    OutOfRange {
        field: &'static str,
        value: u32,
        max: u32,
    },

    /// The command is not allowed in the current session state.
    #[error("{command} not allowed while {state}")]
    WrongMode {
        command: &'static str,
        state: SessionState,
    },

    /// The frame codec rejected the payload.
    #[error("frame error: {0}")]
    Frame(#[from] zoomctl_frame::FrameError),
}

/// Errors raised while parsing a patch dump.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The payload is shorter than any real patch dump.
    #[error("patch payload too short ({len} bytes, min {min})")]
    TooShort { len: usize, min: usize },

    /// The message is not a well-formed vendor frame.
    #[error("malformed patch message: {0}")]
    Malformed(#[from] zoomctl_frame::FrameError),

    /// The frame is well-formed but is not a patch dump.
    #[error("command {0:#04x} is not a patch dump")]
    UnexpectedCommand(u8),
}

/// Non-fatal problems reported by the inbound dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// A subscriber returned an error or panicked. Dispatch continued.
    #[error("subscriber {subscriber} failed: {reason}")]
    SubscriberFailed {
        subscriber: &'static str,
        reason: String,
    },

    /// A subscriber slot was registered twice.
    #[error("subscriber {0} already registered")]
    AlreadyRegistered(&'static str),
}

/// Errors surfaced by [`Controller`](crate::Controller) operations.
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    /// Session state machine error.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// Command encoding error.
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] zoomctl_transport::TransportError),

    /// Subscriber registration error.
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
}

pub type Result<T> = std::result::Result<T, ControlError>;
