//! Edit Mode session, command encoding and inbound handling for Zoom pedals.
//!
//! This is the "just works" layer. Build a [`Controller`] over any
//! [`MessageChannel`](zoomctl_transport::MessageChannel), connect, and send
//! typed commands; patch dumps come back as [`Patch`] values through typed
//! subscribers.

pub mod command;
pub mod config;
pub mod controller;
pub mod dispatch;
pub mod effect;
pub mod error;
pub mod patch;
pub mod session;
pub mod tracker;

pub use command::{
    encode, encode_with_config, program_change, Command, MAX_PARAM, MAX_PATCH, MAX_SLOT,
    MAX_VALUE, SLOT_COUNT,
};
pub use config::ControllerConfig;
pub use controller::Controller;
pub use dispatch::{
    classify, classify_with_config, DispatchOutcome, Dispatcher, MessageClass, SubscriberResult,
    DEFAULT_DIAGNOSTIC_CAPACITY, ON_CONTROL_CHANGE, ON_PATCH_CHANGE,
    ON_PATCH_DATA_RECEIVED,
};
pub use effect::{EffectCategory, EffectInfo, EffectType, KNOWN_EFFECTS};
pub use error::{ControlError, DispatchError, EncodeError, ParseError, Result, SessionError};
pub use patch::{
    parse_patch, parse_patch_message, EffectSlot, Patch, PatchParser, PlaceholderSlotDecoder,
    SlotDecoder, MIN_PATCH_PAYLOAD, NAME_LEN,
};
pub use session::{Session, SessionEvent, SessionState, Transition};
pub use tracker::{PatchRequestTracker, PendingRequest, DEFAULT_REPLY_TIMEOUT};
