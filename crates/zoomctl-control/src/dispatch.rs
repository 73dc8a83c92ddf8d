//! Inbound message classification and subscriber dispatch.
//!
//! Each inbound message is classified, patch dumps are parsed, and at most
//! one subscriber is called. Subscriber failures never escape
//! [`Dispatcher::dispatch`]: they are logged and queued as diagnostics.
//! The queue is bounded; when it is full the oldest diagnostic is dropped
//! and counted.
//!
//! A panicking subscriber is caught, but the process panic hook still runs
//! first, and the default hook prints the panic to stderr. Callers that need
//! a quiet process should install their own hook with
//! [`std::panic::set_hook`]; this crate never replaces it.

use std::any::Any;
use std::collections::VecDeque;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, warn};
use zoomctl_frame::{
    decode_frame_with_config, is_patch_dump, Frame, FrameConfig, FrameError, SYSEX_START,
    ZOOM_VENDOR_ID,
};

use crate::error::{DispatchError, ParseError};
use crate::patch::{Patch, PatchParser};

const PROGRAM_CHANGE: u8 = 0xC0;
const CONTROL_CHANGE: u8 = 0xB0;
const STATUS_MASK: u8 = 0xF0;

/// Default number of diagnostics kept until [`Dispatcher::take_diagnostics`].
pub const DEFAULT_DIAGNOSTIC_CAPACITY: usize = 64;

/// Subscriber slot names, as reported in diagnostics.
pub const ON_PATCH_CHANGE: &str = "on_patch_change";
pub const ON_PATCH_DATA_RECEIVED: &str = "on_patch_data_received";
pub const ON_CONTROL_CHANGE: &str = "on_control_change";

/// What a subscriber returns. An `Err` is reported, not propagated.
pub type SubscriberResult = std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;

type PatchChangeFn = Box<dyn FnMut(u8) -> SubscriberResult + Send>;
type PatchDataFn = Box<dyn FnMut(&Patch) -> SubscriberResult + Send>;
type ControlChangeFn = Box<dyn FnMut(u8, u8) -> SubscriberResult + Send>;

/// Kind of an inbound message.
#[derive(Debug)]
pub enum MessageClass {
    /// `C0 <patch>`: the pedal switched patch.
    ProgramChange(u8),
    /// `Bx <controller> <value>`.
    ControlChange { controller: u8, value: u8 },
    /// A well-formed Zoom frame.
    VendorFrame(Frame),
    /// A message that starts like a Zoom frame but failed to decode.
    InvalidVendorFrame(FrameError),
    /// Anything else, including messages missing their data bytes.
    Unrecognized,
}

impl MessageClass {
    /// Short kind name for logs and output.
    pub fn kind(&self) -> &'static str {
        match self {
            MessageClass::ProgramChange(_) => "program_change",
            MessageClass::ControlChange { .. } => "control_change",
            MessageClass::VendorFrame(_) => "vendor_frame",
            MessageClass::InvalidVendorFrame(_) => "invalid_vendor_frame",
            MessageClass::Unrecognized => "unrecognized",
        }
    }
}

/// Classify a message using the default frame configuration.
pub fn classify(bytes: &[u8]) -> MessageClass {
    classify_with_config(bytes, &FrameConfig::default())
}

/// Classify a message. Never fails; bad input is `Unrecognized` or
/// `InvalidVendorFrame`.
pub fn classify_with_config(bytes: &[u8], config: &FrameConfig) -> MessageClass {
    match bytes {
        [PROGRAM_CHANGE, patch, ..] => MessageClass::ProgramChange(*patch),
        [status, controller, value, ..] if status & STATUS_MASK == CONTROL_CHANGE => {
            MessageClass::ControlChange {
                controller: *controller,
                value: *value,
            }
        }
        [SYSEX_START, ZOOM_VENDOR_ID, ..] => match decode_frame_with_config(bytes, config) {
            Ok(frame) => MessageClass::VendorFrame(frame),
            Err(err) => MessageClass::InvalidVendorFrame(err),
        },
        _ => MessageClass::Unrecognized,
    }
}

/// Result of dispatching one message.
#[derive(Debug)]
pub struct DispatchOutcome {
    pub class: MessageClass,
    /// Parse result, for patch dump frames only.
    pub patch: Option<Result<Patch, ParseError>>,
    /// Subscriber that was called, if any.
    pub notified: Option<&'static str>,
    /// Set when the called subscriber failed.
    pub diagnostic: Option<DispatchError>,
}

/// Routes inbound messages to typed subscriber slots.
pub struct Dispatcher {
    config: FrameConfig,
    parser: PatchParser,
    on_patch_change: Option<PatchChangeFn>,
    on_patch_data: Option<PatchDataFn>,
    on_control_change: Option<ControlChangeFn>,
    diagnostics: VecDeque<DispatchError>,
    diagnostic_capacity: usize,
    dropped_diagnostics: u64,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::with_parts(FrameConfig::default(), PatchParser::new())
    }

    /// Dispatcher with explicit frame configuration and patch parser.
    pub fn with_parts(config: FrameConfig, parser: PatchParser) -> Self {
        Self {
            config,
            parser,
            on_patch_change: None,
            on_patch_data: None,
            on_control_change: None,
            diagnostics: VecDeque::new(),
            diagnostic_capacity: DEFAULT_DIAGNOSTIC_CAPACITY,
            dropped_diagnostics: 0,
        }
    }

    /// Keep at most `capacity` undrained diagnostics (minimum 1).
    pub fn with_diagnostic_capacity(mut self, capacity: usize) -> Self {
        self.diagnostic_capacity = capacity.max(1);
        self
    }

    /// Register the program change subscriber. Can only be done once.
    ///
    /// Errors and panics become diagnostics; see the module docs about
    /// panic output.
    pub fn on_patch_change<F>(&mut self, f: F) -> Result<(), DispatchError>
    where
        F: FnMut(u8) -> SubscriberResult + Send + 'static,
    {
        register(&mut self.on_patch_change, ON_PATCH_CHANGE, Box::new(f))
    }

    /// Register the parsed patch subscriber. Can only be done once.
    pub fn on_patch_data_received<F>(&mut self, f: F) -> Result<(), DispatchError>
    where
        F: FnMut(&Patch) -> SubscriberResult + Send + 'static,
    {
        register(&mut self.on_patch_data, ON_PATCH_DATA_RECEIVED, Box::new(f))
    }

    /// Register the control change subscriber. Can only be done once.
    pub fn on_control_change<F>(&mut self, f: F) -> Result<(), DispatchError>
    where
        F: FnMut(u8, u8) -> SubscriberResult + Send + 'static,
    {
        register(&mut self.on_control_change, ON_CONTROL_CHANGE, Box::new(f))
    }

    /// Classify one message and notify at most one subscriber.
    pub fn dispatch(&mut self, bytes: &[u8]) -> DispatchOutcome {
        let class = classify_with_config(bytes, &self.config);
        let mut patch = None;

        let call = match &class {
            MessageClass::ProgramChange(n) => {
                let n = *n;
                self.on_patch_change
                    .as_mut()
                    .map(|f| (ON_PATCH_CHANGE, invoke(|| f(n))))
            }
            MessageClass::ControlChange { controller, value } => {
                let (controller, value) = (*controller, *value);
                self.on_control_change
                    .as_mut()
                    .map(|f| (ON_CONTROL_CHANGE, invoke(|| f(controller, value))))
            }
            MessageClass::VendorFrame(frame) if is_patch_dump(frame.command_id()) => {
                let parsed = self.parser.parse(frame);
                let call = match (&parsed, self.on_patch_data.as_mut()) {
                    (Ok(p), Some(f)) => Some((ON_PATCH_DATA_RECEIVED, invoke(|| f(p)))),
                    (Err(err), _) => {
                        debug!(error = %err, "patch dump not parsed");
                        None
                    }
                    _ => None,
                };
                patch = Some(parsed);
                call
            }
            MessageClass::VendorFrame(frame) => {
                debug!(command_id = frame.command_id(), "vendor frame ignored");
                None
            }
            MessageClass::InvalidVendorFrame(err) => {
                debug!(error = %err, "invalid vendor frame");
                None
            }
            MessageClass::Unrecognized => None,
        };

        let (notified, diagnostic) = match call {
            Some((name, Err(reason))) => {
                let err = DispatchError::SubscriberFailed {
                    subscriber: name,
                    reason,
                };
                warn!(error = %err, kind = class.kind(), "subscriber failed");
                self.record(err.clone());
                (Some(name), Some(err))
            }
            Some((name, Ok(()))) => (Some(name), None),
            None => (None, None),
        };

        DispatchOutcome {
            class,
            patch,
            notified,
            diagnostic,
        }
    }

    /// Drain the diagnostics queued since the last call, oldest first.
    pub fn take_diagnostics(&mut self) -> Vec<DispatchError> {
        self.diagnostics.drain(..).collect()
    }

    /// Diagnostics discarded because the queue was full.
    pub fn dropped_diagnostics(&self) -> u64 {
        self.dropped_diagnostics
    }

    /// Number of queued diagnostics.
    pub fn pending_diagnostics(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    fn record(&mut self, err: DispatchError) {
        if self.diagnostics.len() >= self.diagnostic_capacity {
            self.diagnostics.pop_front();
            self.dropped_diagnostics += 1;
            debug!(
                capacity = self.diagnostic_capacity,
                "diagnostic queue full, dropping oldest"
            );
        }
        self.diagnostics.push_back(err);
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.config)
            .field("on_patch_change", &self.on_patch_change.is_some())
            .field("on_patch_data_received", &self.on_patch_data.is_some())
            .field("on_control_change", &self.on_control_change.is_some())
            .field("diagnostics", &self.diagnostics.len())
            .field("dropped_diagnostics", &self.dropped_diagnostics)
            .finish()
    }
}

fn register<T>(slot: &mut Option<T>, name: &'static str, f: T) -> Result<(), DispatchError> {
    if slot.is_some() {
        return Err(DispatchError::AlreadyRegistered(name));
    }
    *slot = Some(f);
    Ok(())
}

/// Run a subscriber, turning errors and panics into a reason string.
fn invoke(call: impl FnOnce() -> SubscriberResult) -> Result<(), String> {
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(err.to_string()),
        Err(payload) => Err(format!("panicked: {}", panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}
