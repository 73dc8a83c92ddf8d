//! Byte-message channel abstraction for Zoom pedal control.
//!
//! The protocol core never opens devices itself. It talks to a
//! [`MessageChannel`]: something that can send one complete MIDI message and
//! call back with each complete message received. Real backends (a MIDI
//! driver, a WebMIDI bridge) live outside this workspace.
//!
//! This crate provides:
//! - [`MessageChannel`]: the trait the controller is generic over
//! - [`LoopbackChannel`]: an in-memory channel for tests and offline tools
//! - [`inbound_queue`]: a bounded bridge from driver callbacks to the
//!   owning thread, so inbound messages are dispatched one at a time

pub mod error;
pub mod loopback;
pub mod queue;
pub mod traits;

pub use error::{Result, TransportError};
pub use loopback::LoopbackChannel;
pub use queue::{inbound_queue, InboundReceiver, DEFAULT_INBOUND_CAPACITY};
pub use traits::{MessageChannel, MessageHandler};
