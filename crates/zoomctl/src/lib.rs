//! Control a Zoom G1X Four guitar pedal over MIDI SysEx.
//!
//! zoomctl encodes edit commands as Zoom SysEx frames, tracks the pedal's
//! Edit Mode, and turns inbound patch dumps into structured patches. It does
//! not open MIDI ports: any bidirectional byte-message channel will do.
//!
//! # Crate Structure
//!
//! - [`transport`]: byte-message channel abstraction and inbound queue
//! - [`frame`]: SysEx frame codec and `.syx` stream reader/writer
//! - [`control`]: session, command encoder, dispatcher and patch parser
//!   (behind the `control` feature)

/// Re-export transport types.
pub mod transport {
    pub use zoomctl_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use zoomctl_frame::*;
}

/// Re-export control types (requires `control` feature).
#[cfg(feature = "control")]
pub mod control {
    pub use zoomctl_control::*;
}
