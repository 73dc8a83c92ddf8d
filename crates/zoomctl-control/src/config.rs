use zoomctl_frame::FrameConfig;
use zoomctl_transport::DEFAULT_INBOUND_CAPACITY;

use crate::dispatch::DEFAULT_DIAGNOSTIC_CAPACITY;

/// Configuration for a [`Controller`](crate::Controller).
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Frame codec settings (device id, payload limit).
    pub frame: FrameConfig,
    /// Messages buffered between the transport callback and
    /// [`Controller::process_inbound`](crate::Controller::process_inbound).
    /// Further messages are dropped until the queue is drained.
    pub inbound_capacity: usize,
    /// Subscriber diagnostics kept until
    /// [`Controller::take_diagnostics`](crate::Controller::take_diagnostics).
    /// When full, the oldest is dropped and counted.
    pub diagnostic_capacity: usize,
}

impl ControllerConfig {
    /// Default configuration for another Zoom device id.
    pub fn for_device(device_id: u8) -> Self {
        Self {
            frame: FrameConfig {
                device_id,
                ..FrameConfig::default()
            },
            ..Self::default()
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            frame: FrameConfig::default(),
            inbound_capacity: DEFAULT_INBOUND_CAPACITY,
            diagnostic_capacity: DEFAULT_DIAGNOSTIC_CAPACITY,
        }
    }
}
