use crate::error::Result;

/// Callback invoked with each complete inbound message.
///
/// Backends may call this from a driver thread, so it must be `Send`. Keep it
/// short: push the bytes somewhere and return.
pub type MessageHandler = Box<dyn FnMut(&[u8]) + Send + 'static>;

/// A bidirectional, message-oriented byte channel to one device.
///
/// Each call to [`send`](MessageChannel::send) carries exactly one complete
/// MIDI message (a SysEx frame, a program change, ...). No assumption is made
/// about the underlying transport.
pub trait MessageChannel {
    /// Send one complete message. Fire-and-forget: there is no reply
    /// correlation at this layer.
    fn send(&mut self, message: &[u8]) -> Result<()>;

    /// Register the inbound handler. A channel accepts one subscriber.
    fn subscribe(&mut self, handler: MessageHandler) -> Result<()>;

    /// Drop the inbound handler, if any. Messages arriving afterwards are
    /// discarded by the channel.
    fn unsubscribe(&mut self) {}

    /// Transport name for diagnostics.
    fn transport_name(&self) -> &'static str {
        "unknown"
    }
}

impl<T: MessageChannel + ?Sized> MessageChannel for Box<T> {
    fn send(&mut self, message: &[u8]) -> Result<()> {
        (**self).send(message)
    }

    fn subscribe(&mut self, handler: MessageHandler) -> Result<()> {
        (**self).subscribe(handler)
    }

    fn unsubscribe(&mut self) {
        (**self).unsubscribe()
    }

    fn transport_name(&self) -> &'static str {
        (**self).transport_name()
    }
}
