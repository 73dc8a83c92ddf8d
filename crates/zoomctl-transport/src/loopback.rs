use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;
use tracing::debug;

use crate::error::{Result, TransportError};
use crate::traits::{MessageChannel, MessageHandler};

/// In-memory message channel.
///
/// Outbound messages are recorded instead of transmitted; inbound messages are
/// injected by the test or tool via [`inject`](LoopbackChannel::inject).
/// Clones share the same state, so one clone can be handed to a controller
/// while another plays the device side.
///
/// Several clones may inject from different threads. Deliveries are
/// serialized: the subscriber never runs twice at once, and a message is not
/// dropped just because another delivery is in progress.
#[derive(Clone, Default)]
pub struct LoopbackChannel {
    inner: Arc<Mutex<Inner>>,
}

type SharedHandler = Arc<Mutex<MessageHandler>>;

#[derive(Default)]
struct Inner {
    sent: Vec<Bytes>,
    handler: Option<SharedHandler>,
    closed: bool,
    max_message_size: Option<usize>,
}

impl LoopbackChannel {
    /// Create an open channel with no size limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a channel that rejects messages larger than `max` bytes.
    pub fn with_max_message_size(max: usize) -> Self {
        let channel = Self::default();
        channel.lock().max_message_size = Some(max);
        channel
    }

    /// Deliver a message as if the device had sent it.
    ///
    /// Returns `false` when nobody is subscribed or the channel is closed; the
    /// message is dropped in that case. A concurrent `inject` waits for the
    /// running delivery to finish. The subscriber must not call `inject` on
    /// the same channel.
    pub fn inject(&self, message: &[u8]) -> bool {
        // The handler runs without the state lock held.
        let handler = {
            let inner = self.lock();
            if inner.closed {
                return false;
            }
            inner.handler.clone()
        };

        let Some(handler) = handler else {
            debug!(len = message.len(), "loopback: no subscriber, dropping");
            return false;
        };

        let mut deliver = handler.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        (*deliver)(message);
        true
    }

    /// Snapshot of every message sent so far, oldest first.
    pub fn sent(&self) -> Vec<Bytes> {
        self.lock().sent.clone()
    }

    /// Remove and return every recorded outbound message.
    pub fn take_sent(&self) -> Vec<Bytes> {
        std::mem::take(&mut self.lock().sent)
    }

    /// Whether an inbound handler is registered.
    pub fn has_subscriber(&self) -> bool {
        self.lock().handler.is_some()
    }

    /// Close the channel. Subsequent sends fail with [`TransportError::Closed`].
    pub fn close(&self) {
        let mut inner = self.lock();
        inner.closed = true;
        inner.handler = None;
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl MessageChannel for LoopbackChannel {
    fn send(&mut self, message: &[u8]) -> Result<()> {
        let mut inner = self.lock();
        if inner.closed {
            return Err(TransportError::Closed);
        }
        if let Some(max) = inner.max_message_size {
            if message.len() > max {
                return Err(TransportError::MessageTooLarge {
                    size: message.len(),
                    max,
                });
            }
        }
        inner.sent.push(Bytes::copy_from_slice(message));
        Ok(())
    }

    fn subscribe(&mut self, handler: MessageHandler) -> Result<()> {
        let mut inner = self.lock();
        if inner.closed {
            return Err(TransportError::Closed);
        }
        if inner.handler.is_some() {
            return Err(TransportError::AlreadySubscribed);
        }
        inner.handler = Some(Arc::new(Mutex::new(handler)));
        Ok(())
    }

    fn unsubscribe(&mut self) {
        self.lock().handler = None;
    }

    fn transport_name(&self) -> &'static str {
        "loopback"
    }
}

impl std::fmt::Debug for LoopbackChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("LoopbackChannel")
            .field("sent", &inner.sent.len())
            .field("subscribed", &inner.handler.is_some())
            .field("closed", &inner.closed)
            .finish()
    }
}
