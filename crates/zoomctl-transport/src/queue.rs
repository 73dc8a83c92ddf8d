//! Bounded bridge from transport callbacks to the owning thread.
//!
//! Backends deliver inbound messages from whatever thread their driver uses.
//! The handler returned by [`inbound_queue`] only copies the bytes into a
//! flume channel; the owner drains the [`InboundReceiver`] and dispatches each
//! message in arrival order, so at most one message is processed at a time.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use flume::{Receiver, RecvTimeoutError, Sender, TrySendError};
use tracing::warn;

use crate::traits::MessageHandler;

/// Default number of inbound messages buffered before new ones are dropped.
pub const DEFAULT_INBOUND_CAPACITY: usize = 256;

/// Owner side of an inbound queue.
#[derive(Debug)]
pub struct InboundReceiver {
    rx: Receiver<Bytes>,
    dropped: Arc<AtomicU64>,
}

/// Create a bounded inbound queue.
///
/// Returns the handler to pass to [`MessageChannel::subscribe`] and the
/// receiver the owner drains. When the queue is full, new messages are dropped
/// and counted rather than blocking the driver thread.
///
/// [`MessageChannel::subscribe`]: crate::MessageChannel::subscribe
pub fn inbound_queue(capacity: usize) -> (MessageHandler, InboundReceiver) {
    let (tx, rx) = flume::bounded(capacity.max(1));
    let dropped = Arc::new(AtomicU64::new(0));
    let handler = queue_handler(tx, Arc::clone(&dropped));
    (handler, InboundReceiver { rx, dropped })
}

fn queue_handler(tx: Sender<Bytes>, dropped: Arc<AtomicU64>) -> MessageHandler {
    Box::new(move |message: &[u8]| {
        match tx.try_send(Bytes::copy_from_slice(message)) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                dropped.fetch_add(1, Ordering::Relaxed);
                warn!(len = message.len(), "inbound queue full, dropping message");
            }
            Err(TrySendError::Disconnected(_)) => {
                dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    })
}

impl InboundReceiver {
    /// Take the next pending message without blocking.
    pub fn try_recv(&self) -> Option<Bytes> {
        self.rx.try_recv().ok()
    }

    /// Wait up to `timeout` for the next message.
    ///
    /// Returns `None` on timeout or when every sender is gone.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Bytes> {
        match self.rx.recv_timeout(timeout) {
            Ok(message) => Some(message),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Drain every pending message, oldest first.
    pub fn drain(&self) -> impl Iterator<Item = Bytes> + '_ {
        std::iter::from_fn(|| self.try_recv())
    }

    /// Discard every pending message. Returns how many were discarded.
    pub fn clear(&self) -> usize {
        self.drain().count()
    }

    /// Number of messages currently buffered.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Whether no message is buffered.
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Number of messages dropped because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
