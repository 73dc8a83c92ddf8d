/// Errors that can occur on a byte-message channel.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The channel has been closed and accepts no more traffic.
    #[error("channel closed")]
    Closed,

    /// A handler is already subscribed to this channel.
    #[error("channel already has an inbound subscriber")]
    AlreadySubscribed,

    /// The message exceeds what the channel can carry in one unit.
    #[error("message too large ({size} bytes, max {max})")]
    MessageTooLarge { size: usize, max: usize },

    /// The underlying device rejected the message.
    #[error("send failed: {0}")]
    Send(String),

    /// An I/O error occurred on the underlying stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
