/// Errors that can occur in the transport layer.
///
/// None of these ever reach the match controller as a `Result` — the
/// adapter contract is fire-and-forget, so they end their lives in log
/// lines inside the link pump tasks.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The link was closed.
    #[error("link closed: {0}")]
    ConnectionClosed(String),

    /// Sending data failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),
}
