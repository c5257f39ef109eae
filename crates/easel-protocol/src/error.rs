//! Error types for the protocol layer.
//!
//! Every failure here is recoverable by policy: a peer that sends bytes we
//! can't decode gets its envelope dropped and logged, never a torn-down
//! match.

/// Errors that can occur while encoding or decoding wire messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The bytes could not be decoded into a known message: garbage input,
    /// a missing or unrecognized discriminator, or a payload that doesn't
    /// match the declared kind.
    #[cfg(feature = "json")]
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(serde_json::Error),

    /// The message decoded but violates a protocol rule — e.g. a
    /// `TurnStart` whose correct-word index points outside its word list.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
