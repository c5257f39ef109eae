//! Codec trait and implementations for serializing/deserializing messages.
//!
//! A codec converts between Rust types and raw bytes. The rest of the stack
//! doesn't care which encoding is in use — it just needs something that
//! implements [`Codec`]. The wire format is an implementation choice, not a
//! protocol contract; the only requirement is that every peer in a match
//! runs the same one (in practice: homogeneous builds).
//!
//! [`JsonCodec`] is the default. A binary codec could be added behind
//! another feature flag without touching any other code.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Encodes Rust values to bytes and decodes bytes back.
///
/// `Send + Sync + 'static` because the codec is shared with spawned link
/// tasks and lives as long as the match.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::MalformedEnvelope`] if the bytes are
    /// garbage, the discriminator is missing or unrecognized, or the
    /// payload doesn't match the declared kind.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`.
///
/// JSON keeps the wire human-readable, which pays off constantly while
/// debugging two phones and a laptop disagreeing about whose turn it is.
/// Behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use easel_protocol::{Codec, DrawMessage, JsonCodec};
///
/// let codec = JsonCodec;
/// let msg = DrawMessage::Stroke { x: 3, y: 7, color_index: 1 };
///
/// let bytes = codec.encode(&msg).unwrap();
/// let decoded: DrawMessage = codec.decode(&bytes).unwrap();
/// assert_eq!(msg, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data)
            .map_err(ProtocolError::MalformedEnvelope)
    }
}
