//! Unified error type for the Easel engine.

use easel_protocol::ProtocolError;
use easel_registry::RegistryError;
use easel_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `easel` meta-crate, you deal with this single error
/// type instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant auto-generates `From` impls, so the `?`
/// operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum EaselError {
    /// A transport-level error (link, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A registry-level error (unknown participant).
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The match controller has stopped; its handle is dead.
    #[error("match is closed")]
    MatchClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let easel_err: EaselError = err.into();
        assert!(matches!(easel_err, EaselError::Transport(_)));
        assert!(easel_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let easel_err: EaselError = err.into();
        assert!(matches!(easel_err, EaselError::Protocol(_)));
    }

    #[test]
    fn test_from_registry_error() {
        let err = RegistryError::UnknownParticipant(
            easel_protocol::PersistentId::from("ghost"),
        );
        let easel_err: EaselError = err.into();
        assert!(matches!(easel_err, EaselError::Registry(_)));
    }
}
