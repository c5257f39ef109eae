//! Error types for the registry layer.

use easel_protocol::PersistentId;

/// Errors that can occur during registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// An operation referenced a persistent id with no active entry —
    /// typically a point award racing a departure. Callers treat this as
    /// a no-op, never as a match-ending failure.
    #[error("unknown participant {0}")]
    UnknownParticipant(PersistentId),
}
