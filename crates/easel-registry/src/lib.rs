//! Participant registry for Easel.
//!
//! This crate owns who is in the match:
//!
//! 1. **Membership** — active participants, keyed by persistent id
//! 2. **Departure memory** — former participants are kept aside so a
//!    rejoin restores their score instead of starting from zero
//! 3. **Turn order** — the deterministic artist derivation every peer
//!    computes independently from the same membership
//!
//! # How it fits in the stack
//!
//! ```text
//! Match controller (above)  ← mutates membership from ParticipantChange
//!     ↕                       envelopes and connection events
//! Registry (this crate)     ← identity, lifecycle, scores, turn order
//!     ↕
//! Protocol (below)          ← provides Participant, PersistentId
//! ```

mod error;
mod registry;

pub use error::RegistryError;
pub use registry::{Registry, UpsertOutcome};
