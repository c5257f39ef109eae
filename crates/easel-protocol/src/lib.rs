//! Wire protocol for Easel.
//!
//! This crate defines the "language" that peers in a drawing match speak:
//!
//! - **Types** ([`DrawMessage`], [`Participant`], [`PersistentId`], etc.) —
//!   the message structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages
//!   are converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw bytes) and the match
//! controller (game state). It doesn't know about links, topologies, or
//! turns — it only knows how to serialize and deserialize messages.
//!
//! ```text
//! Transport (bytes) → Protocol (DrawMessage) → Match controller (state)
//! ```
//!
//! There is no protocol versioning: every peer in a match is expected to
//! run the same build. An incompatible peer surfaces as decode failures,
//! which the controller drops and logs.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{DrawMessage, MessagingId, Participant, PersistentId};
