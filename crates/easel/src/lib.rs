//! # Easel
//!
//! Participant and turn synchronization engine for a turn-based,
//! multi-peer drawing-and-guessing game.
//!
//! One participant (the artist) privately knows a secret word and paints
//! it on a shared grid; everyone else guesses under a countdown. Easel
//! keeps every peer's match state — whose turn it is, the word, who has
//! guessed, the scores — consistent over two very different wire
//! shapes: a fully-connected mesh and a host-relay star.
//!
//! ## Layout
//!
//! - [`easel_protocol`] — the five-message wire protocol and codec.
//! - [`easel_registry`] — participant identity, lifecycle, and scores.
//! - [`easel_turn`] — the turn state machine and guess countdown.
//! - [`easel_transport`] — the topology-hiding transport adapters.
//! - This crate — the match controller actor tying them together, plus
//!   the canvas and milestone seams the UI layer plugs into.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use easel::prelude::*;
//! use tokio::sync::mpsc;
//!
//! # async fn demo() {
//! let (events_tx, events_rx) = mpsc::unbounded_channel();
//! let mesh = DirectMesh::new(events_tx);
//! // ... hand established links to mesh.add_peer(...) ...
//!
//! let (handle, mut match_events) = spawn_match(MatchSetup {
//!     local: Participant::local("addr-1", "profile-1", "Ada"),
//!     transport: Box::new(mesh),
//!     codec: JsonCodec,
//!     canvas: Box::new(PixelGrid::new()),
//!     milestones: Box::new(NoMilestones),
//!     link_events: events_rx,
//!     word_bank: WordBank::default(),
//! });
//!
//! while let Some(event) = match_events.recv().await {
//!     // drive the UI
//!     let _ = &event;
//! }
//! # let _ = handle;
//! # }
//! ```

mod canvas;
mod controller;
mod error;
mod milestones;

pub use canvas::{Canvas, PixelGrid, GRID_SIDE};
pub use controller::{
    spawn_match, EndReason, MatchEvent, MatchHandle, MatchInfo,
    MatchSetup,
};
pub use error::EaselError;
pub use milestones::{Milestones, NoMilestones};

// Re-export the sub-crates so `easel` works as a single dependency.
pub use easel_protocol as protocol;
pub use easel_registry as registry;
pub use easel_transport as transport;
pub use easel_turn as turn;

/// The most commonly used names in one import.
pub mod prelude {
    pub use crate::{
        spawn_match, Canvas, EaselError, EndReason, MatchEvent,
        MatchHandle, MatchInfo, MatchSetup, Milestones, NoMilestones,
        PixelGrid,
    };
    pub use easel_protocol::{
        Codec, DrawMessage, JsonCodec, MessagingId, Participant,
        PersistentId,
    };
    pub use easel_registry::Registry;
    pub use easel_transport::{
        DirectMesh, HostRelay, LinkEvent, MemoryLink, PeerLink,
        TransportAdapter,
    };
    pub use easel_turn::{TurnRole, WordBank};
}
