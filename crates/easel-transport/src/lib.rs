//! Transport abstraction layer for Easel.
//!
//! A drawing match runs over one of two topologies:
//!
//! - **Direct mesh** ([`DirectMesh`]) — every peer holds a reliable link
//!   to every other peer; broadcast is a fan-out of direct sends.
//! - **Host relay** ([`HostRelay`]) — a star: one peer (the host) holds
//!   the only links, and clients reach each other by asking the host to
//!   re-send on their behalf.
//!
//! Both implement [`TransportAdapter`], so the match controller never
//! branches on topology. Discovery, advertising, and connection
//! negotiation are someone else's problem: adapters are handed an
//! already-established [`PeerLink`] and only move bytes from there.
//!
//! Sends are fire-and-forget by contract — a failure is logged, never
//! surfaced to the caller. Total link loss arrives as a
//! [`LinkEvent::PeerDisconnected`], not as a send error.
//!
//! # Feature flags
//!
//! - `websocket` (default) — [`WsLink`] over `tokio-tungstenite`

mod error;
mod memory;
mod mesh;
mod pump;
mod relay;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
pub use memory::MemoryLink;
pub use mesh::DirectMesh;
pub use relay::{HostRelay, RelayRole};
#[cfg(feature = "websocket")]
pub use websocket::WsLink;

use std::future::Future;

use easel_protocol::MessagingId;

/// An established, reliable, in-order link to one remote peer.
///
/// Implementations wrap whatever the negotiation layer produced — a
/// WebSocket stream, an in-process channel pair in tests — behind the
/// same async send/recv surface. Both methods take `&self` so one task
/// can pump sends and receives through a single `select!` loop.
///
/// The methods are spelled as `impl Future + Send` rather than `async
/// fn` because every link is driven from a spawned pump task, and
/// `tokio::spawn` needs the futures to be `Send`. Implementors can
/// still write plain `async fn` bodies.
pub trait PeerLink: Send + Sync + 'static {
    /// Sends one message to the remote peer.
    fn send(
        &self,
        data: &[u8],
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Receives the next message from the remote peer.
    ///
    /// Returns `Ok(None)` when the link is cleanly closed.
    fn recv(
        &self,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, TransportError>> + Send;

    /// Closes the link.
    fn close(
        &self,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// Connection-lifecycle and inbound-traffic events raised by an adapter.
///
/// Adapters push these into a single channel that the match controller
/// drains on its own task — that funnel is what keeps all match-state
/// mutation single-writer even though every link has its own pump task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// A peer link was registered with the adapter.
    PeerConnected { peer: MessagingId },

    /// A peer link closed or failed. In host-relay topology, a client
    /// receiving this for the *host* means the match is over for it.
    PeerDisconnected { peer: MessagingId },

    /// Bytes arrived from a peer. On a relay host these have already been
    /// re-sent to every other client before this event was queued.
    Inbound {
        from: MessagingId,
        bytes: Vec<u8>,
    },
}

/// Uniform send/broadcast contract over both topologies.
///
/// Selected once at match setup; the controller only ever talks to a
/// `Box<dyn TransportAdapter>`.
pub trait TransportAdapter: Send + 'static {
    /// Sends bytes to one peer. Best-effort: a failure is logged and
    /// swallowed — reliable delivery on a live link is the transport's
    /// job, and a dead link announces itself via `PeerDisconnected`.
    fn send_to(&self, peer: &MessagingId, bytes: &[u8]);

    /// Delivers bytes to every *other* known peer, optionally excluding
    /// one (used by a relay host to avoid echoing traffic back at its
    /// originator).
    fn broadcast(&self, bytes: &[u8], excluding: Option<&MessagingId>);

    /// The routing address of the relay host, if this adapter is a relay
    /// *client*. `None` for meshes and for the host itself. The match
    /// controller uses this to recognize the unrecoverable departure.
    fn host_id(&self) -> Option<MessagingId>;

    /// Drops every link. Queued-but-undelivered outbound messages are
    /// discarded, not flushed.
    fn shutdown(&self);
}
