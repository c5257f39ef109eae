//! Direct-mesh transport: every peer links to every other peer.
//!
//! Broadcast here is honest — a fan-out of one direct send per known
//! remote peer, with no relay step and no special roles.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use easel_protocol::MessagingId;
use tokio::sync::mpsc;

use crate::pump::{spawn_pump, PeerMap};
use crate::{LinkEvent, PeerLink, TransportAdapter};

/// The fully-connected topology backend.
///
/// The negotiation layer hands each established link to [`add_peer`];
/// after that the mesh only moves bytes.
///
/// Cloning shares the peer table, so a negotiation layer can keep a
/// handle for registering late links after the match controller has
/// taken ownership of the adapter.
///
/// [`add_peer`]: DirectMesh::add_peer
#[derive(Clone)]
pub struct DirectMesh {
    peers: PeerMap,
    events: mpsc::UnboundedSender<LinkEvent>,
}

impl DirectMesh {
    /// Creates a mesh that reports link events into `events`.
    pub fn new(events: mpsc::UnboundedSender<LinkEvent>) -> Self {
        Self {
            peers: Arc::new(Mutex::new(HashMap::new())),
            events,
        }
    }

    /// Registers an established link to `peer` and starts pumping it.
    pub fn add_peer<L: PeerLink>(&self, peer: MessagingId, link: L) {
        tracing::debug!(%peer, "mesh peer registered");
        spawn_pump(
            peer,
            link,
            Arc::clone(&self.peers),
            self.events.clone(),
            {
                let events = self.events.clone();
                move |from: &MessagingId, bytes: Vec<u8>| {
                    let _ = events.send(LinkEvent::Inbound {
                        from: from.clone(),
                        bytes,
                    });
                }
            },
        );
    }

    /// Number of currently-linked peers.
    pub fn peer_count(&self) -> usize {
        self.peers.lock().expect("peer table lock").len()
    }
}

impl TransportAdapter for DirectMesh {
    fn send_to(&self, peer: &MessagingId, bytes: &[u8]) {
        let peers = self.peers.lock().expect("peer table lock");
        match peers.get(peer) {
            Some(outbox) => {
                if outbox.send(bytes.to_vec()).is_err() {
                    tracing::warn!(%peer, "send to departed peer dropped");
                }
            }
            None => tracing::warn!(%peer, "send to unknown peer dropped"),
        }
    }

    fn broadcast(&self, bytes: &[u8], excluding: Option<&MessagingId>) {
        let peers = self.peers.lock().expect("peer table lock");
        for (peer, outbox) in peers.iter() {
            if Some(peer) == excluding {
                continue;
            }
            if outbox.send(bytes.to_vec()).is_err() {
                tracing::warn!(%peer, "broadcast to departed peer dropped");
            }
        }
    }

    fn host_id(&self) -> Option<MessagingId> {
        None
    }

    fn shutdown(&self) {
        // Dropping the outboxes makes every pump task wind down and
        // discard whatever it hadn't delivered yet.
        self.peers.lock().expect("peer table lock").clear();
    }
}
