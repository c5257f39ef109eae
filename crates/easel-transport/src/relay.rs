//! Host-relay transport: a star with one coordinating hub.
//!
//! The host maintains the only links in the match — one per client.
//! Clients never see each other directly; when a client wants to reach
//! its siblings it sends to the host, trusting the host to re-send. The
//! host gives the network the *appearance* of being densely connected.
//!
//! The one ordering rule that matters: when the host receives bytes from
//! a client, it re-broadcasts them verbatim to every other client
//! *before* queueing them for its own application logic. A client's
//! guess must reach its guess-counting siblings even if the host's own
//! handling of that guess later goes wrong.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use easel_protocol::MessagingId;
use tokio::sync::mpsc;

use crate::pump::{spawn_pump, PeerMap};
use crate::{LinkEvent, PeerLink, TransportAdapter};

/// Which side of the star this adapter is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayRole {
    /// The hub: linked to every client, relays on their behalf.
    Host,
    /// A spoke: linked only to the host at the given address.
    Client { host: MessagingId },
}

/// The star topology backend.
///
/// Construct with [`HostRelay::host`] or [`HostRelay::client`]; both
/// present the same [`TransportAdapter`] surface, with `broadcast`
/// meaning "fan out to my clients" on the host and "hand to the host to
/// fan out" on a client.
///
/// Cloning shares the peer table, so the host's negotiation layer can
/// keep attaching clients after the adapter moved into the controller.
#[derive(Clone)]
pub struct HostRelay {
    role: RelayRole,
    peers: PeerMap,
    events: mpsc::UnboundedSender<LinkEvent>,
}

impl HostRelay {
    /// Creates the host side of a star. Clients are attached as their
    /// links are established, via [`attach_client`](Self::attach_client).
    pub fn host(events: mpsc::UnboundedSender<LinkEvent>) -> Self {
        Self {
            role: RelayRole::Host,
            peers: Arc::new(Mutex::new(HashMap::new())),
            events,
        }
    }

    /// Creates the client side of a star over an established link to the
    /// host.
    pub fn client<L: PeerLink>(
        host: MessagingId,
        link: L,
        events: mpsc::UnboundedSender<LinkEvent>,
    ) -> Self {
        let adapter = Self {
            role: RelayRole::Client { host: host.clone() },
            peers: Arc::new(Mutex::new(HashMap::new())),
            events,
        };
        spawn_pump(
            host,
            link,
            Arc::clone(&adapter.peers),
            adapter.events.clone(),
            {
                let events = adapter.events.clone();
                move |from: &MessagingId, bytes: Vec<u8>| {
                    let _ = events.send(LinkEvent::Inbound {
                        from: from.clone(),
                        bytes,
                    });
                }
            },
        );
        adapter
    }

    /// Host side: registers an established link to a newly-connected
    /// client and starts pumping it.
    ///
    /// Inbound traffic from this client is relayed to every *other*
    /// client before it is surfaced locally — see the module docs.
    pub fn attach_client<L: PeerLink>(
        &self,
        client: MessagingId,
        link: L,
    ) {
        if let RelayRole::Client { .. } = self.role {
            tracing::error!(
                %client,
                "attach_client on a relay client — ignored"
            );
            return;
        }
        tracing::debug!(%client, "relay client attached");
        spawn_pump(
            client,
            link,
            Arc::clone(&self.peers),
            self.events.clone(),
            {
                let events = self.events.clone();
                let peers = Arc::clone(&self.peers);
                move |from: &MessagingId, bytes: Vec<u8>| {
                    // Relay first: queue a verbatim copy for every other
                    // client, then surface the bytes locally.
                    relay_to_others(&peers, from, &bytes);
                    let _ = events.send(LinkEvent::Inbound {
                        from: from.clone(),
                        bytes,
                    });
                }
            },
        );
    }

    /// This adapter's role in the star.
    pub fn role(&self) -> &RelayRole {
        &self.role
    }
}

/// Queues `bytes` for every registered peer except `excluding`.
fn relay_to_others(
    peers: &PeerMap,
    excluding: &MessagingId,
    bytes: &[u8],
) {
    let peers = peers.lock().expect("peer table lock");
    for (peer, outbox) in peers.iter() {
        if peer == excluding {
            continue;
        }
        if outbox.send(bytes.to_vec()).is_err() {
            tracing::warn!(%peer, "relay to departed client dropped");
        }
    }
}

impl TransportAdapter for HostRelay {
    fn send_to(&self, peer: &MessagingId, bytes: &[u8]) {
        let target = match &self.role {
            RelayRole::Host => peer.clone(),
            // A client has exactly one wire. Anything addressed to a
            // sibling goes to the host, which knows how to route it.
            RelayRole::Client { host } => {
                if peer != host {
                    tracing::debug!(
                        %peer, "client send routed via relay host"
                    );
                }
                host.clone()
            }
        };
        let peers = self.peers.lock().expect("peer table lock");
        match peers.get(&target) {
            Some(outbox) => {
                if outbox.send(bytes.to_vec()).is_err() {
                    tracing::warn!(
                        peer = %target, "send to departed peer dropped"
                    );
                }
            }
            None => tracing::warn!(
                peer = %target, "send to unknown peer dropped"
            ),
        }
    }

    fn broadcast(&self, bytes: &[u8], excluding: Option<&MessagingId>) {
        match &self.role {
            // The host's model of "all peers" is its client table.
            RelayRole::Host => {
                let peers = self.peers.lock().expect("peer table lock");
                for (peer, outbox) in peers.iter() {
                    if Some(peer) == excluding {
                        continue;
                    }
                    if outbox.send(bytes.to_vec()).is_err() {
                        tracing::warn!(
                            %peer,
                            "broadcast to departed client dropped"
                        );
                    }
                }
            }
            // A client can't see its siblings; the host fans out on its
            // behalf (excluding the client itself, as the originator).
            RelayRole::Client { host } => self.send_to(host, bytes),
        }
    }

    fn host_id(&self) -> Option<MessagingId> {
        match &self.role {
            RelayRole::Host => None,
            RelayRole::Client { host } => Some(host.clone()),
        }
    }

    fn shutdown(&self) {
        self.peers.lock().expect("peer table lock").clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryLink;
    use std::time::Duration;

    fn mid(s: &str) -> MessagingId {
        MessagingId::from(s)
    }

    async fn recv_one(link: &MemoryLink) -> Option<Vec<u8>> {
        tokio::time::timeout(Duration::from_secs(1), link.recv())
            .await
            .ok()
            .and_then(Result::ok)
            .flatten()
    }

    #[tokio::test]
    async fn test_host_broadcast_reaches_all_clients() {
        let (events_tx, _events_rx) = mpsc::unbounded_channel();
        let host = HostRelay::host(events_tx);
        let (host_a, client_a) = MemoryLink::pair();
        let (host_b, client_b) = MemoryLink::pair();
        host.attach_client(mid("a"), host_a);
        host.attach_client(mid("b"), host_b);

        host.broadcast(b"turn", None);

        assert_eq!(recv_one(&client_a).await, Some(b"turn".to_vec()));
        assert_eq!(recv_one(&client_b).await, Some(b"turn".to_vec()));
    }

    #[tokio::test]
    async fn test_inbound_from_client_relayed_to_siblings_not_sender() {
        // With clients {a, b, c}, traffic received
        // from a is delivered to exactly {b, c}.
        let (events_tx, _events_rx) = mpsc::unbounded_channel();
        let host = HostRelay::host(events_tx);
        let (host_a, client_a) = MemoryLink::pair();
        let (host_b, client_b) = MemoryLink::pair();
        let (host_c, client_c) = MemoryLink::pair();
        host.attach_client(mid("a"), host_a);
        host.attach_client(mid("b"), host_b);
        host.attach_client(mid("c"), host_c);

        client_a.send(b"guess from a").await.unwrap();

        assert_eq!(
            recv_one(&client_b).await,
            Some(b"guess from a".to_vec())
        );
        assert_eq!(
            recv_one(&client_c).await,
            Some(b"guess from a".to_vec())
        );
        let echoed = tokio::time::timeout(
            Duration::from_millis(100),
            client_a.recv(),
        )
        .await;
        assert!(echoed.is_err(), "sender must not get its own bytes back");
    }

    #[tokio::test]
    async fn test_relay_happens_even_if_host_never_drains_events() {
        // Relay-before-dispatch: the host's own application logic might
        // be wedged, but siblings still get the bytes. We simulate the
        // wedge by simply never polling the events channel.
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let host = HostRelay::host(events_tx);
        let (host_a, client_a) = MemoryLink::pair();
        let (host_b, client_b) = MemoryLink::pair();
        host.attach_client(mid("a"), host_a);
        host.attach_client(mid("b"), host_b);

        client_a.send(b"urgent guess").await.unwrap();

        assert_eq!(
            recv_one(&client_b).await,
            Some(b"urgent guess".to_vec())
        );
        drop(events_rx);
    }

    #[tokio::test]
    async fn test_client_broadcast_goes_to_host() {
        let (events_tx, _events_rx) = mpsc::unbounded_channel();
        let (client_end, host_end) = MemoryLink::pair();
        let client = HostRelay::client(
            mid("host"),
            client_end,
            events_tx,
        );

        client.broadcast(b"my guess", None);

        assert_eq!(recv_one(&host_end).await, Some(b"my guess".to_vec()));
    }

    #[tokio::test]
    async fn test_client_send_to_sibling_routes_via_host() {
        let (events_tx, _events_rx) = mpsc::unbounded_channel();
        let (client_end, host_end) = MemoryLink::pair();
        let client = HostRelay::client(
            mid("host"),
            client_end,
            events_tx,
        );

        client.send_to(&mid("sibling"), b"psst");

        // The client's only wire is the host.
        assert_eq!(recv_one(&host_end).await, Some(b"psst".to_vec()));
    }

    #[tokio::test]
    async fn test_client_learns_of_host_departure() {
        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let (client_end, host_end) = MemoryLink::pair();
        let _client = HostRelay::client(
            mid("host"),
            client_end,
            events_tx,
        );
        assert_eq!(
            events_rx.recv().await,
            Some(LinkEvent::PeerConnected { peer: mid("host") })
        );

        drop(host_end);

        assert_eq!(
            events_rx.recv().await,
            Some(LinkEvent::PeerDisconnected { peer: mid("host") })
        );
    }

    #[tokio::test]
    async fn test_host_id_by_role() {
        let (events_tx, _rx) = mpsc::unbounded_channel();
        let host = HostRelay::host(events_tx.clone());
        assert!(host.host_id().is_none());

        let (client_end, _host_end) = MemoryLink::pair();
        let client =
            HostRelay::client(mid("host"), client_end, events_tx);
        assert_eq!(client.host_id(), Some(mid("host")));
    }
}
