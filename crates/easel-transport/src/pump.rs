//! The per-link pump task shared by both adapters.
//!
//! Every registered link gets exactly one Tokio task that owns both
//! directions: it drains an outbox channel into `link.send` and forwards
//! `link.recv` results to a topology-specific inbound handler. When the
//! link dies (clean close, error, or the adapter dropping the outbox),
//! the task deregisters the peer and emits `PeerDisconnected`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use easel_protocol::MessagingId;
use tokio::sync::mpsc;

use crate::{LinkEvent, PeerLink};

/// Handle for queueing outbound bytes to one peer's pump.
pub(crate) type Outbox = mpsc::UnboundedSender<Vec<u8>>;

/// Shared peer table: routing address → outbox.
///
/// A std `Mutex` (not Tokio's) on purpose: every critical section is a
/// map lookup or insert with no `.await` inside.
pub(crate) type PeerMap = Arc<Mutex<HashMap<MessagingId, Outbox>>>;

/// Registers `peer` in the table and spawns its pump task.
///
/// `on_inbound` runs on the pump task for every received message — this
/// is where a relay host discharges its re-broadcast duty before the
/// bytes ever reach the local controller.
pub(crate) fn spawn_pump<L, F>(
    peer: MessagingId,
    link: L,
    peers: PeerMap,
    events: mpsc::UnboundedSender<LinkEvent>,
    on_inbound: F,
) where
    L: PeerLink,
    F: Fn(&MessagingId, Vec<u8>) + Send + 'static,
{
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Vec<u8>>();
    peers
        .lock()
        .expect("peer table lock")
        .insert(peer.clone(), out_tx);

    // The receiver may already be gone during shutdown; nothing to do.
    let _ = events.send(LinkEvent::PeerConnected { peer: peer.clone() });

    tokio::spawn(async move {
        loop {
            tokio::select! {
                queued = out_rx.recv() => match queued {
                    Some(data) => {
                        if let Err(e) = link.send(&data).await {
                            // Fire-and-forget contract: log, don't raise.
                            // If the link is truly dead the recv arm will
                            // notice and tear the pump down.
                            tracing::warn!(
                                peer = %peer, error = %e, "send failed"
                            );
                        }
                    }
                    // Adapter dropped this peer's outbox (shutdown).
                    None => break,
                },
                inbound = link.recv() => match inbound {
                    Ok(Some(bytes)) => on_inbound(&peer, bytes),
                    Ok(None) => {
                        tracing::debug!(peer = %peer, "link closed");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(
                            peer = %peer, error = %e, "link error"
                        );
                        break;
                    }
                },
            }
        }

        peers.lock().expect("peer table lock").remove(&peer);
        let _ = events.send(LinkEvent::PeerDisconnected { peer });
    });
}
