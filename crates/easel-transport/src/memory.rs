//! In-process [`PeerLink`] built from a pair of channels.
//!
//! This is the workhorse for tests and demos: `MemoryLink::pair()` gives
//! two ends of a reliable, in-order "wire" with no sockets involved, so a
//! whole mesh or star of peers can run inside one test.

use tokio::sync::mpsc;
use tokio::sync::Mutex;

use crate::{PeerLink, TransportError};

/// One end of an in-process link.
pub struct MemoryLink {
    tx: mpsc::UnboundedSender<Vec<u8>>,
    rx: Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
}

impl MemoryLink {
    /// Creates a connected pair of links. Whatever one end sends, the
    /// other receives, in order.
    pub fn pair() -> (MemoryLink, MemoryLink) {
        let (a_tx, b_rx) = mpsc::unbounded_channel();
        let (b_tx, a_rx) = mpsc::unbounded_channel();
        (
            MemoryLink {
                tx: a_tx,
                rx: Mutex::new(a_rx),
            },
            MemoryLink {
                tx: b_tx,
                rx: Mutex::new(b_rx),
            },
        )
    }
}

impl PeerLink for MemoryLink {
    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        self.tx.send(data.to_vec()).map_err(|_| {
            TransportError::ConnectionClosed("remote end dropped".into())
        })
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        // recv() on a closed-and-drained channel yields None, which is
        // exactly the "cleanly closed" contract.
        Ok(self.rx.lock().await.recv().await)
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.rx.lock().await.close();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pair_delivers_in_order() {
        let (a, b) = MemoryLink::pair();

        a.send(b"one").await.unwrap();
        a.send(b"two").await.unwrap();

        assert_eq!(b.recv().await.unwrap(), Some(b"one".to_vec()));
        assert_eq!(b.recv().await.unwrap(), Some(b"two".to_vec()));
    }

    #[tokio::test]
    async fn test_recv_returns_none_after_remote_drop() {
        let (a, b) = MemoryLink::pair();
        drop(a);
        assert_eq!(b.recv().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_send_after_remote_drop_is_connection_closed() {
        let (a, b) = MemoryLink::pair();
        drop(b);
        let result = a.send(b"hello").await;
        assert!(matches!(
            result,
            Err(TransportError::ConnectionClosed(_))
        ));
    }

    #[tokio::test]
    async fn test_both_directions_are_independent() {
        let (a, b) = MemoryLink::pair();
        a.send(b"from a").await.unwrap();
        b.send(b"from b").await.unwrap();
        assert_eq!(a.recv().await.unwrap(), Some(b"from b".to_vec()));
        assert_eq!(b.recv().await.unwrap(), Some(b"from a".to_vec()));
    }
}
