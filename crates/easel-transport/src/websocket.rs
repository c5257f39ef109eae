//! WebSocket [`PeerLink`] over `tokio-tungstenite`.
//!
//! The negotiation layer does the handshaking (`accept_async` on the
//! listening side, `connect_async` on the dialing side) and wraps the
//! resulting stream in a [`WsLink`]; from there the link is just bytes.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

use crate::{PeerLink, TransportError};

/// A [`PeerLink`] over an established WebSocket stream.
///
/// Generic over the underlying I/O so it covers both the accepting side
/// (`WebSocketStream<TcpStream>`) and the dialing side
/// (`WebSocketStream<MaybeTlsStream<TcpStream>>`).
pub struct WsLink<S> {
    ws: Arc<Mutex<WebSocketStream<S>>>,
}

impl<S> WsLink<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Wraps an already-handshaken WebSocket stream.
    pub fn new(ws: WebSocketStream<S>) -> Self {
        Self {
            ws: Arc::new(Mutex::new(ws)),
        }
    }
}

impl<S> PeerLink for WsLink<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        use futures_util::SinkExt;
        let frame = Message::Binary(data.to_vec().into());
        self.ws
            .lock()
            .await
            .send(frame)
            .await
            .map_err(|e| TransportError::SendFailed(io_error(e)))
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        use futures_util::StreamExt;
        loop {
            match self.ws.lock().await.next().await {
                None | Some(Ok(Message::Close(_))) => return Ok(None),
                Some(Ok(Message::Binary(data))) => {
                    return Ok(Some(data.into()));
                }
                // Codecs are byte-oriented; a text frame is just bytes
                // that happen to be UTF-8.
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(text.as_bytes().to_vec()));
                }
                // Control frames carry no match traffic.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(io_error(
                        e,
                    )));
                }
            }
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.ws
            .lock()
            .await
            .close(None)
            .await
            .map_err(|e| TransportError::SendFailed(io_error(e)))
    }
}

fn io_error(e: tokio_tungstenite::tungstenite::Error) -> std::io::Error {
    std::io::Error::other(e)
}
