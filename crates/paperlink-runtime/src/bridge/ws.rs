//! Websocket transport for the worker log stream.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use paperlink_core::{LogConnection, LogTransport, MalformedMessage, TransportError};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::error::Error as WsError;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::trace;

/// Opens plain websocket connections with `tokio-tungstenite`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsTransport;

#[async_trait]
impl LogTransport for WsTransport {
    async fn open(&self, url: &str) -> Result<Box<dyn LogConnection>, TransportError> {
        let (stream, _response) = connect_async(url).await.map_err(|e| TransportError::Connect {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Box::new(WsConnection { stream }))
    }
}

struct WsConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl LogConnection for WsConnection {
    async fn recv(&mut self) -> Option<Result<String, TransportError>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text.to_string())),
                Ok(Message::Binary(bytes)) => return Some(decode_binary(bytes.to_vec())),
                Ok(Message::Close(frame)) => {
                    trace!(?frame, "Log stream close frame");
                    return None;
                }
                // Control frames are answered by tungstenite itself
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => {}
                Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => return None,
                Err(e) => return Some(Err(TransportError::Read(e.to_string()))),
            }
        }
    }

    async fn send_text(&mut self, text: &str) -> Result<(), TransportError> {
        self.stream
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| TransportError::Write(e.to_string()))
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            trace!(error = %e, "Log stream close failed");
        }
    }
}

/// Binary frames carry the same JSON as text frames when they are UTF-8.
fn decode_binary(bytes: Vec<u8>) -> Result<String, TransportError> {
    String::from_utf8(bytes).map_err(|e| {
        let reason = format!("binary frame is not UTF-8 ({})", e.utf8_error());
        let lossy = String::from_utf8_lossy(e.as_bytes()).into_owned();
        TransportError::Undecodable(MalformedMessage::new(&lossy, reason))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_binary_frame_decodes() {
        let text = decode_binary(br#"{"module":"env","message":"ok"}"#.to_vec()).unwrap();
        assert_eq!(text, r#"{"module":"env","message":"ok"}"#);
    }

    #[test]
    fn test_invalid_binary_frame_keeps_preview_and_reason() {
        let Err(TransportError::Undecodable(err)) = decode_binary(b"{\"module\":\xff}".to_vec())
        else {
            panic!("expected undecodable frame");
        };
        assert!(err.payload_preview.starts_with("{\"module\":"));
        assert!(err.reason.contains("not UTF-8"), "{}", err.reason);
    }
}
