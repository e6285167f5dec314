//! WebSocket connector implementation using `tokio-tungstenite`.

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::error::{Error as WsError, ProtocolError};
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

use crate::{CloseReason, Connection, Connector, Incoming, TransportError};

type WsStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

fn io_error(kind: std::io::ErrorKind, e: WsError) -> std::io::Error {
    std::io::Error::new(kind, e)
}

/// Maps a failed write. Writing to a socket that already finished (or
/// started) its close handshake is `ConnectionClosed`, not an I/O failure.
fn write_error(e: WsError) -> TransportError {
    match e {
        WsError::ConnectionClosed
        | WsError::AlreadyClosed
        | WsError::Protocol(ProtocolError::SendAfterClosing) => {
            TransportError::ConnectionClosed(e.to_string())
        }
        other => TransportError::SendFailed(io_error(
            std::io::ErrorKind::BrokenPipe,
            other,
        )),
    }
}

/// A [`Connector`] that dials WebSocket endpoints.
///
/// `ws://` works out of the box; `wss://` needs the `tls` feature.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

impl WebSocketConnector {
    pub fn new() -> Self {
        Self
    }
}

impl Connector for WebSocketConnector {
    type Connection = WebSocketConnection;

    async fn connect(
        &self,
        url: &str,
        subprotocol: Option<&str>,
    ) -> Result<Self::Connection, TransportError> {
        let mut request = url
            .into_client_request()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

        if let Some(subprotocol) = subprotocol {
            let value = HeaderValue::from_str(subprotocol)
                .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
            request.headers_mut().insert("Sec-WebSocket-Protocol", value);
        }

        let (ws, response) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| {
                TransportError::ConnectFailed(io_error(
                    std::io::ErrorKind::ConnectionRefused,
                    e,
                ))
            })?;

        tracing::debug!(
            status = %response.status(),
            ?subprotocol,
            "WebSocket handshake complete"
        );

        Ok(WebSocketConnection { ws })
    }
}

/// A single client-side WebSocket connection.
pub struct WebSocketConnection {
    ws: WsStream,
}

impl Connection for WebSocketConnection {
    async fn send_text(&mut self, text: &str) -> Result<(), TransportError> {
        self.ws
            .send(Message::Text(text.to_owned().into()))
            .await
            .map_err(write_error)
    }

    async fn recv(&mut self) -> Result<Incoming, TransportError> {
        loop {
            match self.ws.next().await {
                Some(Ok(Message::Text(text))) => {
                    return Ok(Incoming::Text(text.as_str().to_owned()));
                }
                Some(Ok(Message::Binary(data))) => {
                    return Ok(Incoming::Text(
                        String::from_utf8_lossy(&data).into_owned(),
                    ));
                }
                Some(Ok(Message::Close(frame))) => {
                    // Push out the close reply tungstenite queued for us.
                    let _ = self.ws.flush().await;
                    let reason = frame.map(|f| CloseReason {
                        code: f.code.into(),
                        reason: f.reason.as_str().to_owned(),
                    });
                    return Ok(Incoming::Closed(reason));
                }
                None => return Ok(Incoming::Closed(None)),
                Some(Ok(_)) => continue, // skip ping/pong/frame
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(io_error(
                        std::io::ErrorKind::ConnectionReset,
                        e,
                    )));
                }
            }
        }
    }

    async fn close(
        &mut self,
        reason: CloseReason,
    ) -> Result<(), TransportError> {
        let frame = CloseFrame {
            code: CloseCode::from(reason.code),
            reason: reason.reason.into(),
        };
        self.ws.close(Some(frame)).await.map_err(write_error)?;

        // Read until the peer echoes the close frame and the stream ends.
        while let Some(Ok(_)) = self.ws.next().await {}
        Ok(())
    }
}
