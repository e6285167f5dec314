//! Transport abstraction layer for dropfour.
//!
//! Provides the [`Connector`] and [`Connection`] traits that abstract over
//! how a client reaches the game server. The rest of the client only sees
//! text frames and a close notification; it never touches sockets.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket connector via `tokio-tungstenite`
//! - `tls`: `wss://` support through rustls

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketConnector};

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier for one connection attempt.
///
/// Every call that opens a socket gets a fresh id, so events coming from a
/// socket that has since been replaced can be told apart from current ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Allocates the next process-wide unique id.
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// A close code and reason, as carried by a WebSocket close frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseReason {
    pub code: u16,
    pub reason: String,
}

impl CloseReason {
    /// Close code for a normal, intentional closure.
    pub const NORMAL: u16 = 1000;

    /// A normal closure (code 1000) with an empty reason.
    pub fn normal() -> Self {
        Self {
            code: Self::NORMAL,
            reason: String::new(),
        }
    }

    /// Returns `true` if this is a normal closure.
    pub fn is_normal(&self) -> bool {
        self.code == Self::NORMAL
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.reason.is_empty() {
            write!(f, "{}", self.code)
        } else {
            write!(f, "{} ({})", self.code, self.reason)
        }
    }
}

/// What a [`Connection`] yields when read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    /// One text frame.
    Text(String),
    /// The peer closed the connection, with its close frame if it sent one.
    /// Nothing more will be read after this.
    Closed(Option<CloseReason>),
}

/// Opens outgoing connections.
///
/// Methods return `impl Future + Send` rather than being declared
/// `async fn` so that generic callers can move the futures into a spawned
/// task. Implementations are still free to write `async fn`.
pub trait Connector: Send + Sync + 'static {
    /// The connection type produced by this connector.
    type Connection: Connection;

    /// Opens a connection to `url`, completing once the handshake is done.
    ///
    /// With `subprotocol` set, the handshake asks for it and fails unless
    /// the server selects it.
    fn connect(
        &self,
        url: &str,
        subprotocol: Option<&str>,
    ) -> impl Future<Output = Result<Self::Connection, TransportError>> + Send;
}

/// A single open connection that exchanges text frames.
///
/// Methods take `&mut self`: a connection is owned by exactly one task,
/// which alternates between reading and writing.
pub trait Connection: Send + 'static {
    /// Sends one text frame.
    fn send_text(
        &mut self,
        text: &str,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Waits for the next text frame or for the peer to close.
    ///
    /// Control frames (ping/pong) are handled internally and never
    /// surface here.
    fn recv(
        &mut self,
    ) -> impl Future<Output = Result<Incoming, TransportError>> + Send;

    /// Sends a close frame with `reason` and waits for the peer to
    /// acknowledge it.
    fn close(
        &mut self,
        reason: CloseReason,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}
