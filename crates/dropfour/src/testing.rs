//! In-memory connector and credential helpers for unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use dropfour_session::Credential;
use dropfour_transport::{
    CloseReason, Connection, Connector, Incoming, TransportError,
};
use tokio::sync::mpsc;

/// What the client wrote to a mock socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Sent {
    Text(String),
    Close(CloseReason),
}

/// A connector whose sockets are channels. Each successful `connect`
/// hands the server end to [`Peers::accept`].
pub(crate) struct MockConnector {
    peers: mpsc::UnboundedSender<Peer>,
    dialed: Arc<AtomicUsize>,
    fail_next: Arc<AtomicBool>,
}

impl MockConnector {
    pub(crate) fn new() -> (Self, Peers) {
        let (tx, rx) = mpsc::unbounded_channel();
        let dialed = Arc::new(AtomicUsize::new(0));
        let fail_next = Arc::new(AtomicBool::new(false));
        let connector = Self {
            peers: tx,
            dialed: Arc::clone(&dialed),
            fail_next: Arc::clone(&fail_next),
        };
        let peers = Peers {
            rx,
            dialed,
            fail_next,
        };
        (connector, peers)
    }
}

impl Connector for MockConnector {
    type Connection = MockConnection;

    async fn connect(
        &self,
        url: &str,
        subprotocol: Option<&str>,
    ) -> Result<MockConnection, TransportError> {
        self.dialed.fetch_add(1, Ordering::SeqCst);
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(TransportError::ConnectFailed(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "refused",
            )));
        }

        let (to_client, inbound) = mpsc::unbounded_channel();
        let (outbound, from_client) = mpsc::unbounded_channel();
        let _ = self.peers.send(Peer {
            url: url.to_string(),
            subprotocol: subprotocol.map(str::to_owned),
            to_client,
            from_client,
        });
        Ok(MockConnection { inbound, outbound })
    }
}

pub(crate) struct MockConnection {
    inbound: mpsc::UnboundedReceiver<Incoming>,
    outbound: mpsc::UnboundedSender<Sent>,
}

impl Connection for MockConnection {
    async fn send_text(&mut self, text: &str) -> Result<(), TransportError> {
        self.outbound
            .send(Sent::Text(text.to_string()))
            .map_err(|_| TransportError::ConnectionClosed("peer gone".into()))
    }

    async fn recv(&mut self) -> Result<Incoming, TransportError> {
        Ok(self.inbound.recv().await.unwrap_or(Incoming::Closed(None)))
    }

    async fn close(
        &mut self,
        reason: CloseReason,
    ) -> Result<(), TransportError> {
        let _ = self.outbound.send(Sent::Close(reason));
        Ok(())
    }
}

/// The test's side of a [`MockConnector`].
pub(crate) struct Peers {
    rx: mpsc::UnboundedReceiver<Peer>,
    dialed: Arc<AtomicUsize>,
    fail_next: Arc<AtomicBool>,
}

impl Peers {
    /// Waits for the client to dial.
    pub(crate) async fn accept(&mut self) -> Peer {
        tokio::time::timeout(Duration::from_secs(1), self.rx.recv())
            .await
            .expect("client should dial")
            .expect("connector is alive")
    }

    /// How many times `connect` has been called.
    pub(crate) fn dialed(&self) -> usize {
        self.dialed.load(Ordering::SeqCst)
    }

    pub(crate) fn fail_next_connect(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

/// The server end of one mock socket.
pub(crate) struct Peer {
    pub(crate) url: String,
    pub(crate) subprotocol: Option<String>,
    to_client: mpsc::UnboundedSender<Incoming>,
    from_client: mpsc::UnboundedReceiver<Sent>,
}

impl Peer {
    /// Delivers a text frame to the client.
    pub(crate) fn push(&self, text: &str) {
        let _ = self.to_client.send(Incoming::Text(text.to_string()));
    }

    /// Closes the socket from the server side.
    pub(crate) fn close(&self, reason: CloseReason) {
        let _ = self.to_client.send(Incoming::Closed(Some(reason)));
    }

    /// The next thing the client wrote, or `None` if nothing arrives
    /// within a second.
    pub(crate) async fn sent(&mut self) -> Option<Sent> {
        tokio::time::timeout(Duration::from_secs(1), self.from_client.recv())
            .await
            .ok()
            .flatten()
    }

    /// Returns `true` if the client has written nothing further.
    pub(crate) fn nothing_sent(&mut self) -> bool {
        self.from_client.try_recv().is_err()
    }
}

fn token(username: &str, exp: u64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let claims = serde_json::json!({
        "userId": format!("id-{username}"),
        "username": username,
        "iat": 1_700_000_000u64,
        "exp": exp,
    });
    let body = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{body}.signature")
}

/// A credential for `username` that expires in 2100.
pub(crate) fn credential(username: &str) -> Credential {
    Credential::parse(valid_token(username)).expect("test token parses")
}

pub(crate) fn valid_token(username: &str) -> String {
    token(username, 4_102_444_800)
}

pub(crate) fn expired_credential() -> Credential {
    Credential::parse(token("old", 1)).expect("test token parses")
}
