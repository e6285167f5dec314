//! Connection lifecycle: one logical connection per session.
//!
//! The [`ConnectionManager`] owns the transport for a session. The socket
//! itself lives in a background Tokio task (one per connection attempt)
//! that multiplexes two sources with `tokio::select!`:
//!
//! - **commands** from the manager (send this frame, close now), and
//! - **frames** from the server, which it decodes and forwards as
//!   [`ConnectionEvent`]s.
//!
//! ```text
//!   ConnectionManager ──Command──▶ connection task ──text──▶ server
//!          ▲                          │
//!          └──────ConnectionEvent─────┘◀──text── server
//! ```
//!
//! Events are consumed one at a time through
//! [`next_event`](ConnectionManager::next_event), which is also where the
//! manager updates its [`ConnectionState`]. Having a single consumer means
//! inbound messages are never handled concurrently.

use std::sync::Arc;

use dropfour_protocol::{
    Codec, DecodeError, JsonCodec, OutboundMessage, WebsocketMessage,
};
use dropfour_session::{Credential, SessionError};
use dropfour_transport::{
    CloseReason, Connection, ConnectionId, Connector, Incoming,
    TransportError,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::{ClientConfig, ClientError};

// ---------------------------------------------------------------------------
// State and events
// ---------------------------------------------------------------------------

/// Lifecycle of the managed connection.
///
/// ```text
/// Disconnected → Connecting → Open → Closed
///                    │                 │
///                    └──────▶ Closed   └──▶ Connecting (explicit retry)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Nothing has been opened yet.
    #[default]
    Disconnected,
    /// A connection attempt is in flight.
    Connecting,
    /// The handshake completed; frames can be sent.
    Open,
    /// The last connection ended (closed, failed, or torn down).
    Closed,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Open => write!(f, "Open"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}

/// Something that happened on a connection.
#[derive(Debug)]
pub struct ConnectionEvent {
    /// The connection attempt this event came from.
    pub connection: ConnectionId,
    pub kind: ConnectionEventKind,
}

#[derive(Debug)]
pub enum ConnectionEventKind {
    /// The handshake completed.
    Opened,
    /// A frame decoded into a message.
    Message(WebsocketMessage),
    /// A frame could not be decoded and was dropped. The connection stays
    /// open.
    FrameDropped(DecodeError),
    /// The transport failed. Always followed by `Closed`.
    Error(TransportError),
    /// The connection ended, with the peer's close frame if there was one.
    Closed(Option<CloseReason>),
}

/// Instructions from the manager to its connection task.
#[derive(Debug)]
enum Command {
    Send(String),
    Close(CloseReason),
}

/// The live connection task, as seen from the manager.
struct Active {
    id: ConnectionId,
    commands: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

// ---------------------------------------------------------------------------
// ConnectionManager
// ---------------------------------------------------------------------------

/// Mediates the one connection a session is allowed.
///
/// A connection is opened only when the session is both *authenticated*
/// (an unexpired credential is at hand) and *seeking* (the user asked for
/// a game). Once it ends, for whatever reason, seeking is cleared: there is
/// no automatic reconnect, the user has to ask again.
///
/// Dropping the manager closes the live connection with a normal closure
/// (code 1000), so teardown happens on every exit path.
pub struct ConnectionManager<T: Connector, C: Codec + Clone = JsonCodec> {
    config: ClientConfig,
    connector: Arc<T>,
    codec: C,
    state: ConnectionState,
    seeking: bool,
    active: Option<Active>,
    /// The `Closed` event for a connection torn down by [`close`](Self::close),
    /// not yet handed out.
    closed: Option<ConnectionEvent>,
    events_tx: mpsc::UnboundedSender<ConnectionEvent>,
    events_rx: mpsc::UnboundedReceiver<ConnectionEvent>,
}

impl<T: Connector> ConnectionManager<T> {
    /// Creates a manager that speaks the JSON envelope.
    pub fn new(config: ClientConfig, connector: T) -> Self {
        Self::with_codec(config, connector, JsonCodec)
    }
}

impl<T, C> ConnectionManager<T, C>
where
    T: Connector,
    C: Codec + Clone,
{
    /// Creates a manager with a custom codec.
    pub fn with_codec(config: ClientConfig, connector: T, codec: C) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            config,
            connector: Arc::new(connector),
            codec,
            state: ConnectionState::Disconnected,
            seeking: false,
            active: None,
            closed: None,
            events_tx,
            events_rx,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Returns `true` while the user wants a game and the connection for
    /// it has not ended.
    pub fn is_seeking(&self) -> bool {
        self.seeking
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The id of the current (or most recent) connection attempt.
    pub fn connection_id(&self) -> Option<ConnectionId> {
        self.active.as_ref().map(|active| active.id)
    }

    /// Marks the session as seeking a game and opens a connection if none
    /// is live.
    ///
    /// While `Connecting` or `Open` this only sets the flag; a second
    /// transport is never opened.
    ///
    /// # Errors
    /// - [`SessionError::NotAuthenticated`] if there is no credential
    /// - [`SessionError::Expired`] if it has expired
    /// - anything [`open`](Self::open) returns
    ///
    /// Seeking is left cleared on error.
    pub fn seek(
        &mut self,
        credential: Option<&Credential>,
    ) -> Result<(), ClientError> {
        if matches!(
            self.state,
            ConnectionState::Connecting | ConnectionState::Open
        ) {
            self.seeking = true;
            tracing::debug!(state = %self.state, "already connected, seeking");
            return Ok(());
        }

        let credential = credential.ok_or(SessionError::NotAuthenticated)?;
        if credential.is_expired() {
            return Err(SessionError::Expired {
                username: credential.username().to_string(),
            }
            .into());
        }

        self.open(credential.token())?;
        self.seeking = true;
        Ok(())
    }

    /// Opens a connection to the play endpoint using `token` as the
    /// credential.
    ///
    /// Returns immediately with the new connection's id; the outcome
    /// arrives later as an `Opened` or `Error` event.
    ///
    /// # Errors
    /// - [`ClientError::AlreadyConnected`] while `Connecting` or `Open`
    /// - [`ClientError::InvalidEndpoint`] if the configured host is invalid
    pub fn open(&mut self, token: &str) -> Result<ConnectionId, ClientError> {
        if matches!(
            self.state,
            ConnectionState::Connecting | ConnectionState::Open
        ) {
            return Err(ClientError::AlreadyConnected);
        }

        let url = self.config.endpoint(token)?;
        let id = ConnectionId::next();
        let (commands, command_rx) = mpsc::unbounded_channel();

        // A previous task that already reported Closed is finishing on its
        // own; replacing `active` drops its command sender.
        let task = tokio::spawn(run_connection(
            Arc::clone(&self.connector),
            self.codec.clone(),
            url.to_string(),
            self.config.subprotocol.clone(),
            id,
            command_rx,
            self.events_tx.clone(),
        ));
        self.active = Some(Active { id, commands, task });
        self.state = ConnectionState::Connecting;

        tracing::info!(
            conn_id = %id,
            host = url.host_str().unwrap_or_default(),
            "connecting"
        );
        Ok(id)
    }

    /// Encodes `message` and queues it for the server.
    ///
    /// Sends are fire-and-forget and go out in call order. There is no
    /// acknowledgement.
    ///
    /// # Errors
    /// [`ClientError::NotConnected`] unless the state is `Open`. Nothing
    /// is written in that case.
    pub fn send(&self, message: &OutboundMessage) -> Result<(), ClientError> {
        if self.state != ConnectionState::Open {
            return Err(ClientError::NotConnected);
        }
        let Some(active) = &self.active else {
            return Err(ClientError::NotConnected);
        };

        let text = self.codec.encode(message.as_message())?;
        active
            .commands
            .send(Command::Send(text))
            .map_err(|_| ClientError::NotConnected)?;

        tracing::debug!(conn_id = %active.id, kind = %message.kind(), "queued frame");
        Ok(())
    }

    /// Waits for the next event from the current connection.
    ///
    /// Events from a connection that has since been closed or replaced are
    /// discarded, except the one `Closed` for a connection ended by
    /// [`close`](Self::close). Cancel-safe: if the future is dropped before
    /// it completes, no event is lost.
    pub async fn next_event(&mut self) -> ConnectionEvent {
        if let Some(event) = self.closed.take() {
            return event;
        }
        loop {
            let event = match self.events_rx.recv().await {
                Some(event) => event,
                // We hold a sender, so the channel never closes.
                None => std::future::pending().await,
            };

            if self.connection_id() != Some(event.connection) {
                tracing::debug!(conn_id = %event.connection, "discarding stale event");
                continue;
            }

            match &event.kind {
                ConnectionEventKind::Opened => {
                    self.state = ConnectionState::Open;
                    tracing::info!(conn_id = %event.connection, "connection open");
                }
                ConnectionEventKind::Error(e) => {
                    self.state = ConnectionState::Closed;
                    self.seeking = false;
                    tracing::warn!(conn_id = %event.connection, error = %e, "connection failed");
                }
                ConnectionEventKind::Closed(reason) => {
                    self.state = ConnectionState::Closed;
                    self.seeking = false;
                    tracing::info!(conn_id = %event.connection, ?reason, "connection closed");
                }
                ConnectionEventKind::Message(_)
                | ConnectionEventKind::FrameDropped(_) => {}
            }
            return event;
        }
    }

    /// Closes the connection with a normal closure (code 1000).
    ///
    /// Waits up to `close_timeout` for the close handshake, then abandons
    /// the socket. Events still queued from the closed connection are
    /// replaced by a single `Closed`, which the next
    /// [`next_event`](Self::next_event) returns. Does nothing if no
    /// connection was opened.
    pub async fn close(&mut self) {
        let Some(Active {
            id,
            commands,
            mut task,
        }) = self.active.take()
        else {
            return;
        };
        let was_live = matches!(
            self.state,
            ConnectionState::Connecting | ConnectionState::Open
        );

        let _ = commands.send(Command::Close(CloseReason::normal()));
        if tokio::time::timeout(self.config.close_timeout, &mut task)
            .await
            .is_err()
        {
            tracing::warn!(conn_id = %id, "close handshake timed out");
            task.abort();
        }

        // Drop what the task queued. A `Closed` among it keeps its reason
        // (the peer may have closed first); otherwise ours is reported.
        let mut reason = Some(CloseReason::normal());
        while let Ok(event) = self.events_rx.try_recv() {
            if event.connection != id {
                continue;
            }
            if let ConnectionEventKind::Closed(queued) = event.kind {
                reason = queued;
            }
        }
        if was_live {
            self.closed = Some(ConnectionEvent {
                connection: id,
                kind: ConnectionEventKind::Closed(reason),
            });
        }

        self.state = ConnectionState::Closed;
        self.seeking = false;
        tracing::info!(conn_id = %id, "connection closed by client");
    }
}

impl<T: Connector, C: Codec + Clone> Drop for ConnectionManager<T, C> {
    fn drop(&mut self) {
        // The task keeps running after we are gone and performs the close
        // handshake itself.
        if let Some(active) = self.active.take() {
            let _ = active.commands.send(Command::Close(CloseReason::normal()));
        }
    }
}

// ---------------------------------------------------------------------------
// Connection task
// ---------------------------------------------------------------------------

fn emit(
    events: &mpsc::UnboundedSender<ConnectionEvent>,
    connection: ConnectionId,
    kind: ConnectionEventKind,
) {
    // The manager may already be gone; nobody is left to tell.
    let _ = events.send(ConnectionEvent { connection, kind });
}

/// Owns one socket from dial to close.
async fn run_connection<T, C>(
    connector: Arc<T>,
    codec: C,
    url: String,
    subprotocol: Option<String>,
    id: ConnectionId,
    mut commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::UnboundedSender<ConnectionEvent>,
) where
    T: Connector,
    C: Codec,
{
    // --- Dial, unless the manager gives up first ---
    let connecting = connector.connect(&url, subprotocol.as_deref());
    let mut conn = tokio::select! {
        result = connecting => match result {
            Ok(conn) => conn,
            Err(e) => {
                emit(&events, id, ConnectionEventKind::Error(e));
                emit(&events, id, ConnectionEventKind::Closed(None));
                return;
            }
        },
        _ = commands.recv() => {
            // Any command before Opened is a close or a dropped manager.
            tracing::debug!(conn_id = %id, "abandoned before open");
            return;
        }
    };
    emit(&events, id, ConnectionEventKind::Opened);

    // --- Pump frames both ways ---
    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Send(text)) => {
                    if let Err(e) = conn.send_text(&text).await {
                        emit(&events, id, ConnectionEventKind::Error(e));
                        emit(&events, id, ConnectionEventKind::Closed(None));
                        return;
                    }
                }
                Some(Command::Close(reason)) => {
                    if let Err(e) = conn.close(reason.clone()).await {
                        tracing::debug!(conn_id = %id, error = %e, "close failed");
                    }
                    emit(&events, id, ConnectionEventKind::Closed(Some(reason)));
                    return;
                }
                None => {
                    // Manager dropped without closing: close on its behalf.
                    let _ = conn.close(CloseReason::normal()).await;
                    return;
                }
            },
            incoming = conn.recv() => match incoming {
                Ok(Incoming::Text(text)) => match codec.decode(&text) {
                    Ok(message) => {
                        tracing::debug!(conn_id = %id, kind = %message.kind(), "frame received");
                        emit(&events, id, ConnectionEventKind::Message(message));
                    }
                    Err(e) => {
                        tracing::warn!(conn_id = %id, error = %e, "dropping frame");
                        emit(&events, id, ConnectionEventKind::FrameDropped(e));
                    }
                },
                Ok(Incoming::Closed(reason)) => {
                    emit(&events, id, ConnectionEventKind::Closed(reason));
                    return;
                }
                Err(e) => {
                    emit(&events, id, ConnectionEventKind::Error(e));
                    emit(&events, id, ConnectionEventKind::Closed(None));
                    return;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use dropfour_protocol::Color;

    use super::*;
    use crate::testing::{MockConnector, Sent, credential, expired_credential};

    fn manager() -> (ConnectionManager<MockConnector>, crate::testing::Peers) {
        let (connector, peers) = MockConnector::new();
        (ConnectionManager::new(ClientConfig::default(), connector), peers)
    }

    async fn next(
        manager: &mut ConnectionManager<MockConnector>,
    ) -> ConnectionEvent {
        tokio::time::timeout(Duration::from_secs(1), manager.next_event())
            .await
            .expect("an event should arrive")
    }

    #[tokio::test]
    async fn test_seek_opens_once_credential_is_present() {
        let (mut manager, mut peers) = manager();
        let credential = credential("ann");

        manager.seek(Some(&credential)).unwrap();
        assert_eq!(manager.state(), ConnectionState::Connecting);
        assert!(manager.is_seeking());

        let peer = peers.accept().await;
        assert!(
            peer.url.starts_with("ws://localhost:8080/api/v1/games/play?token=")
        );
        assert!(peer.url.ends_with(credential.token()));

        let event = next(&mut manager).await;
        assert!(matches!(event.kind, ConnectionEventKind::Opened));
        assert_eq!(manager.state(), ConnectionState::Open);
    }

    #[tokio::test]
    async fn test_seek_without_credential_opens_nothing() {
        let (mut manager, peers) = manager();

        let err = manager.seek(None).unwrap_err();
        assert!(matches!(
            err,
            ClientError::Session(SessionError::NotAuthenticated)
        ));
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert!(!manager.is_seeking());
        assert_eq!(peers.dialed(), 0);
    }

    #[tokio::test]
    async fn test_expired_credential_never_opens_transport() {
        let (mut manager, peers) = manager();

        let err = manager.seek(Some(&expired_credential())).unwrap_err();
        assert!(matches!(
            err,
            ClientError::Session(SessionError::Expired { .. })
        ));
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        tokio::task::yield_now().await;
        assert_eq!(peers.dialed(), 0);
    }

    #[tokio::test]
    async fn test_seeking_again_while_live_opens_no_second_transport() {
        let (mut manager, mut peers) = manager();
        let credential = credential("ann");

        manager.seek(Some(&credential)).unwrap();
        manager.seek(Some(&credential)).unwrap();
        let _peer = peers.accept().await;
        next(&mut manager).await;

        manager.seek(Some(&credential)).unwrap();
        assert!(matches!(
            manager.open(credential.token()),
            Err(ClientError::AlreadyConnected)
        ));
        assert_eq!(peers.dialed(), 1);
    }

    #[tokio::test]
    async fn test_send_before_open_is_refused() {
        let (mut manager, mut peers) = manager();
        let message = OutboundMessage::play_move(3);

        assert!(matches!(
            manager.send(&message),
            Err(ClientError::NotConnected)
        ));

        manager.seek(Some(&credential("ann"))).unwrap();
        assert!(matches!(
            manager.send(&message),
            Err(ClientError::NotConnected)
        ));

        let mut peer = peers.accept().await;
        next(&mut manager).await;
        manager.send(&message).unwrap();
        assert_eq!(
            peer.sent().await,
            Some(Sent::Text(
                r#"{"version":"v1","type":"playMove","payload":{"column":3}}"#.into()
            ))
        );
    }

    #[tokio::test]
    async fn test_sends_go_out_in_call_order() {
        let (mut manager, mut peers) = manager();
        manager.seek(Some(&credential("ann"))).unwrap();
        let mut peer = peers.accept().await;
        next(&mut manager).await;

        for column in 0..5 {
            manager.send(&OutboundMessage::play_move(column)).unwrap();
        }
        for column in 0..5 {
            let Some(Sent::Text(text)) = peer.sent().await else {
                panic!("expected a text frame");
            };
            assert!(text.contains(&format!(r#""column":{column}"#)));
        }
    }

    #[tokio::test]
    async fn test_inbound_frames_are_decoded() {
        let (mut manager, mut peers) = manager();
        manager.seek(Some(&credential("ann"))).unwrap();
        let peer = peers.accept().await;
        next(&mut manager).await;

        peer.push(r#"{"version":"v1","type":"gameOver","payload":{"winner":2}}"#);
        let event = next(&mut manager).await;
        match event.kind {
            ConnectionEventKind::Message(WebsocketMessage::GameOver(p)) => {
                assert_eq!(p.winner, Color::Yellow);
            }
            other => panic!("expected gameOver, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_undecodable_frame_is_dropped_and_connection_stays_open() {
        let (mut manager, mut peers) = manager();
        manager.seek(Some(&credential("ann"))).unwrap();
        let peer = peers.accept().await;
        next(&mut manager).await;

        peer.push("{not json");
        peer.push(r#"{"version":"v2","type":"gameOver","payload":{"winner":1}}"#);
        peer.push(r#"{"version":"v1","type":"teleport","payload":{}}"#);
        peer.push(r#"{"version":"v1","type":"waitingForGame","payload":{}}"#);

        for _ in 0..3 {
            let event = next(&mut manager).await;
            assert!(matches!(event.kind, ConnectionEventKind::FrameDropped(_)));
            assert_eq!(manager.state(), ConnectionState::Open);
        }
        let event = next(&mut manager).await;
        assert!(matches!(
            event.kind,
            ConnectionEventKind::Message(WebsocketMessage::WaitingForGame(_))
        ));
    }

    #[tokio::test]
    async fn test_peer_close_clears_seeking() {
        let (mut manager, mut peers) = manager();
        manager.seek(Some(&credential("ann"))).unwrap();
        let peer = peers.accept().await;
        next(&mut manager).await;

        peer.close(CloseReason {
            code: 1001,
            reason: "going away".into(),
        });
        let event = next(&mut manager).await;
        match event.kind {
            ConnectionEventKind::Closed(Some(reason)) => {
                assert_eq!(reason.code, 1001)
            }
            other => panic!("expected Closed, got {other:?}"),
        }
        assert_eq!(manager.state(), ConnectionState::Closed);
        assert!(!manager.is_seeking());
        assert!(matches!(
            manager.send(&OutboundMessage::waiting_for_game()),
            Err(ClientError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_connect_failure_reports_error_then_closed() {
        let (mut manager, peers) = manager();
        peers.fail_next_connect();

        manager.seek(Some(&credential("ann"))).unwrap();
        let first = next(&mut manager).await;
        assert!(matches!(first.kind, ConnectionEventKind::Error(_)));
        assert!(!manager.is_seeking());

        let second = next(&mut manager).await;
        assert!(matches!(second.kind, ConnectionEventKind::Closed(None)));
        assert_eq!(manager.state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn test_explicit_retry_after_close_opens_new_connection() {
        let (mut manager, mut peers) = manager();
        let credential = credential("ann");
        manager.seek(Some(&credential)).unwrap();
        let first = peers.accept().await;
        next(&mut manager).await;

        first.close(CloseReason::normal());
        next(&mut manager).await;
        assert_eq!(manager.state(), ConnectionState::Closed);

        manager.seek(Some(&credential)).unwrap();
        let _second = peers.accept().await;
        let event = next(&mut manager).await;
        assert!(matches!(event.kind, ConnectionEventKind::Opened));
        assert_eq!(peers.dialed(), 2);
    }

    #[tokio::test]
    async fn test_close_sends_normal_closure() {
        let (mut manager, mut peers) = manager();
        manager.seek(Some(&credential("ann"))).unwrap();
        let mut peer = peers.accept().await;
        next(&mut manager).await;

        manager.close().await;

        assert_eq!(manager.state(), ConnectionState::Closed);
        assert!(!manager.is_seeking());
        assert_eq!(peer.sent().await, Some(Sent::Close(CloseReason::normal())));
    }

    #[tokio::test]
    async fn test_events_from_closed_connection_are_discarded() {
        let (mut manager, mut peers) = manager();
        let credential = credential("ann");
        manager.seek(Some(&credential)).unwrap();
        let first = peers.accept().await;
        next(&mut manager).await;
        let first_id = manager.connection_id();

        // Queue a frame on the old connection, then replace it.
        first.push(r#"{"version":"v1","type":"gameOver","payload":{"winner":1}}"#);
        manager.close().await;
        manager.seek(Some(&credential)).unwrap();
        let _second = peers.accept().await;

        let closed = next(&mut manager).await;
        assert!(matches!(closed.kind, ConnectionEventKind::Closed(_)));
        assert_eq!(Some(closed.connection), first_id);

        let event = next(&mut manager).await;
        assert!(matches!(event.kind, ConnectionEventKind::Opened));
        assert_eq!(Some(event.connection), manager.connection_id());
    }

    #[tokio::test]
    async fn test_close_reports_closed_once() {
        let (mut manager, mut peers) = manager();
        manager.seek(Some(&credential("ann"))).unwrap();
        let _peer = peers.accept().await;
        next(&mut manager).await;
        let id = manager.connection_id();

        manager.close().await;

        let event = next(&mut manager).await;
        assert_eq!(Some(event.connection), id);
        match event.kind {
            ConnectionEventKind::Closed(Some(reason)) => {
                assert!(reason.is_normal())
            }
            other => panic!("expected Closed, got {other:?}"),
        }
        let more = tokio::time::timeout(
            Duration::from_millis(100),
            manager.next_event(),
        )
        .await;
        assert!(more.is_err(), "only one Closed is reported");

        // Nothing live, so closing again reports nothing.
        manager.close().await;
        let more = tokio::time::timeout(
            Duration::from_millis(100),
            manager.next_event(),
        )
        .await;
        assert!(more.is_err());
    }

    #[tokio::test]
    async fn test_close_keeps_an_unread_peer_close_reason() {
        let (mut manager, mut peers) = manager();
        manager.seek(Some(&credential("ann"))).unwrap();
        let peer = peers.accept().await;
        next(&mut manager).await;

        let going_away = CloseReason {
            code: 1001,
            reason: "going away".into(),
        };
        peer.close(going_away.clone());
        // Let the task forward the close before we tear down.
        tokio::time::sleep(Duration::from_millis(50)).await;
        manager.close().await;

        match next(&mut manager).await.kind {
            ConnectionEventKind::Closed(reason) => {
                assert_eq!(reason, Some(going_away))
            }
            other => panic!("expected Closed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_configured_subprotocol_reaches_connector() {
        let (connector, mut peers) = MockConnector::new();
        let config = ClientConfig::default().with_subprotocol("json.v1");
        let mut manager = ConnectionManager::new(config, connector);

        manager.seek(Some(&credential("ann"))).unwrap();
        let peer = peers.accept().await;
        assert_eq!(peer.subprotocol.as_deref(), Some("json.v1"));
        next(&mut manager).await;
    }

    #[tokio::test]
    async fn test_drop_closes_with_normal_closure() {
        let (mut manager, mut peers) = manager();
        manager.seek(Some(&credential("ann"))).unwrap();
        let mut peer = peers.accept().await;
        next(&mut manager).await;

        drop(manager);

        let sent = tokio::time::timeout(Duration::from_secs(1), peer.sent())
            .await
            .expect("the task should close the socket");
        assert_eq!(sent, Some(Sent::Close(CloseReason::normal())));
    }
}
