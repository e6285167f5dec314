//! `GameClient`: the session object applications talk to.
//!
//! It ties together the layers:
//!
//! - a [`TokenStore`] for the credential,
//! - a [`ConnectionManager`] for the socket,
//! - a [`GameStateMachine`] and [`ChatLog`] for local state.
//!
//! The application calls intent methods (`login`, `seek_game`,
//! `submit_move`, `send_chat`) and pulls [`SessionEvent`]s from
//! [`next_event`](GameClient::next_event). Other parts of the program can
//! watch the same events through [`subscribe`](GameClient::subscribe).

use std::collections::VecDeque;

use dropfour_game::{ChatEntry, ChatLog, GameError, GameStateMachine, Outcome};
use dropfour_protocol::{
    ChatMessagePayload, Color, DecodeError, ErrorPayload, FoundGamePayload,
    GameOverPayload, LobbyId, OutboundMessage, PlayedMovePayload,
    WaitingForGamePayload,
};
use dropfour_session::{Credential, MemoryTokenStore, SessionError, TokenStore};
use dropfour_transport::{CloseReason, Connector, TransportError};
use tokio::sync::broadcast;

use crate::handler::{self, MessageHandler};
use crate::{ClientConfig, ClientError, ConnectionManager, ConnectionState};

// ---------------------------------------------------------------------------
// SessionEvent
// ---------------------------------------------------------------------------

/// A change to the session, in the order it happened.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The connection is open. The server follows with `Waiting` or a
    /// snapshot.
    Opened,
    /// The connection ended. Call
    /// [`seek_game`](GameClient::seek_game) to start over.
    Closed { reason: Option<CloseReason> },
    /// The transport failed. A `Closed` follows.
    TransportError { message: String },
    /// Queued for an opponent.
    Waiting,
    /// Matched (or resynchronized). Board, turn and chat were replaced.
    GameFound { lobby_id: LobbyId, color: Color },
    /// A disc landed.
    MovePlayed {
        color: Color,
        row: u8,
        column: u8,
    },
    /// The server declared the result.
    GameOver {
        winner: Color,
        outcome: Option<Outcome>,
    },
    /// A chat line arrived.
    Chat(ChatEntry),
    /// The server rejected one of our frames.
    ServerError { code: u16, message: String },
    /// A server event that contradicts local state (a move outside a game,
    /// a cell off the board). It was not applied.
    Rejected(GameError),
    /// An inbound frame could not be decoded and was dropped.
    FrameDropped { error: String },
}

// ---------------------------------------------------------------------------
// SessionState: the handler side
// ---------------------------------------------------------------------------

/// Local state plus the events produced while applying inbound traffic.
#[derive(Debug, Default)]
struct SessionState {
    game: GameStateMachine,
    chat: ChatLog,
    pending: VecDeque<SessionEvent>,
}

impl MessageHandler for SessionState {
    fn on_waiting_for_game(&mut self, _: WaitingForGamePayload) {
        self.game.on_waiting_for_game();
        self.pending.push_back(SessionEvent::Waiting);
    }

    fn on_found_game(&mut self, payload: FoundGamePayload) {
        let lobby_id = payload.lobby_id.clone();
        let history = self.game.on_found_game(payload);
        self.chat.seed(history);
        tracing::info!(lobby = %lobby_id, color = %self.game.local_color(), "game found");
        self.pending.push_back(SessionEvent::GameFound {
            lobby_id,
            color: self.game.local_color(),
        });
    }

    fn on_chat_message(&mut self, payload: ChatMessagePayload) {
        let entry = ChatEntry::from(payload);
        self.chat.append(entry.clone());
        self.pending.push_back(SessionEvent::Chat(entry));
    }

    fn on_played_move(&mut self, payload: PlayedMovePayload) {
        match self.game.on_played_move(payload) {
            Ok(()) => self.pending.push_back(SessionEvent::MovePlayed {
                color: payload.color,
                row: payload.row,
                column: payload.column,
            }),
            Err(e) => self.reject(e),
        }
    }

    fn on_game_over(&mut self, payload: GameOverPayload) {
        self.game.on_game_over(payload);
        let outcome = self.game.outcome();
        tracing::info!(winner = %payload.winner, ?outcome, "game over");
        self.pending.push_back(SessionEvent::GameOver {
            winner: payload.winner,
            outcome,
        });
    }

    fn on_server_error(&mut self, payload: ErrorPayload) {
        tracing::warn!(code = payload.code, err = %payload.err, "server rejected a frame");
        self.pending.push_back(SessionEvent::ServerError {
            code: payload.code,
            message: payload.err,
        });
    }

    fn on_open(&mut self) {
        self.pending.push_back(SessionEvent::Opened);
    }

    fn on_close(&mut self, reason: Option<&CloseReason>) {
        self.pending.push_back(SessionEvent::Closed {
            reason: reason.cloned(),
        });
    }

    fn on_error(&mut self, error: &TransportError) {
        self.pending.push_back(SessionEvent::TransportError {
            message: error.to_string(),
        });
    }

    fn on_frame_dropped(&mut self, error: &DecodeError) {
        self.pending.push_back(SessionEvent::FrameDropped {
            error: error.to_string(),
        });
    }
}

impl SessionState {
    fn reject(&mut self, error: GameError) {
        tracing::warn!(error = %error, "server event not applied");
        self.pending.push_back(SessionEvent::Rejected(error));
    }
}

// ---------------------------------------------------------------------------
// GameClient
// ---------------------------------------------------------------------------

/// One player's game session.
///
/// The client owns its connection: dropping it (or calling
/// [`close`](Self::close) / [`logout`](Self::logout)) closes the socket
/// with a normal closure.
pub struct GameClient<T: Connector, S: TokenStore = MemoryTokenStore> {
    connection: ConnectionManager<T>,
    tokens: S,
    session: SessionState,
    events: broadcast::Sender<SessionEvent>,
}

impl<T: Connector> GameClient<T> {
    /// Creates a client with an in-memory token store.
    pub fn new(config: ClientConfig, connector: T) -> Self {
        Self::with_store(config, connector, MemoryTokenStore::new())
    }
}

impl<T: Connector, S: TokenStore> GameClient<T, S> {
    /// Creates a client backed by `tokens`.
    pub fn with_store(config: ClientConfig, connector: T, tokens: S) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            connection: ConnectionManager::new(config, connector),
            tokens,
            session: SessionState::default(),
            events,
        }
    }

    // -----------------------------------------------------------------------
    // Credentials
    // -----------------------------------------------------------------------

    /// Stores `token` as the session credential.
    ///
    /// # Errors
    /// [`SessionError::InvalidToken`] or [`SessionError::Expired`]; the
    /// previous credential is kept in that case.
    pub fn login(&mut self, token: &str) -> Result<Credential, ClientError> {
        let credential = self.tokens.login(token)?;
        tracing::info!(username = credential.username(), "logged in");
        Ok(credential)
    }

    /// Forgets the credential and closes the connection.
    pub async fn logout(&mut self) {
        self.tokens.clear();
        self.connection.close().await;
        tracing::info!("logged out");
    }

    /// Returns `true` if an unexpired credential is stored. An expired one
    /// is evicted.
    pub fn is_authenticated(&mut self) -> bool {
        self.tokens.valid().is_ok()
    }

    // -----------------------------------------------------------------------
    // Intents
    // -----------------------------------------------------------------------

    /// Asks for a game.
    ///
    /// Without a connection this opens one (the server then queues us).
    /// Over an open connection, typically after a game ended, it sends
    /// `waitingForGame` to request a rematch.
    ///
    /// # Errors
    /// [`SessionError::NotAuthenticated`] or [`SessionError::Expired`] when
    /// a connection would have to be opened without a valid credential.
    pub fn seek_game(&mut self) -> Result<(), ClientError> {
        match self.connection.state() {
            ConnectionState::Open => {
                self.connection.seek(None)?;
                self.connection.send(&OutboundMessage::waiting_for_game())
            }
            ConnectionState::Connecting => self.connection.seek(None),
            ConnectionState::Disconnected | ConnectionState::Closed => {
                let credential = self.tokens.valid()?;
                self.connection.seek(Some(&credential))
            }
        }
    }

    /// Submits a move.
    ///
    /// Refused locally, with nothing sent, unless a game is running and it
    /// is our turn. The board only changes when the server confirms.
    pub fn submit_move(&mut self, column: u8) -> Result<(), ClientError> {
        let message = self.session.game.submit_move(column)?;
        self.connection.send(&message)
    }

    /// Posts a chat line under our username.
    ///
    /// The server echoes it to the whole lobby, us included, so it shows
    /// up in the log as a [`SessionEvent::Chat`].
    ///
    /// # Errors
    /// - [`ClientError::EmptyMessage`] if `text` is blank
    /// - [`SessionError::NotAuthenticated`] without a credential
    /// - [`ClientError::NotConnected`] without an open connection
    pub fn send_chat(&mut self, text: &str) -> Result<(), ClientError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ClientError::EmptyMessage);
        }
        let credential =
            self.tokens.get().ok_or(SessionError::NotAuthenticated)?;
        self.connection
            .send(&OutboundMessage::chat_message(credential.username(), text))
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    /// Waits for the next session event.
    ///
    /// Each call applies at most one connection event to local state, so
    /// state is only ever mutated here, in arrival order. The event is
    /// also broadcast to subscribers.
    ///
    /// Cancel-safe: dropping the future before it completes loses nothing.
    pub async fn next_event(&mut self) -> SessionEvent {
        loop {
            if let Some(event) = self.session.pending.pop_front() {
                // No subscribers is fine.
                let _ = self.events.send(event.clone());
                return event;
            }
            let event = self.connection.next_event().await;
            handler::dispatch_event(&mut self.session, event.kind);
        }
    }

    /// A receiver for every event returned by
    /// [`next_event`](Self::next_event) from now on. Drop it to
    /// unsubscribe.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Closes the connection with a normal closure. The credential is
    /// kept, so [`seek_game`](Self::seek_game) can reconnect.
    pub async fn close(&mut self) {
        self.connection.close().await;
    }

    // -----------------------------------------------------------------------
    // State
    // -----------------------------------------------------------------------

    pub fn game(&self) -> &GameStateMachine {
        &self.session.game
    }

    pub fn chat(&self) -> &ChatLog {
        &self.session.chat
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn is_seeking(&self) -> bool {
        self.connection.is_seeking()
    }

    /// The username from the stored credential.
    pub fn username(&self) -> Option<String> {
        self.tokens.get().map(|c| c.username().to_string())
    }
}
