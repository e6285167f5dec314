//! The client-side game state machine.
//!
//! Every transition is driven by a message the server sent. The machine
//! never guesses: it does not check for four-in-a-row, and it does not place
//! a disc when the local player submits a move. It waits for the server's
//! `playedMove` and applies that.

use dropfour_protocol::{
    Board, COLUMNS, ChatMessagePayload, Color, FoundGamePayload,
    GameOverPayload, LobbyId, OutboundMessage, PlayedMovePayload,
};

use crate::{GameError, GameStatus};

/// How the finished game ended for the local player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Victory,
    Defeat,
    Draw,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Victory => write!(f, "You won!"),
            Self::Defeat => write!(f, "You lost."),
            Self::Draw => write!(f, "It's a draw."),
        }
    }
}

/// Local mirror of one player's game session.
///
/// ## Turn tracking
///
/// The server never says whose turn it is. It is derived:
///
/// - on `foundGame`: player one if nobody has moved (`lastPlayed == 0`),
///   otherwise the opponent of whoever moved last;
/// - on each `playedMove`: flipped to the other player.
#[derive(Debug, Clone, Default)]
pub struct GameStateMachine {
    status: GameStatus,
    lobby_id: Option<LobbyId>,
    local_color: Color,
    active_player: Color,
    winner: Option<Color>,
    board: Board,
}

impl GameStateMachine {
    /// A machine in [`GameStatus::Idle`] with an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Server events
    // -----------------------------------------------------------------------

    /// The server queued us for an opponent.
    pub fn on_waiting_for_game(&mut self) {
        self.transition(GameStatus::Waiting);
    }

    /// The server matched us (or resent the snapshot of a running game).
    ///
    /// Replaces the board wholesale, adopts the assigned color and derives
    /// whose turn it is. Returns the chat history from the snapshot so the
    /// caller can seed its [`ChatLog`](crate::ChatLog).
    ///
    /// A snapshot without an assigned color (`color: 0`) is still applied.
    /// [`submit_move`](Self::submit_move) keeps refusing moves until a
    /// snapshot names our side.
    pub fn on_found_game(
        &mut self,
        payload: FoundGamePayload,
    ) -> Vec<ChatMessagePayload> {
        if !payload.color.is_player() {
            tracing::warn!(lobby = %payload.lobby_id, "snapshot assigns no color");
        }

        self.transition(GameStatus::Playing);
        self.lobby_id = Some(payload.lobby_id);
        self.local_color = payload.color;
        self.board = payload.state;
        self.winner = None;
        self.active_player = match payload.last_played {
            Color::None => Color::Red,
            last => last.opponent(),
        };

        tracing::debug!(
            lobby = ?self.lobby_id,
            color = %self.local_color,
            active = %self.active_player,
            "snapshot applied"
        );
        payload.messages
    }

    /// The server accepted a move (ours or the opponent's).
    ///
    /// # Errors
    /// - [`GameError::NotPlaying`] outside [`GameStatus::Playing`]
    /// - [`GameError::OffBoard`] if `(row, column)` is not on the board
    /// - [`GameError::NotAPlayer`] if `color` is `0`
    ///
    /// The board and turn are left untouched on error.
    pub fn on_played_move(
        &mut self,
        payload: PlayedMovePayload,
    ) -> Result<(), GameError> {
        if !self.status.is_playing() {
            return Err(GameError::NotPlaying(self.status));
        }
        if !payload.color.is_player() {
            return Err(GameError::NotAPlayer(payload.color));
        }

        let placed = self.board.set(
            usize::from(payload.row),
            usize::from(payload.column),
            payload.color,
        );
        if !placed {
            return Err(GameError::OffBoard {
                row: payload.row,
                column: payload.column,
            });
        }

        self.active_player = self.active_player.opponent();
        Ok(())
    }

    /// The server declared the result. `Color::None` is a draw.
    pub fn on_game_over(&mut self, payload: GameOverPayload) {
        self.transition(GameStatus::Over);
        self.winner = Some(payload.winner);
    }

    // -----------------------------------------------------------------------
    // Local intents
    // -----------------------------------------------------------------------

    /// Builds the `playMove` for `column` if it is our turn.
    ///
    /// This is only a guard: it does not touch the board. The disc appears
    /// when the server echoes the move back as `playedMove`.
    ///
    /// # Errors
    /// - [`GameError::NotPlaying`] outside [`GameStatus::Playing`]
    /// - [`GameError::NotYourTurn`] when the opponent is to move
    /// - [`GameError::ColumnOutOfRange`] for `column >= 7`
    pub fn submit_move(
        &self,
        column: u8,
    ) -> Result<OutboundMessage, GameError> {
        if !self.status.is_playing() {
            return Err(GameError::NotPlaying(self.status));
        }
        if !self.is_local_turn() {
            return Err(GameError::NotYourTurn(self.active_player));
        }
        if usize::from(column) >= COLUMNS {
            return Err(GameError::ColumnOutOfRange(column));
        }
        Ok(OutboundMessage::play_move(column))
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn lobby_id(&self) -> Option<&LobbyId> {
        self.lobby_id.as_ref()
    }

    /// Our color, or `Color::None` before the first `foundGame`.
    pub fn local_color(&self) -> Color {
        self.local_color
    }

    /// Whose turn it is, or `Color::None` before the first `foundGame`.
    pub fn active_player(&self) -> Color {
        self.active_player
    }

    /// The declared winner once the game is over. `Some(Color::None)` is a
    /// draw; `None` means no result yet.
    pub fn winner(&self) -> Option<Color> {
        self.winner
    }

    /// Returns `true` if a game is running and it is our move.
    pub fn is_local_turn(&self) -> bool {
        self.status.is_playing()
            && self.local_color.is_player()
            && self.local_color == self.active_player
    }

    /// The result from our point of view, once the server has declared one.
    pub fn outcome(&self) -> Option<Outcome> {
        if self.status != GameStatus::Over {
            return None;
        }
        match self.winner? {
            Color::None => Some(Outcome::Draw),
            w if w == self.local_color => Some(Outcome::Victory),
            _ => Some(Outcome::Defeat),
        }
    }

    fn transition(&mut self, next: GameStatus) {
        if !self.status.can_transition_to(next) {
            tracing::debug!(from = %self.status, to = %next, "unexpected transition");
        }
        self.status = next;
    }
}
