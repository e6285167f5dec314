//! Error types for the game layer.

use dropfour_protocol::Color;

use crate::GameStatus;

/// Why a move was refused, or why a server event could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// Moves are only possible while a game is in progress.
    #[error("no game in progress (status is {0})")]
    NotPlaying(GameStatus),

    /// It is the other player's turn.
    #[error("not your turn ({0} to move)")]
    NotYourTurn(Color),

    /// The column is outside `0..7`.
    #[error("column {0} is off the board")]
    ColumnOutOfRange(u8),

    /// A `playedMove` named a cell outside the 6x7 board.
    #[error("cell ({row}, {column}) is off the board")]
    OffBoard { row: u8, column: u8 },

    /// A move used `Color::None` where a player is required.
    #[error("{0} is not a player color")]
    NotAPlayer(Color),
}
