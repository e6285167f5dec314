//! Core protocol types for dropfour's wire format.
//!
//! Every type in this module travels "on the wire": it is serialized into
//! the `payload` of an envelope, sent over the socket, and deserialized on
//! the other side. Field names follow the server's camelCase JSON.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Number of rows on the board. Row 0 is the top row.
pub const ROWS: usize = 6;

/// Number of columns on the board.
pub const COLUMNS: usize = 7;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Server-assigned identifier for a matched pair of players.
///
/// Newtype over the server's string id so a lobby id can't be mixed up with
/// a username or a token. `#[serde(transparent)]` keeps it a plain JSON
/// string on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LobbyId(pub String);

impl fmt::Display for LobbyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LobbyId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for LobbyId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// A player's side, and the value stored in each board cell.
///
/// On the wire a color is a bare integer: `0` (no one), `1` (player one,
/// red), `2` (player two, yellow). The same type covers board cells,
/// `lastPlayed` (where `0` means nobody has moved yet), and `winner`
/// (where `0` means a draw).
///
/// `#[serde(try_from = "u8", into = "u8")]` routes serde through the
/// integer conversions below, so any other integer fails to decode instead
/// of silently producing a bogus cell.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum Color {
    /// Empty cell / no player.
    #[default]
    None,
    /// Player one. Always moves first.
    Red,
    /// Player two.
    Yellow,
}

impl Color {
    /// Returns the other player. `None` has no opponent and maps to itself.
    pub fn opponent(self) -> Self {
        match self {
            Self::Red => Self::Yellow,
            Self::Yellow => Self::Red,
            Self::None => Self::None,
        }
    }

    /// Returns `true` for the two player colors.
    pub fn is_player(self) -> bool {
        !matches!(self, Self::None)
    }
}

impl From<Color> for u8 {
    fn from(color: Color) -> Self {
        match color {
            Color::None => 0,
            Color::Red => 1,
            Color::Yellow => 2,
        }
    }
}

/// An integer that is not a valid [`Color`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{0} is not a color (expected 0, 1, or 2)")]
pub struct InvalidColor(pub u8);

impl TryFrom<u8> for Color {
    type Error = InvalidColor;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Red),
            2 => Ok(Self::Yellow),
            other => Err(InvalidColor(other)),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Red => write!(f, "red"),
            Self::Yellow => write!(f, "yellow"),
        }
    }
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// The fixed 6x7 grid of cells, indexed `[row][column]`.
///
/// The dimensions live in the type (`[[Color; COLUMNS]; ROWS]`), so a
/// snapshot with the wrong number of rows or columns is rejected by serde
/// during decoding and a `Board` can never be resized afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board([[Color; COLUMNS]; ROWS]);

impl Board {
    /// A board with every cell empty.
    pub const fn empty() -> Self {
        Self([[Color::None; COLUMNS]; ROWS])
    }

    /// Builds a board from explicit rows.
    pub const fn from_rows(rows: [[Color; COLUMNS]; ROWS]) -> Self {
        Self(rows)
    }

    /// Returns the cell at `(row, column)`, or `None` if it is off the board.
    pub fn get(&self, row: usize, column: usize) -> Option<Color> {
        self.0.get(row)?.get(column).copied()
    }

    /// Overwrites the cell at `(row, column)`.
    ///
    /// Returns `false` (and changes nothing) when the coordinates are off
    /// the board.
    pub fn set(&mut self, row: usize, column: usize, color: Color) -> bool {
        match self.0.get_mut(row).and_then(|r| r.get_mut(column)) {
            Some(cell) => {
                *cell = color;
                true
            }
            None => false,
        }
    }

    /// Borrows the raw rows, top row first.
    pub fn rows(&self) -> &[[Color; COLUMNS]; ROWS] {
        &self.0
    }

    /// Returns `true` if no disc has been placed.
    pub fn is_empty(&self) -> bool {
        self.0.iter().flatten().all(|cell| *cell == Color::None)
    }
}

/// Text rendering: `.` empty, `R` red, `Y` yellow, one row per line,
/// followed by the column indices players type to move.
impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.0 {
            let line: Vec<&str> = row
                .iter()
                .map(|cell| match cell {
                    Color::None => ".",
                    Color::Red => "R",
                    Color::Yellow => "Y",
                })
                .collect();
            writeln!(f, "{}", line.join(" "))?;
        }
        let footer: Vec<String> =
            (0..COLUMNS).map(|c| c.to_string()).collect();
        write!(f, "{}", footer.join(" "))
    }
}

// ---------------------------------------------------------------------------
// Payloads, one per message type
// ---------------------------------------------------------------------------

/// `waitingForGame`: the client is queued for an opponent. Empty payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitingForGamePayload {}

/// `foundGame`: a full snapshot sent when a lobby is matched (or resumed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoundGamePayload {
    /// The lobby both players are in.
    pub lobby_id: LobbyId,
    /// The color assigned to this client.
    pub color: Color,
    /// The board as the server sees it.
    pub state: Board,
    /// Who moved last; `Color::None` if nobody has moved yet.
    pub last_played: Color,
    /// Chat history for the lobby. The server may send `null` for an
    /// empty history, which decodes as an empty list.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub messages: Vec<ChatMessagePayload>,
}

/// `chatMessage`: one line of lobby chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessagePayload {
    pub from: String,
    pub text: String,
}

/// `playMove`: the client asks to drop a disc into `column`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayMovePayload {
    pub column: u8,
}

/// `playedMove`: the server confirms a disc landed at `(row, column)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayedMovePayload {
    pub color: Color,
    pub row: u8,
    pub column: u8,
}

/// `gameOver`: the server declares the result. `Color::None` is a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOverPayload {
    pub winner: Color,
}

/// `error`: the server refused one of our frames.
///
/// `problematic_msg` echoes the offending envelope back; it is kept as raw
/// JSON because it may be something this client could not have produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub code: u16,
    #[serde(default)]
    pub err: String,
    #[serde(default)]
    pub problematic_msg: serde_json::Value,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<Vec<T>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

// ---------------------------------------------------------------------------
// MessageType: the envelope's `type` tag
// ---------------------------------------------------------------------------

/// The discriminant carried in the envelope's `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageType {
    WaitingForGame,
    FoundGame,
    ChatMessage,
    PlayMove,
    PlayedMove,
    GameOver,
    Error,
}

impl MessageType {
    /// Every known message type.
    pub const ALL: [Self; 7] = [
        Self::WaitingForGame,
        Self::FoundGame,
        Self::ChatMessage,
        Self::PlayMove,
        Self::PlayedMove,
        Self::GameOver,
        Self::Error,
    ];

    /// The tag as it appears on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WaitingForGame => "waitingForGame",
            Self::FoundGame => "foundGame",
            Self::ChatMessage => "chatMessage",
            Self::PlayMove => "playMove",
            Self::PlayedMove => "playedMove",
            Self::GameOver => "gameOver",
            Self::Error => "error",
        }
    }

    /// Looks up a wire tag. Matching is exact (case-sensitive).
    pub fn from_wire(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == tag)
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// WebsocketMessage: the decoded message
// ---------------------------------------------------------------------------

/// One decoded protocol message.
///
/// This is a sum type with one variant per message kind, so consumers
/// `match` on it exhaustively: adding a variant here makes every
/// non-exhaustive consumer fail to compile.
#[derive(Debug, Clone, PartialEq)]
pub enum WebsocketMessage {
    WaitingForGame(WaitingForGamePayload),
    FoundGame(FoundGamePayload),
    ChatMessage(ChatMessagePayload),
    PlayMove(PlayMovePayload),
    PlayedMove(PlayedMovePayload),
    GameOver(GameOverPayload),
    Error(ErrorPayload),
}

impl WebsocketMessage {
    /// The `type` tag this message is sent with.
    pub fn kind(&self) -> MessageType {
        match self {
            Self::WaitingForGame(_) => MessageType::WaitingForGame,
            Self::FoundGame(_) => MessageType::FoundGame,
            Self::ChatMessage(_) => MessageType::ChatMessage,
            Self::PlayMove(_) => MessageType::PlayMove,
            Self::PlayedMove(_) => MessageType::PlayedMove,
            Self::GameOver(_) => MessageType::GameOver,
            Self::Error(_) => MessageType::Error,
        }
    }
}

// ---------------------------------------------------------------------------
// OutboundMessage: what a client is allowed to send
// ---------------------------------------------------------------------------

/// A message the client may send to the server.
///
/// The inner message is private: the constructors below are the only way
/// to build one, so a connection can only ever write `waitingForGame`,
/// `playMove`, or `chatMessage` frames.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage(WebsocketMessage);

impl OutboundMessage {
    /// Ask to be matched with an opponent (or for a rematch).
    pub fn waiting_for_game() -> Self {
        Self(WebsocketMessage::WaitingForGame(WaitingForGamePayload {}))
    }

    /// Ask to drop a disc into `column`.
    pub fn play_move(column: u8) -> Self {
        Self(WebsocketMessage::PlayMove(PlayMovePayload { column }))
    }

    /// Post a line to the lobby chat.
    pub fn chat_message(
        from: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self(WebsocketMessage::ChatMessage(ChatMessagePayload {
            from: from.into(),
            text: text.into(),
        }))
    }

    /// The `type` tag this message is sent with.
    pub fn kind(&self) -> MessageType {
        self.0.kind()
    }

    /// Borrows the underlying message.
    pub fn as_message(&self) -> &WebsocketMessage {
        &self.0
    }

    /// Unwraps the underlying message.
    pub fn into_message(self) -> WebsocketMessage {
        self.0
    }
}

// =========================================================================
// Tests
// =========================================================================
