//! Local game state for dropfour.
//!
//! The server is authoritative: it decides whether a move is legal and who
//! won. This crate mirrors what the server has announced so a UI can draw
//! the board, tell whose turn it is, and refuse obviously invalid input
//! before it goes on the wire.
//!
//! - [`GameStateMachine`]: status, board, colors, turn, and result.
//! - [`ChatLog`]: the lobby chat, in arrival order.
//!
//! Neither type touches the network. They are fed decoded messages and
//! return what should be sent, if anything.

mod chat;
mod error;
mod machine;
mod status;

pub use chat::{ChatEntry, ChatLog};
pub use error::GameError;
pub use machine::{GameStateMachine, Outcome};
pub use status::GameStatus;
