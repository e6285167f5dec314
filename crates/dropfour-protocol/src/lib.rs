//! Wire protocol for dropfour.
//!
//! This crate defines the "language" the game client and server speak:
//!
//! - **Types** ([`WebsocketMessage`], [`Board`], [`Color`], payload structs)
//!   are the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) converts them to and from
//!   the `{version, type, payload}` text envelope.
//! - **Errors** ([`DecodeError`], [`ProtocolError`]) describe what can go
//!   wrong while doing so.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (text frames) and the game
//! state machine. It knows nothing about connections or turns; it only
//! knows how to turn a frame into a typed message and back.
//!
//! ```text
//! Transport (text) → Protocol (WebsocketMessage) → Game (board, turn, chat)
//! ```

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec, PROTOCOL_VERSION};
pub use error::{DecodeError, ProtocolError};
pub use types::{
    Board, COLUMNS, ChatMessagePayload, Color, ErrorPayload, FoundGamePayload,
    GameOverPayload, InvalidColor, LobbyId, MessageType, OutboundMessage,
    PlayMovePayload, PlayedMovePayload, ROWS, WaitingForGamePayload,
    WebsocketMessage,
};
