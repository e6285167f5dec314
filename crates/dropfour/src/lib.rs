//! # dropfour
//!
//! Real-time client for the dropfour game server.
//!
//! The server is authoritative: it matches players, validates moves and
//! declares the winner. This crate keeps a local mirror of that state and
//! manages the one WebSocket connection it arrives over.
//!
//! ## Layers
//!
//! ```text
//! GameClient          login / seek / move / chat, SessionEvent stream
//!   ├─ TokenStore     bearer credential + expiry   (dropfour-session)
//!   ├─ GameStateMachine, ChatLog                   (dropfour-game)
//!   └─ ConnectionManager                           (this crate)
//!        ├─ Codec     {version,type,payload} text  (dropfour-protocol)
//!        └─ Connector WebSocket                    (dropfour-transport)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dropfour::prelude::*;
//!
//! # async fn run(token: &str) -> Result<(), ClientError> {
//! let mut client = GameClient::new(ClientConfig::default(), WebSocketConnector::new());
//! client.login(token)?;
//! client.seek_game()?;
//!
//! loop {
//!     match client.next_event().await {
//!         SessionEvent::GameFound { color, .. } => println!("playing as {color}"),
//!         SessionEvent::GameOver { outcome, .. } => {
//!             println!("{outcome:?}");
//!             break;
//!         }
//!         _ => {}
//!     }
//! }
//! client.close().await;
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
pub mod connection;
mod error;
pub mod handler;
#[cfg(test)]
mod testing;

pub use client::{GameClient, SessionEvent};
pub use config::ClientConfig;
pub use connection::{
    ConnectionEvent, ConnectionEventKind, ConnectionManager, ConnectionState,
};
pub use error::ClientError;
pub use handler::MessageHandler;

pub mod prelude {
    //! Everything an application needs to drive a game session.

    pub use crate::{
        ClientConfig, ClientError, ConnectionState, GameClient,
        MessageHandler, SessionEvent,
    };
    pub use dropfour_game::{
        ChatEntry, ChatLog, GameError, GameStateMachine, GameStatus, Outcome,
    };
    pub use dropfour_protocol::{
        Board, COLUMNS, Color, LobbyId, OutboundMessage, ROWS, WebsocketMessage,
    };
    pub use dropfour_session::{
        Credential, MemoryTokenStore, SessionError, TokenStore,
    };
    pub use dropfour_transport::{CloseReason, Connector, WebSocketConnector};
}
