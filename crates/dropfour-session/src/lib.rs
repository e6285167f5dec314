//! Session credentials for dropfour.
//!
//! The game server authenticates the socket with a bearer token passed in
//! the connection URL. This crate holds that token between calls and reads
//! the claims inside it:
//!
//! - [`Credential`]: a token plus its decoded [`Claims`] (who the player
//!   is, when the token expires).
//! - [`TokenStore`]: where the current credential lives. Expired
//!   credentials are evicted on read.
//! - [`MemoryTokenStore`]: the in-process implementation.
//!
//! Signatures are *not* verified here. The server does that; the client
//! only needs the username for chat and the expiry to avoid dialing with a
//! token the server will refuse.

mod credential;
mod error;
mod store;

pub use credential::{Claims, Credential};
pub use error::SessionError;
pub use store::{MemoryTokenStore, TokenStore};
