//! Unified error type for the dropfour client.

use dropfour_game::GameError;
use dropfour_protocol::ProtocolError;
use dropfour_session::SessionError;
use dropfour_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `dropfour` crate, you deal with this single error type
/// instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant auto-generates `From` impls, so the `?`
/// operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// A transport-level error (connect, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A credential problem (not logged in, expired, unreadable token).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A move the local guard refused (not playing, not our turn).
    #[error(transparent)]
    Game(#[from] GameError),

    /// The configured host or base path does not form a valid URL.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    /// There is no open connection to send on.
    #[error("not connected")]
    NotConnected,

    /// A connection is already open or being opened.
    #[error("already connected")]
    AlreadyConnected,

    /// Chat text was empty after trimming.
    #[error("chat message is empty")]
    EmptyMessage,
}
