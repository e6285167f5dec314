//! Error types for the protocol layer.
//!
//! Decoding has its own enum because callers branch on *why* a frame was
//! refused: a garbled frame, a message kind this client does not know, or
//! an envelope from a protocol version it must not interpret.

/// Why an inbound frame could not be turned into a [`WebsocketMessage`].
///
/// [`WebsocketMessage`]: crate::WebsocketMessage
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The text is not a well-formed envelope, or the payload does not
    /// have the shape its `type` requires (wrong field types, a board that
    /// is not 6x7, a color outside 0..=2, ...).
    #[error("malformed frame: {0}")]
    Malformed(#[source] serde_json::Error),

    /// The envelope is well-formed but its `type` is not one this client
    /// knows about.
    #[error("unknown message type {0:?}")]
    UnknownType(String),

    /// The envelope carries a `version` other than the one this client
    /// speaks. Such frames are rejected, never interpreted.
    #[error("unsupported protocol version {0:?}")]
    VersionMismatch(String),
}

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a message into text).
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// Deserialization failed (turning text into a message).
    #[error(transparent)]
    Decode(#[from] DecodeError),
}
