//! Error types for the session layer.

/// Errors that can occur while handling credentials.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No credential is stored. Log in first.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The stored credential's `exp` claim is in the past. It has been
    /// removed from the store.
    #[error("token for {username} expired")]
    Expired { username: String },

    /// The token is not a decodable JWT (wrong segment count, bad
    /// base64url, or claims that are not the expected JSON).
    #[error("invalid token: {0}")]
    InvalidToken(String),
}
