//! Where the current credential lives.

use std::time::SystemTime;

use crate::{Credential, SessionError};

/// Holds at most one credential: the token the client dials with.
///
/// Implementors provide raw storage (`get`/`set`/`clear`); the provided
/// methods layer parsing and expiry eviction on top, so every store treats
/// an expired token the same way.
pub trait TokenStore: Send + 'static {
    /// Returns the stored credential, expired or not.
    fn get(&self) -> Option<Credential>;

    /// Replaces the stored credential.
    fn set(&mut self, credential: Credential);

    /// Removes the stored credential, if any.
    fn clear(&mut self);

    /// Parses `token` and stores it as the current credential.
    ///
    /// # Errors
    /// - [`SessionError::InvalidToken`] if the token cannot be decoded
    /// - [`SessionError::Expired`] if it is already past its `exp`
    ///
    /// The store is left untouched on error.
    fn login(&mut self, token: &str) -> Result<Credential, SessionError> {
        let credential = Credential::parse(token)?;
        if credential.is_expired() {
            return Err(SessionError::Expired {
                username: credential.username().to_string(),
            });
        }
        tracing::debug!(username = credential.username(), "credential stored");
        self.set(credential.clone());
        Ok(credential)
    }

    /// Returns the stored credential if it is still valid at `now`.
    ///
    /// An expired credential is removed from the store before
    /// [`SessionError::Expired`] is returned, so the next call reports
    /// [`SessionError::NotAuthenticated`].
    fn valid_at(
        &mut self,
        now: SystemTime,
    ) -> Result<Credential, SessionError> {
        let Some(credential) = self.get() else {
            return Err(SessionError::NotAuthenticated);
        };
        if credential.is_expired_at(now) {
            tracing::info!(
                username = credential.username(),
                "stored token expired, clearing it"
            );
            self.clear();
            return Err(SessionError::Expired {
                username: credential.username().to_string(),
            });
        }
        Ok(credential)
    }

    /// [`valid_at`](Self::valid_at) with the current time.
    fn valid(&mut self) -> Result<Credential, SessionError> {
        self.valid_at(SystemTime::now())
    }
}

/// A [`TokenStore`] that keeps the credential in memory for the life of
/// the process.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    credential: Option<Credential>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `credential`.
    pub fn with_credential(credential: Credential) -> Self {
        Self {
            credential: Some(credential),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<Credential> {
        self.credential.clone()
    }

    fn set(&mut self, credential: Credential) {
        self.credential = Some(credential);
    }

    fn clear(&mut self) {
        self.credential = None;
    }
}
