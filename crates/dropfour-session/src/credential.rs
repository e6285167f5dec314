//! Bearer tokens and the claims inside them.
//!
//! A token is a JWT: three base64url segments joined by dots,
//! `header.claims.signature`. Only the middle segment is read.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

use crate::SessionError;

/// The claims the game server puts in a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: String,
    pub username: String,
    /// Issued-at, seconds since the Unix epoch.
    #[serde(default)]
    pub iat: u64,
    /// Expiry, seconds since the Unix epoch.
    pub exp: u64,
}

/// A raw token together with its decoded claims.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    claims: Claims,
}

impl Credential {
    /// Decodes the claims segment of `token`.
    ///
    /// # Errors
    /// [`SessionError::InvalidToken`] if the token does not have three
    /// segments, the middle one is not base64url, or it does not hold the
    /// expected claims.
    pub fn parse(token: impl Into<String>) -> Result<Self, SessionError> {
        let token = token.into();

        let segments: Vec<&str> = token.split('.').collect();
        let [_, claims, _] = segments.as_slice() else {
            return Err(SessionError::InvalidToken(format!(
                "expected 3 segments, found {}",
                segments.len()
            )));
        };

        // Some issuers pad; the no-pad engine rejects '=' so strip it.
        let bytes = URL_SAFE_NO_PAD
            .decode(claims.trim_end_matches('='))
            .map_err(|e| SessionError::InvalidToken(e.to_string()))?;
        let claims: Claims = serde_json::from_slice(&bytes)
            .map_err(|e| SessionError::InvalidToken(e.to_string()))?;

        Ok(Self { token, claims })
    }

    /// The token exactly as issued.
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    pub fn username(&self) -> &str {
        &self.claims.username
    }

    /// Returns `true` once `now` has reached the `exp` claim.
    pub fn is_expired_at(&self, now: SystemTime) -> bool {
        let now = now
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        self.claims.exp <= now
    }

    /// [`is_expired_at`](Self::is_expired_at) with the current time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(SystemTime::now())
    }
}

// The token is a bearer secret; keep it out of logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("claims", &self.claims)
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::time::Duration;

    use super::*;

    /// Builds an unsigned token carrying `claims`.
    pub(crate) fn token_for(claims: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{header}.{body}.signature")
    }

    pub(crate) fn claims(exp: u64) -> serde_json::Value {
        serde_json::json!({
            "userId": "2b9d6c1e-0000-4000-8000-000000000001",
            "username": "ann",
            "iat": 1_700_000_000u64,
            "exp": exp,
        })
    }

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn test_parse_reads_claims() {
        let token = token_for(&claims(1_700_086_400));
        let credential = Credential::parse(token.clone()).unwrap();

        assert_eq!(credential.token(), token);
        assert_eq!(credential.username(), "ann");
        assert_eq!(credential.claims().iat, 1_700_000_000);
        assert_eq!(credential.claims().exp, 1_700_086_400);
    }

    #[test]
    fn test_parse_tolerates_padding_and_extra_claims() {
        let mut value = claims(10);
        value["nbf"] = serde_json::json!(1);
        let token = token_for(&value);
        let (head, rest) = token.split_once('.').unwrap();
        let (body, sig) = rest.split_once('.').unwrap();
        let padded = format!("{head}.{body}==.{sig}");

        assert!(Credential::parse(padded).is_ok());
    }

    #[test]
    fn test_parse_rejects_wrong_segment_count() {
        let err = Credential::parse("only.two").unwrap_err();
        assert!(matches!(err, SessionError::InvalidToken(_)));
    }

    #[test]
    fn test_parse_rejects_bad_base64() {
        let err = Credential::parse("a.!!!.c").unwrap_err();
        assert!(matches!(err, SessionError::InvalidToken(_)));
    }

    #[test]
    fn test_parse_rejects_missing_username() {
        let token = token_for(&serde_json::json!({ "userId": "u", "exp": 5 }));
        let err = Credential::parse(token).unwrap_err();
        assert!(matches!(err, SessionError::InvalidToken(_)));
    }

    #[test]
    fn test_expiry_boundary() {
        let credential = Credential::parse(token_for(&claims(1_000))).unwrap();
        assert!(!credential.is_expired_at(at(999)));
        assert!(credential.is_expired_at(at(1_000)));
        assert!(credential.is_expired_at(at(5_000)));
    }

    #[test]
    fn test_debug_redacts_token() {
        let credential = Credential::parse(token_for(&claims(1))).unwrap();
        let debug = format!("{credential:?}");
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("signature"));
        assert!(debug.contains("ann"));
    }
}
