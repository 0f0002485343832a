//! Session tokens, stored records and session errors

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Length of an encoded token: 32 random bytes in unpadded base64url
const TOKEN_LEN: usize = 43;

/// Opaque session token carried in the session cookie
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a new token from 32 bytes of CSPRNG output
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::rng().fill(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Get the token as a string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Tokens are credentials, keep them out of debug logs.
impl std::fmt::Debug for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix: String = self.0.chars().take(6).collect();
        f.debug_tuple("SessionId")
            .field(&format_args!("{prefix}…"))
            .finish()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for SessionId {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let well_formed = s.len() == TOKEN_LEN
            && s
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        if well_formed {
            Ok(Self(s.to_owned()))
        } else {
            Err(SessionError::InvalidSessionId)
        }
    }
}

/// What the backing store keeps for one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Stored values
    pub values: HashMap<String, serde_json::Value>,
    /// End of the absolute lifetime
    pub deadline: DateTime<Utc>,
    /// When the record stops being valid, never later than `deadline`
    pub expiry: DateTime<Utc>,
}

impl SessionRecord {
    /// True when the record is no longer valid at `now`
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expiry
    }
}

/// Session errors
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Token is not a well-formed session token
    #[error("Invalid session ID")]
    InvalidSessionId,

    /// Value could not be converted to or from JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backing database failed
    #[error("Session store error: {0}")]
    Store(#[from] sqlx::Error),
}
