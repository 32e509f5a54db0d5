use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Session lifetime: 7 days, for both the token expiry and the cookie max-age.
pub const SESSION_TTL_SECS: i64 = 60 * 60 * 24 * 7;

pub const DEFAULT_USER_ID: &str = "default-id";

/// Opaque session token: base64 of `{"userId": .., "exp": <epoch-ms>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub exp: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is not valid base64")]
    Encoding,
    #[error("token payload is malformed")]
    Payload,
}

impl SessionToken {
    pub fn issue(user_id: impl Into<String>, now_ms: i64) -> Self {
        Self {
            user_id: user_id.into(),
            exp: now_ms + SESSION_TTL_SECS * 1000,
        }
    }

    pub fn encode(&self) -> String {
        // serializing two plain fields cannot fail
        let json = serde_json::to_vec(self).unwrap_or_default();
        STANDARD.encode(json)
    }

    pub fn decode(raw: &str) -> Result<Self, TokenError> {
        let bytes = STANDARD.decode(raw.trim()).map_err(|_| TokenError::Encoding)?;
        serde_json::from_slice(&bytes).map_err(|_| TokenError::Payload)
    }

    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.exp <= now_ms
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
}

/// Body of `POST /api/auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub usuario: String,
    pub password: String,
}
