use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const SESSION_ID_BYTES: usize = 32;

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("invalid session parameters: {0}")]
    InvalidParameters(String),
}

/// A login session. The id doubles as the opaque bearer token handed to the client.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub ttl_seconds: i64,
}

impl Session {
    pub fn new(user_id: &str, ttl: Duration) -> Result<Self, SessionError> {
        if user_id.is_empty() {
            return Err(SessionError::InvalidParameters(
                "user id cannot be empty".to_string(),
            ));
        }
        if ttl <= Duration::zero() {
            return Err(SessionError::InvalidParameters(
                "ttl must be positive".to_string(),
            ));
        }

        let now = Utc::now();
        let expires_at = now.checked_add_signed(ttl).ok_or_else(|| {
            SessionError::InvalidParameters("ttl is out of range".to_string())
        })?;
        Ok(Session {
            id: generate_session_id(),
            user_id: user_id.to_string(),
            created_at: now,
            expires_at,
            ttl_seconds: ttl.num_seconds(),
        })
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// Pushes expiry out to `now + ttl`. A non-positive or out-of-range ttl
    /// leaves the session untouched.
    pub fn refresh(&mut self, ttl: Duration) {
        if ttl <= Duration::zero() {
            return;
        }
        if let Some(expires_at) = Utc::now().checked_add_signed(ttl) {
            self.expires_at = expires_at;
            self.ttl_seconds = ttl.num_seconds();
        }
    }

    pub fn remaining_ttl(&self) -> Duration {
        let remaining = self.expires_at - Utc::now();
        if remaining <= Duration::zero() {
            Duration::zero()
        } else {
            remaining
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::try_seconds(self.ttl_seconds).unwrap_or(Duration::zero())
    }

    pub fn is_valid(&self) -> bool {
        !self.id.is_empty() && !self.user_id.is_empty() && self.ttl_seconds > 0
    }
}

fn generate_session_id() -> String {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
