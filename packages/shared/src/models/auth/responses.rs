use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::session::Session;
use crate::models::user::UserProfile;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub user_id: String,
    pub session_id: String,
    pub user: UserProfile,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CurrentUserResponse {
    pub authenticated: bool,
    pub user: UserProfile,
}

/// Session listing entry. Only a prefix of the token is exposed.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SessionSummary {
    pub id_prefix: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub current: bool,
}

impl SessionSummary {
    pub fn from_session(session: &Session, current_session_id: &str) -> Self {
        SessionSummary {
            id_prefix: session.id.chars().take(8).collect(),
            created_at: session.created_at,
            expires_at: session.expires_at,
            current: session.id == current_session_id,
        }
    }
}
