use thiserror::Error;

use crate::services::errors::user_service_errors::UserServiceError;

#[derive(Debug, Error)]
pub enum AuthServiceError {
    #[error("User service error: {0}")]
    UserServiceError(#[from] UserServiceError),
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Session not found")]
    SessionNotFound,
    #[error("Session has expired")]
    SessionExpired,
    #[error("Session error: {0}")]
    SessionError(String),
}
