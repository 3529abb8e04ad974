use thiserror::Error;

#[derive(Debug, Error)]
pub enum UserServiceError {
    #[error("Username already exists")]
    UserAlreadyExists,
    #[error("User not found")]
    UserNotFound,
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Invalid password")]
    InvalidPassword,
    #[error("Password hashing failed: {0}")]
    PasswordHashing(String),
    #[error("Repository error: {0}")]
    RepositoryError(String),
}
