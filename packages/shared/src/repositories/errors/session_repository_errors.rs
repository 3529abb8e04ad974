use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionRepositoryError {
    #[error("Session not found")]
    NotFound,
    #[error("Session expired")]
    Expired,
    #[error("Invalid session: {0}")]
    Invalid(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("DynamoDB error: {0}")]
    DynamoDb(String),
}
