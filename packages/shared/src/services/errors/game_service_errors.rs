use thiserror::Error;

use crate::models::game::GameError;

#[derive(Debug, Error)]
pub enum GameServiceError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Game not found")]
    GameNotFound,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("{0}")]
    InvalidTransition(GameError),
    #[error("Repository error: {0}")]
    RepositoryError(String),
}

impl From<GameError> for GameServiceError {
    fn from(error: GameError) -> Self {
        match error {
            GameError::MissingPlayer(_) | GameError::Invalid(_) => {
                GameServiceError::ValidationError(error.to_string())
            }
            GameError::NotParticipant => GameServiceError::Forbidden(error.to_string()),
            _ => GameServiceError::InvalidTransition(error),
        }
    }
}
