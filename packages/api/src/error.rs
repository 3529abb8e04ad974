use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use lambda_http::tracing::error;
use shared::services::errors::{
    auth_service_errors::AuthServiceError, game_service_errors::GameServiceError,
    user_service_errors::UserServiceError,
};

use crate::response::ApiResponse;

#[derive(Debug)]
pub enum ApiError {
    UserService(UserServiceError),
    AuthService(AuthServiceError),
    GameService(GameServiceError),
    InvalidBody(String),
    Unauthorized,
}

impl From<UserServiceError> for ApiError {
    fn from(error: UserServiceError) -> Self {
        ApiError::UserService(error)
    }
}

impl From<AuthServiceError> for ApiError {
    fn from(error: AuthServiceError) -> Self {
        ApiError::AuthService(error)
    }
}

impl From<GameServiceError> for ApiError {
    fn from(error: GameServiceError) -> Self {
        ApiError::GameService(error)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody(rejection.body_text())
    }
}

fn user_status(error: &UserServiceError) -> StatusCode {
    match error {
        UserServiceError::UserAlreadyExists => StatusCode::CONFLICT,
        UserServiceError::UserNotFound => StatusCode::NOT_FOUND,
        UserServiceError::ValidationError(_) => StatusCode::BAD_REQUEST,
        UserServiceError::InvalidPassword => StatusCode::UNAUTHORIZED,
        UserServiceError::PasswordHashing(_) | UserServiceError::RepositoryError(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::UserService(e) => user_status(e),

            ApiError::AuthService(AuthServiceError::UserServiceError(e)) => user_status(e),
            ApiError::AuthService(
                AuthServiceError::InvalidCredentials
                | AuthServiceError::SessionNotFound
                | AuthServiceError::SessionExpired,
            ) => StatusCode::UNAUTHORIZED,
            ApiError::AuthService(AuthServiceError::ValidationError(_)) => StatusCode::BAD_REQUEST,
            ApiError::AuthService(AuthServiceError::SessionError(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            ApiError::GameService(GameServiceError::ValidationError(_)) => StatusCode::BAD_REQUEST,
            ApiError::GameService(GameServiceError::GameNotFound) => StatusCode::NOT_FOUND,
            ApiError::GameService(GameServiceError::Forbidden(_)) => StatusCode::FORBIDDEN,
            ApiError::GameService(GameServiceError::InvalidTransition(_)) => StatusCode::CONFLICT,
            ApiError::GameService(GameServiceError::RepositoryError(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            ApiError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::UserService(e) => e.to_string(),
            ApiError::AuthService(AuthServiceError::UserServiceError(e)) => e.to_string(),
            ApiError::AuthService(e) => e.to_string(),
            ApiError::GameService(e) => e.to_string(),
            ApiError::InvalidBody(detail) => format!("Invalid request body: {}", detail),
            ApiError::Unauthorized => "Authentication required".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Store failures are logged in full but never echoed to the client.
        let message = if status.is_server_error() {
            error!("Request failed: {:?}", self);
            "Internal server error".to_string()
        } else {
            self.message()
        };

        (status, ApiResponse::error(&message)).into_response()
    }
}
