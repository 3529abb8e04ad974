use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, info, warn};

use crate::models::auth::responses::AuthResponse;
use crate::models::session::Session;
use crate::models::user::User;
use crate::repositories::errors::session_repository_errors::SessionRepositoryError;
use crate::repositories::session_repository::SessionRepository;
use crate::services::errors::auth_service_errors::AuthServiceError;
use crate::services::errors::user_service_errors::UserServiceError;
use crate::services::user_service::UserService;

/// Ties users to sessions. Every session it hands out lives for `session_ttl`
/// unless refreshed.
pub struct AuthService {
    user_service: Arc<UserService>,
    session_repository: Arc<dyn SessionRepository + Send + Sync>,
    session_ttl: Duration,
}

fn map_session_error(error: SessionRepositoryError) -> AuthServiceError {
    match error {
        SessionRepositoryError::NotFound => AuthServiceError::SessionNotFound,
        SessionRepositoryError::Expired => AuthServiceError::SessionExpired,
        _ => AuthServiceError::SessionError(error.to_string()),
    }
}

impl AuthService {
    pub fn new(
        user_service: Arc<UserService>,
        session_repository: Arc<dyn SessionRepository + Send + Sync>,
        session_ttl: Duration,
    ) -> Self {
        AuthService {
            user_service,
            session_repository,
            session_ttl,
        }
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    async fn open_session(&self, user_id: &str) -> Result<Session, AuthServiceError> {
        let session = Session::new(user_id, self.session_ttl)
            .map_err(|e| AuthServiceError::SessionError(e.to_string()))?;
        self.session_repository
            .save(&session)
            .await
            .map_err(map_session_error)?;
        Ok(session)
    }

    pub async fn signup(&self, username: &str, password: &str) -> Result<AuthResponse, AuthServiceError> {
        if username.is_empty() || password.is_empty() {
            return Err(AuthServiceError::ValidationError(
                "Username and password are required".to_string(),
            ));
        }

        let user = self.user_service.create_user(username, password).await?;
        let session = self.open_session(&user.id).await?;
        info!("User {} signed up", user.id);

        Ok(AuthResponse {
            message: "User created successfully".to_string(),
            user_id: user.id.clone(),
            session_id: session.id,
            user: user.profile(),
        })
    }

    pub async fn signin(&self, username: &str, password: &str) -> Result<AuthResponse, AuthServiceError> {
        if username.is_empty() || password.is_empty() {
            return Err(AuthServiceError::ValidationError(
                "Username and password are required".to_string(),
            ));
        }

        // Unknown usernames and wrong passwords are indistinguishable to the caller.
        let user = match self.user_service.get_user_by_username(username).await {
            Ok(user) => user,
            Err(UserServiceError::UserNotFound) => return Err(AuthServiceError::InvalidCredentials),
            Err(e) => return Err(e.into()),
        };
        if !user.verify_password(password) {
            debug!("Rejected sign-in for user {}", user.id);
            return Err(AuthServiceError::InvalidCredentials);
        }

        let session = self.open_session(&user.id).await?;
        info!("User {} signed in", user.id);

        Ok(AuthResponse {
            message: "Signed in successfully".to_string(),
            user_id: user.id.clone(),
            session_id: session.id,
            user: user.profile(),
        })
    }

    pub async fn logout(&self, session_id: &str) -> Result<(), AuthServiceError> {
        if session_id.is_empty() {
            return Err(AuthServiceError::ValidationError(
                "Session ID cannot be empty".to_string(),
            ));
        }
        self.session_repository
            .delete(session_id)
            .await
            .map_err(map_session_error)
    }

    /// Resolves a session to its owner's id.
    pub async fn validate_session(&self, session_id: &str) -> Result<String, AuthServiceError> {
        if session_id.is_empty() {
            return Err(AuthServiceError::SessionNotFound);
        }
        let session = self
            .session_repository
            .find_by_id(session_id)
            .await
            .map_err(map_session_error)?;
        Ok(session.user_id)
    }

    pub async fn get_current_user(&self, session_id: &str) -> Result<User, AuthServiceError> {
        let user_id = self.validate_session(session_id).await?;
        match self.user_service.get_user_by_id(&user_id).await {
            Ok(user) => Ok(user),
            Err(UserServiceError::UserNotFound) => {
                // The account is gone but its session outlived it.
                warn!("Session for missing user {} is still live", user_id);
                Err(AuthServiceError::SessionNotFound)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn refresh_session(&self, session_id: &str) -> Result<Session, AuthServiceError> {
        if session_id.is_empty() {
            return Err(AuthServiceError::SessionNotFound);
        }
        self.session_repository
            .refresh(session_id, self.session_ttl)
            .await
            .map_err(map_session_error)
    }

    pub async fn change_password(
        &self,
        user_id: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AuthServiceError> {
        self.user_service
            .change_password(user_id, old_password, new_password)
            .await?;
        Ok(())
    }

    /// The user's live sessions, newest first.
    pub async fn list_sessions(&self, user_id: &str) -> Result<Vec<Session>, AuthServiceError> {
        let mut sessions = self
            .session_repository
            .find_by_user_id(user_id)
            .await
            .map_err(map_session_error)?;
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions)
    }

    pub async fn get_user_by_id(&self, user_id: &str) -> Result<User, AuthServiceError> {
        Ok(self.user_service.get_user_by_id(user_id).await?)
    }

    pub async fn delete_user(&self, user_id: &str) -> Result<(), AuthServiceError> {
        let removed = self
            .session_repository
            .delete_by_user_id(user_id)
            .await
            .map_err(map_session_error)?;
        self.user_service.delete_user(user_id).await?;
        info!("Deleted user {} and {} sessions", user_id, removed);
        Ok(())
    }
}
