use std::sync::Arc;

use tracing::debug;

use crate::models::user::{User, UserError};
use crate::repositories::errors::user_repository_errors::UserRepositoryError;
use crate::repositories::user_repository::UserRepository;
use crate::services::errors::user_service_errors::UserServiceError;

pub const MIN_USERNAME_LENGTH: usize = 3;

pub struct UserService {
    repository: Arc<dyn UserRepository + Send + Sync>,
}

impl From<UserError> for UserServiceError {
    fn from(error: UserError) -> Self {
        match error {
            UserError::Validation(msg) => UserServiceError::ValidationError(msg),
            UserError::Hashing(msg) => UserServiceError::PasswordHashing(msg),
        }
    }
}

fn map_repository_error(error: UserRepositoryError) -> UserServiceError {
    match error {
        UserRepositoryError::NotFound => UserServiceError::UserNotFound,
        UserRepositoryError::AlreadyExists => UserServiceError::UserAlreadyExists,
        _ => UserServiceError::RepositoryError(error.to_string()),
    }
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository + Send + Sync>) -> Self {
        UserService { repository }
    }

    pub async fn create_user(&self, username: &str, password: &str) -> Result<User, UserServiceError> {
        if username.is_empty() || password.is_empty() {
            return Err(UserServiceError::ValidationError(
                "Username and password cannot be empty".to_string(),
            ));
        }
        if username.chars().count() < MIN_USERNAME_LENGTH {
            return Err(UserServiceError::ValidationError(format!(
                "Username must be at least {} characters",
                MIN_USERNAME_LENGTH
            )));
        }
        // The username index cannot enforce uniqueness, so two concurrent signups may both pass this.
        if self
            .repository
            .username_exists(username)
            .await
            .map_err(map_repository_error)?
        {
            return Err(UserServiceError::UserAlreadyExists);
        }

        let user = User::new(username, password)?;
        self.repository
            .create_user(&user)
            .await
            .map_err(map_repository_error)?;

        debug!("Created user {}", user.id);
        Ok(user)
    }

    pub async fn get_user_by_id(&self, user_id: &str) -> Result<User, UserServiceError> {
        if user_id.is_empty() {
            return Err(UserServiceError::ValidationError(
                "User ID cannot be empty".to_string(),
            ));
        }
        self.repository
            .get_user_by_id(user_id)
            .await
            .map_err(map_repository_error)
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<User, UserServiceError> {
        if username.is_empty() {
            return Err(UserServiceError::ValidationError(
                "Username cannot be empty".to_string(),
            ));
        }
        self.repository
            .get_user_by_username(username)
            .await
            .map_err(map_repository_error)
    }

    pub async fn change_password(
        &self,
        user_id: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), UserServiceError> {
        if old_password.is_empty() || new_password.is_empty() {
            return Err(UserServiceError::ValidationError(
                "Old and new password cannot be empty".to_string(),
            ));
        }

        let mut user = self.get_user_by_id(user_id).await?;
        if !user.verify_password(old_password) {
            return Err(UserServiceError::InvalidPassword);
        }

        user.update_password(new_password)?;
        self.repository
            .update_user(&user)
            .await
            .map_err(map_repository_error)
    }

    pub async fn delete_user(&self, user_id: &str) -> Result<(), UserServiceError> {
        if user_id.is_empty() {
            return Err(UserServiceError::ValidationError(
                "User ID cannot be empty".to_string(),
            ));
        }
        self.repository
            .delete_user(user_id)
            .await
            .map_err(map_repository_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::user_repository::MockUserRepository;
    use mockall::predicate::eq;

    fn service(repo: MockUserRepository) -> UserService {
        UserService::new(Arc::new(repo))
    }

    #[tokio::test]
    async fn test_create_user_success() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo
            .expect_username_exists()
            .with(eq("magnus"))
            .times(1)
            .returning(|_| Ok(false));
        mock_repo
            .expect_create_user()
            .withf(|user| user.username == "magnus" && user.password_hash != "secret1")
            .times(1)
            .returning(|_| Ok(()));

        let user = service(mock_repo)
            .create_user("magnus", "secret1")
            .await
            .unwrap();

        assert_eq!(user.username, "magnus");
        assert!(user.verify_password("secret1"));
    }

    #[tokio::test]
    async fn test_create_user_rejects_short_username() {
        let mock_repo = MockUserRepository::new();

        let result = service(mock_repo).create_user("ab", "secret1").await;

        assert!(matches!(result, Err(UserServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_create_user_rejects_short_password() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo.expect_username_exists().returning(|_| Ok(false));
        mock_repo.expect_create_user().never();

        let result = service(mock_repo).create_user("magnus", "123").await;

        assert!(matches!(result, Err(UserServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_create_user_duplicate_username() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo.expect_username_exists().returning(|_| Ok(true));
        mock_repo.expect_create_user().never();

        let result = service(mock_repo).create_user("magnus", "secret1").await;

        assert!(matches!(result, Err(UserServiceError::UserAlreadyExists)));
    }

    #[tokio::test]
    async fn test_get_user_by_id_not_found() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo
            .expect_get_user_by_id()
            .returning(|_| Err(UserRepositoryError::NotFound));

        let result = service(mock_repo).get_user_by_id("missing").await;

        assert!(matches!(result, Err(UserServiceError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_get_user_by_username_empty() {
        let result = service(MockUserRepository::new())
            .get_user_by_username("")
            .await;

        assert!(matches!(result, Err(UserServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_change_password_success() {
        let user = User::new("magnus", "secret1").unwrap();
        let user_id = user.id.clone();

        let mut mock_repo = MockUserRepository::new();
        mock_repo
            .expect_get_user_by_id()
            .with(eq(user_id.clone()))
            .returning(move |_| Ok(user.clone()));
        mock_repo
            .expect_update_user()
            .withf(|user| user.verify_password("newsecret"))
            .times(1)
            .returning(|_| Ok(()));

        service(mock_repo)
            .change_password(&user_id, "secret1", "newsecret")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_change_password_wrong_old_password() {
        let user = User::new("magnus", "secret1").unwrap();

        let mut mock_repo = MockUserRepository::new();
        mock_repo
            .expect_get_user_by_id()
            .returning(move |_| Ok(user.clone()));
        mock_repo.expect_update_user().never();

        let result = service(mock_repo)
            .change_password("any", "wrong-password", "newsecret")
            .await;

        assert!(matches!(result, Err(UserServiceError::InvalidPassword)));
    }

    #[tokio::test]
    async fn test_delete_user_not_found() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo
            .expect_delete_user()
            .returning(|_| Err(UserRepositoryError::NotFound));

        let result = service(mock_repo).delete_user("missing").await;

        assert!(matches!(result, Err(UserServiceError::UserNotFound)));
    }
}
