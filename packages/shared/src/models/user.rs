use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Debug, Error, PartialEq)]
pub enum UserError {
    #[error("{0}")]
    Validation(String),
    #[error("failed to hash password: {0}")]
    Hashing(String),
}

/// A registered player. Persisted as-is; use [`UserProfile`] for anything
/// that leaves the service.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public view of a user, without the password hash.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: &str, password: &str) -> Result<Self, UserError> {
        if username.is_empty() {
            return Err(UserError::Validation(
                "username cannot be empty".to_string(),
            ));
        }
        validate_password(password)?;

        let now = Utc::now();
        Ok(User {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            password_hash: hash_password(password)?,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn verify_password(&self, candidate: &str) -> bool {
        match PasswordHash::new(&self.password_hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(candidate.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }

    pub fn update_password(&mut self, new_password: &str) -> Result<(), UserError> {
        validate_password(new_password)?;
        self.password_hash = hash_password(new_password)?;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        !self.username.is_empty() && !self.password_hash.is_empty()
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile::from(self)
    }
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        UserProfile {
            id: user.id.clone(),
            username: user.username.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

fn validate_password(password: &str) -> Result<(), UserError> {
    if password.is_empty() {
        return Err(UserError::Validation(
            "password cannot be empty".to_string(),
        ));
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(UserError::Validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

fn hash_password(password: &str) -> Result<String, UserError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| UserError::Hashing(e.to_string()))
}
