#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use api::{create_app, AppState};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::Value;
use shared::models::game::{Game, GameStatus};
use shared::models::session::Session;
use shared::models::user::User;
use shared::repositories::errors::game_repository_errors::GameRepositoryError;
use shared::repositories::errors::session_repository_errors::SessionRepositoryError;
use shared::repositories::errors::user_repository_errors::UserRepositoryError;
use shared::repositories::game_repository::GameRepository;
use shared::repositories::session_repository::SessionRepository;
use shared::repositories::user_repository::UserRepository;
use shared::services::auth_service::AuthService;
use shared::services::game_service::GameService;
use shared::services::user_service::UserService;
use tokio::sync::RwLock;
use tower::ServiceExt;

// In-memory stand-ins for the DynamoDB repositories
pub mod mocks {
    use super::*;

    #[derive(Clone, Default)]
    pub struct InMemoryUserRepository {
        users: Arc<RwLock<HashMap<String, User>>>,
    }

    #[async_trait]
    impl UserRepository for InMemoryUserRepository {
        async fn create_user(&self, user: &User) -> Result<(), UserRepositoryError> {
            let mut users = self.users.write().await;
            if users.contains_key(&user.id) {
                return Err(UserRepositoryError::AlreadyExists);
            }
            users.insert(user.id.clone(), user.clone());
            Ok(())
        }

        async fn get_user_by_id(&self, user_id: &str) -> Result<User, UserRepositoryError> {
            let users = self.users.read().await;
            users
                .get(user_id)
                .cloned()
                .ok_or(UserRepositoryError::NotFound)
        }

        async fn get_user_by_username(&self, username: &str) -> Result<User, UserRepositoryError> {
            let users = self.users.read().await;
            users
                .values()
                .find(|user| user.username == username)
                .cloned()
                .ok_or(UserRepositoryError::NotFound)
        }

        async fn update_user(&self, user: &User) -> Result<(), UserRepositoryError> {
            let mut users = self.users.write().await;
            match users.get_mut(&user.id) {
                Some(stored) => {
                    *stored = user.clone();
                    Ok(())
                }
                None => Err(UserRepositoryError::NotFound),
            }
        }

        async fn delete_user(&self, user_id: &str) -> Result<(), UserRepositoryError> {
            let mut users = self.users.write().await;
            users
                .remove(user_id)
                .map(|_| ())
                .ok_or(UserRepositoryError::NotFound)
        }

        async fn username_exists(&self, username: &str) -> Result<bool, UserRepositoryError> {
            let users = self.users.read().await;
            Ok(users.values().any(|user| user.username == username))
        }
    }

    #[derive(Clone, Default)]
    pub struct InMemorySessionRepository {
        sessions: Arc<RwLock<HashMap<String, Session>>>,
    }

    impl InMemorySessionRepository {
        /// Backdates a session so it reads as expired.
        pub async fn expire(&self, session_id: &str) {
            let mut sessions = self.sessions.write().await;
            if let Some(session) = sessions.get_mut(session_id) {
                session.expires_at = Utc::now() - Duration::seconds(1);
            }
        }

        pub async fn contains(&self, session_id: &str) -> bool {
            self.sessions.read().await.contains_key(session_id)
        }

        pub async fn get(&self, session_id: &str) -> Option<Session> {
            self.sessions.read().await.get(session_id).cloned()
        }
    }

    #[async_trait]
    impl SessionRepository for InMemorySessionRepository {
        async fn save(&self, session: &Session) -> Result<(), SessionRepositoryError> {
            if !session.is_valid() {
                return Err(SessionRepositoryError::Invalid("invalid session".to_string()));
            }
            let mut sessions = self.sessions.write().await;
            sessions.insert(session.id.clone(), session.clone());
            Ok(())
        }

        async fn find_by_id(&self, session_id: &str) -> Result<Session, SessionRepositoryError> {
            let mut sessions = self.sessions.write().await;
            match sessions.get(session_id).cloned() {
                Some(session) if session.is_expired() => {
                    sessions.remove(session_id);
                    Err(SessionRepositoryError::Expired)
                }
                Some(session) => Ok(session),
                None => Err(SessionRepositoryError::NotFound),
            }
        }

        async fn find_by_user_id(
            &self,
            user_id: &str,
        ) -> Result<Vec<Session>, SessionRepositoryError> {
            let mut sessions = self.sessions.write().await;
            sessions.retain(|_, session| !(session.user_id == user_id && session.is_expired()));
            Ok(sessions
                .values()
                .filter(|session| session.user_id == user_id)
                .cloned()
                .collect())
        }

        async fn delete(&self, session_id: &str) -> Result<(), SessionRepositoryError> {
            self.sessions.write().await.remove(session_id);
            Ok(())
        }

        async fn delete_by_user_id(&self, user_id: &str) -> Result<usize, SessionRepositoryError> {
            let mut sessions = self.sessions.write().await;
            let before = sessions.len();
            sessions.retain(|_, session| session.user_id != user_id);
            Ok(before - sessions.len())
        }

        async fn refresh(
            &self,
            session_id: &str,
            ttl: Duration,
        ) -> Result<Session, SessionRepositoryError> {
            let mut session = self.find_by_id(session_id).await?;
            session.refresh(ttl);
            let mut sessions = self.sessions.write().await;
            match sessions.get_mut(session_id) {
                Some(stored) => {
                    *stored = session.clone();
                    Ok(session)
                }
                None => Err(SessionRepositoryError::NotFound),
            }
        }

        async fn cleanup(&self) -> Result<usize, SessionRepositoryError> {
            let mut sessions = self.sessions.write().await;
            let before = sessions.len();
            sessions.retain(|_, session| !session.is_expired());
            Ok(before - sessions.len())
        }

        async fn count(&self) -> Result<i64, SessionRepositoryError> {
            let sessions = self.sessions.read().await;
            Ok(sessions.values().filter(|s| !s.is_expired()).count() as i64)
        }
    }

    #[derive(Clone, Default)]
    pub struct InMemoryGameRepository {
        games: Arc<RwLock<HashMap<String, Game>>>,
    }

    #[async_trait]
    impl GameRepository for InMemoryGameRepository {
        async fn create_game(&self, game: &Game) -> Result<(), GameRepositoryError> {
            self.games
                .write()
                .await
                .insert(game.id.clone(), game.clone());
            Ok(())
        }

        async fn get_game(&self, game_id: &str) -> Result<Game, GameRepositoryError> {
            self.games
                .read()
                .await
                .get(game_id)
                .cloned()
                .ok_or(GameRepositoryError::NotFound)
        }

        async fn update_game(&self, game: &Game) -> Result<(), GameRepositoryError> {
            let mut games = self.games.write().await;
            match games.get_mut(&game.id) {
                Some(stored) => {
                    *stored = game.clone();
                    Ok(())
                }
                None => Err(GameRepositoryError::NotFound),
            }
        }

        async fn delete_game(&self, game_id: &str) -> Result<(), GameRepositoryError> {
            self.games
                .write()
                .await
                .remove(game_id)
                .map(|_| ())
                .ok_or(GameRepositoryError::NotFound)
        }

        async fn find_by_player(&self, player_id: &str) -> Result<Vec<Game>, GameRepositoryError> {
            let games = self.games.read().await;
            Ok(games
                .values()
                .filter(|game| game.is_player_in_game(player_id))
                .cloned()
                .collect())
        }

        async fn find_by_status(&self, status: GameStatus) -> Result<Vec<Game>, GameRepositoryError> {
            let games = self.games.read().await;
            Ok(games
                .values()
                .filter(|game| game.status == status)
                .cloned()
                .collect())
        }

        async fn count_by_status(&self, status: GameStatus) -> Result<i64, GameRepositoryError> {
            Ok(self.find_by_status(status).await?.len() as i64)
        }

        async fn count_by_player(&self, player_id: &str) -> Result<i64, GameRepositoryError> {
            Ok(self.find_by_player(player_id).await?.len() as i64)
        }
    }
}

pub struct TestApp {
    pub router: Router,
    pub sessions: mocks::InMemorySessionRepository,
    pub games: mocks::InMemoryGameRepository,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    /// The `session_id=...` pair from a `Set-Cookie` header, if any.
    pub fn session_cookie(&self) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find(|value| value.starts_with("session_id="))
            .map(str::to_string)
    }
}

pub fn create_test_app() -> TestApp {
    let sessions = mocks::InMemorySessionRepository::default();
    let games = mocks::InMemoryGameRepository::default();

    let user_service = Arc::new(UserService::new(Arc::new(
        mocks::InMemoryUserRepository::default(),
    )));
    let auth_service = Arc::new(AuthService::new(
        user_service,
        Arc::new(sessions.clone()),
        Duration::hours(24),
    ));
    let game_service = Arc::new(GameService::new(Arc::new(games.clone())));

    let router = create_app(AppState {
        auth_service,
        game_service,
        cookie_secure: false,
    });

    TestApp {
        router,
        sessions,
        games,
    }
}

impl TestApp {
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        session_id: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(session_id) = session_id {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", session_id));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Signs up a user and returns `(user_id, session_id)`.
    pub async fn signup(&self, username: &str, password: &str) -> (String, String) {
        let response = self
            .request(
                Method::POST,
                "/api/auth/signup",
                None,
                Some(serde_json::json!({ "username": username, "password": password })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);

        let data = response.data();
        (
            data["user_id"].as_str().unwrap().to_string(),
            data["session_id"].as_str().unwrap().to_string(),
        )
    }
}
