use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use axum_extra::extract::CookieJar;

use crate::{cookies::SESSION_COOKIE, error::ApiError, state::AppState};

/// The raw session token from the `session_id` cookie, or failing that from an
/// `Authorization: Bearer` header. Not checked against the store.
#[derive(Debug, Clone)]
pub struct SessionToken(pub String);

/// A caller whose session token resolved to a live session.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub session_id: String,
}

fn token_from_parts(parts: &Parts) -> Option<String> {
    let jar = CookieJar::from_headers(&parts.headers);
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

impl FromRequestParts<AppState> for SessionToken {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        token_from_parts(parts)
            .map(SessionToken)
            .ok_or(ApiError::Unauthorized)
    }
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let SessionToken(session_id) = SessionToken::from_request_parts(parts, state).await?;
        let user_id = state.auth_service.validate_session(&session_id).await?;

        Ok(AuthenticatedUser {
            user_id,
            session_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_token_from_cookie() {
        let parts = parts(&[("cookie", "theme=dark; session_id=abc123")]);
        assert_eq!(token_from_parts(&parts), Some("abc123".to_string()));
    }

    #[test]
    fn test_token_from_bearer_header() {
        let parts = parts(&[("authorization", "Bearer xyz")]);
        assert_eq!(token_from_parts(&parts), Some("xyz".to_string()));
    }

    #[test]
    fn test_cookie_wins_over_header() {
        let parts = parts(&[("cookie", "session_id=from-cookie"), ("authorization", "Bearer from-header")]);
        assert_eq!(token_from_parts(&parts), Some("from-cookie".to_string()));
    }

    #[test]
    fn test_missing_or_malformed_token() {
        assert_eq!(token_from_parts(&parts(&[])), None);
        assert_eq!(token_from_parts(&parts(&[("authorization", "Basic abc")])), None);
        assert_eq!(token_from_parts(&parts(&[("authorization", "Bearer ")])), None);
    }
}
