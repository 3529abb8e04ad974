use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use axum_extra::extract::{CookieJar, WithRejection};
use lambda_http::tracing::{debug, error, info};
use serde_json::{json, Value};

use crate::cookies::{clear_session_cookie, session_cookie};
use crate::middleware::auth::{AuthenticatedUser, SessionToken};
use crate::{error::ApiError, response::ApiResponse, state::AppState};
use shared::models::auth::requests::{ChangePasswordRequest, SigninRequest, SignupRequest};
use shared::models::auth::responses::{AuthResponse, CurrentUserResponse, SessionSummary};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/refresh", post(refresh))
        .route("/password", put(change_password))
        .route("/user", delete(delete_account))
        .route("/sessions", get(list_sessions))
}

async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(request), _): WithRejection<Json<SignupRequest>, ApiError>,
) -> Result<(StatusCode, CookieJar, Json<ApiResponse<AuthResponse>>), ApiError> {
    let response = state
        .auth_service
        .signup(&request.username, &request.password)
        .await
        .map_err(|e| {
            error!("Failed to sign up {}: {}", request.username, e);
            ApiError::from(e)
        })?;

    let cookie = session_cookie(
        response.session_id.clone(),
        state.auth_service.session_ttl(),
        state.cookie_secure,
    );
    Ok((
        StatusCode::CREATED,
        jar.add(cookie),
        ApiResponse::success("User created successfully", response),
    ))
}

async fn signin(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(request), _): WithRejection<Json<SigninRequest>, ApiError>,
) -> Result<(CookieJar, Json<ApiResponse<AuthResponse>>), ApiError> {
    let response = state
        .auth_service
        .signin(&request.username, &request.password)
        .await
        .map_err(|e| {
            debug!("Sign-in failed for {}: {}", request.username, e);
            ApiError::from(e)
        })?;

    let cookie = session_cookie(
        response.session_id.clone(),
        state.auth_service.session_ttl(),
        state.cookie_secure,
    );
    Ok((
        jar.add(cookie),
        ApiResponse::success("Signed in successfully", response),
    ))
}

async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    SessionToken(session_id): SessionToken,
) -> Result<(CookieJar, Json<ApiResponse<()>>), ApiError> {
    state.auth_service.logout(&session_id).await?;
    Ok((
        clear_session_cookie(jar, state.cookie_secure),
        ApiResponse::message("Logged out successfully"),
    ))
}

async fn me(
    State(state): State<AppState>,
    SessionToken(session_id): SessionToken,
) -> Result<Json<ApiResponse<CurrentUserResponse>>, ApiError> {
    let user = state.auth_service.get_current_user(&session_id).await?;
    Ok(ApiResponse::success(
        "User retrieved successfully",
        CurrentUserResponse {
            authenticated: true,
            user: user.profile(),
        },
    ))
}

async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
    SessionToken(session_id): SessionToken,
) -> Result<(CookieJar, Json<ApiResponse<Value>>), ApiError> {
    let session = state.auth_service.refresh_session(&session_id).await?;

    let cookie = session_cookie(session.id.clone(), session.ttl(), state.cookie_secure);
    Ok((
        jar.add(cookie),
        ApiResponse::success(
            "Session refreshed successfully",
            json!({
                "expires_at": session.expires_at,
                "expires_in": session.ttl_seconds,
            }),
        ),
    ))
}

async fn change_password(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    WithRejection(Json(request), _): WithRejection<Json<ChangePasswordRequest>, ApiError>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state
        .auth_service
        .change_password(&user.user_id, &request.old_password, &request.new_password)
        .await?;
    info!("Password changed for user {}", user.user_id);
    Ok(ApiResponse::message("Password changed successfully"))
}

async fn delete_account(
    State(state): State<AppState>,
    jar: CookieJar,
    user: AuthenticatedUser,
) -> Result<(CookieJar, Json<ApiResponse<()>>), ApiError> {
    state
        .auth_service
        .delete_user(&user.user_id)
        .await
        .map_err(|e| {
            error!("Failed to delete user {}: {}", user.user_id, e);
            ApiError::from(e)
        })?;
    Ok((
        clear_session_cookie(jar, state.cookie_secure),
        ApiResponse::message("User deleted successfully"),
    ))
}

async fn list_sessions(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<Vec<SessionSummary>>>, ApiError> {
    let sessions = state.auth_service.list_sessions(&user.user_id).await?;
    let summaries = sessions
        .iter()
        .map(|session| SessionSummary::from_session(session, &user.session_id))
        .collect();
    Ok(ApiResponse::success("Sessions retrieved successfully", summaries))
}
