use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::WithRejection;
use lambda_http::tracing::error;

use crate::middleware::auth::AuthenticatedUser;
use crate::{error::ApiError, response::ApiResponse, state::AppState};
use shared::models::game::requests::{FinishGameRequest, MakeMoveRequest, Pagination, PaginationQuery};
use shared::models::game::responses::{GameListResponse, GameResponse, PlayerStats};
use shared::models::game::{Game, Move};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/create", post(create_game))
        .route("/join/{game_id}", post(join_game))
        .route("/my-games", get(my_games))
        .route("/waiting", get(waiting_games))
        .route("/active", get(active_games))
        .route("/stats", get(player_stats))
        .route("/{game_id}", get(get_game).delete(delete_game))
        .route("/{game_id}/move", post(make_move))
        .route("/{game_id}/resign", post(resign_game))
        .route("/{game_id}/finish", post(finish_game))
        .route("/{game_id}/history", get(game_history))
}

async fn create_game(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<(StatusCode, Json<ApiResponse<GameResponse>>), ApiError> {
    let game = state
        .game_service
        .create_game(&user.user_id)
        .await
        .map_err(|e| {
            error!("Failed to create game for {}: {}", user.user_id, e);
            ApiError::from(e)
        })?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::success(
            "Game created successfully",
            GameResponse::new("Game created, waiting for opponent", game),
        ),
    ))
}

async fn join_game(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(game_id): Path<String>,
) -> Result<Json<ApiResponse<GameResponse>>, ApiError> {
    let game = state.game_service.join_game(&game_id, &user.user_id).await?;
    Ok(ApiResponse::success(
        "Joined game successfully",
        GameResponse::new("Game started", game),
    ))
}

async fn get_game(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(game_id): Path<String>,
) -> Result<Json<ApiResponse<Game>>, ApiError> {
    let game = state.game_service.get_game(&game_id, &user.user_id).await?;
    Ok(ApiResponse::success("Game retrieved successfully", game))
}

async fn make_move(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(game_id): Path<String>,
    WithRejection(Json(request), _): WithRejection<Json<MakeMoveRequest>, ApiError>,
) -> Result<Json<ApiResponse<GameResponse>>, ApiError> {
    let game = state
        .game_service
        .make_move(&game_id, &user.user_id, &request)
        .await?;
    Ok(ApiResponse::success(
        "Move made successfully",
        GameResponse::new("Move recorded", game),
    ))
}

async fn resign_game(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(game_id): Path<String>,
) -> Result<Json<ApiResponse<GameResponse>>, ApiError> {
    let game = state
        .game_service
        .resign_game(&game_id, &user.user_id)
        .await?;
    Ok(ApiResponse::success(
        "Game resigned successfully",
        GameResponse::new("Player resigned", game),
    ))
}

async fn finish_game(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(game_id): Path<String>,
    WithRejection(Json(request), _): WithRejection<Json<FinishGameRequest>, ApiError>,
) -> Result<Json<ApiResponse<GameResponse>>, ApiError> {
    let game = state
        .game_service
        .finish_game(&game_id, &user.user_id, request.result)
        .await?;
    Ok(ApiResponse::success(
        "Game finished successfully",
        GameResponse::new("Game over", game),
    ))
}

async fn game_history(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(game_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<Move>>>, ApiError> {
    let moves = state
        .game_service
        .get_game_history(&game_id, &user.user_id)
        .await?;
    Ok(ApiResponse::success("Game history retrieved successfully", moves))
}

async fn my_games(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<GameListResponse>>, ApiError> {
    let games = state
        .game_service
        .list_player_games(&user.user_id, Pagination::from(query))
        .await?;
    Ok(ApiResponse::success("Games retrieved successfully", games))
}

async fn waiting_games(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<GameListResponse>>, ApiError> {
    let games = state
        .game_service
        .list_waiting_games(Pagination::from(query))
        .await?;
    Ok(ApiResponse::success("Waiting games retrieved successfully", games))
}

async fn active_games(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<GameListResponse>>, ApiError> {
    let games = state
        .game_service
        .list_active_games(Pagination::from(query))
        .await?;
    Ok(ApiResponse::success("Active games retrieved successfully", games))
}

async fn player_stats(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<PlayerStats>>, ApiError> {
    let stats = state.game_service.get_player_stats(&user.user_id).await?;
    Ok(ApiResponse::success("Player stats retrieved successfully", stats))
}

async fn delete_game(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(game_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .game_service
        .delete_game(&game_id, &user.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
