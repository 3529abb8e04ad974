use std::sync::Arc;

use tracing::{debug, info};

use crate::models::game::requests::{MakeMoveRequest, Pagination};
use crate::models::game::responses::{GameListResponse, PlayerStats};
use crate::models::game::{Game, GameError, GameResult, GameStatus, Move};
use crate::repositories::errors::game_repository_errors::GameRepositoryError;
use crate::repositories::game_repository::GameRepository;
use crate::services::errors::game_service_errors::GameServiceError;

pub struct GameService {
    repository: Arc<dyn GameRepository + Send + Sync>,
}

fn map_repository_error(error: GameRepositoryError) -> GameServiceError {
    match error {
        GameRepositoryError::NotFound => GameServiceError::GameNotFound,
        _ => GameServiceError::RepositoryError(error.to_string()),
    }
}

/// Newest first, then the requested page.
fn paginate(mut games: Vec<Game>, pagination: Pagination) -> Vec<Game> {
    games.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    games
        .into_iter()
        .skip(pagination.offset())
        .take(pagination.limit as usize)
        .collect()
}

fn require_id(value: &str, what: &str) -> Result<(), GameServiceError> {
    if value.is_empty() {
        return Err(GameServiceError::ValidationError(format!(
            "{} cannot be empty",
            what
        )));
    }
    Ok(())
}

impl GameService {
    pub fn new(repository: Arc<dyn GameRepository + Send + Sync>) -> Self {
        GameService { repository }
    }

    async fn load(&self, game_id: &str) -> Result<Game, GameServiceError> {
        require_id(game_id, "Game ID")?;
        self.repository
            .get_game(game_id)
            .await
            .map_err(map_repository_error)
    }

    async fn load_for_participant(
        &self,
        game_id: &str,
        player_id: &str,
    ) -> Result<Game, GameServiceError> {
        let game = self.load(game_id).await?;
        if !game.is_player_in_game(player_id) {
            return Err(GameError::NotParticipant.into());
        }
        Ok(game)
    }

    async fn save(&self, game: &Game) -> Result<(), GameServiceError> {
        self.repository
            .update_game(game)
            .await
            .map_err(map_repository_error)
    }

    pub async fn create_game(&self, player_id: &str) -> Result<Game, GameServiceError> {
        require_id(player_id, "Player ID")?;
        let game = Game::new(player_id)?;
        self.repository
            .create_game(&game)
            .await
            .map_err(map_repository_error)?;
        info!("Player {} created game {}", player_id, game.id);
        Ok(game)
    }

    pub async fn join_game(&self, game_id: &str, player_id: &str) -> Result<Game, GameServiceError> {
        require_id(player_id, "Player ID")?;
        let mut game = self.load(game_id).await?;
        game.join(player_id)?;
        self.save(&game).await?;
        info!("Player {} joined game {}", player_id, game.id);
        Ok(game)
    }

    /// Only the two players may look at a game.
    pub async fn get_game(&self, game_id: &str, player_id: &str) -> Result<Game, GameServiceError> {
        self.load_for_participant(game_id, player_id).await
    }

    pub async fn make_move(
        &self,
        game_id: &str,
        player_id: &str,
        request: &MakeMoveRequest,
    ) -> Result<Game, GameServiceError> {
        if request.from.is_empty() || request.to.is_empty() {
            return Err(GameServiceError::ValidationError(
                "Move requires both from and to squares".to_string(),
            ));
        }

        let mut game = self.load_for_participant(game_id, player_id).await?;
        game.make_move(
            player_id,
            &request.from,
            &request.to,
            &request.piece,
            &request.notation,
        )?;
        self.save(&game).await?;
        debug!(
            "Player {} moved {}-{} in game {}",
            player_id, request.from, request.to, game.id
        );
        Ok(game)
    }

    pub async fn resign_game(&self, game_id: &str, player_id: &str) -> Result<Game, GameServiceError> {
        let mut game = self.load_for_participant(game_id, player_id).await?;
        game.resign(player_id)?;
        self.save(&game).await?;
        info!("Player {} resigned game {}", player_id, game.id);
        Ok(game)
    }

    pub async fn finish_game(
        &self,
        game_id: &str,
        player_id: &str,
        result: GameResult,
    ) -> Result<Game, GameServiceError> {
        let mut game = self.load_for_participant(game_id, player_id).await?;
        game.finish(result)?;
        self.save(&game).await?;
        info!("Game {} finished: {:?}", game.id, result);
        Ok(game)
    }

    pub async fn list_player_games(
        &self,
        player_id: &str,
        pagination: Pagination,
    ) -> Result<GameListResponse, GameServiceError> {
        require_id(player_id, "Player ID")?;
        let (games, total) = tokio::try_join!(
            self.repository.find_by_player(player_id),
            self.repository.count_by_player(player_id),
        )
        .map_err(map_repository_error)?;

        Ok(GameListResponse {
            games: paginate(games, pagination),
            total,
            page: pagination.page,
            limit: pagination.limit,
        })
    }

    async fn list_by_status(
        &self,
        status: GameStatus,
        pagination: Pagination,
    ) -> Result<GameListResponse, GameServiceError> {
        let (games, total) = tokio::try_join!(
            self.repository.find_by_status(status),
            self.repository.count_by_status(status),
        )
        .map_err(map_repository_error)?;

        Ok(GameListResponse {
            games: paginate(games, pagination),
            total,
            page: pagination.page,
            limit: pagination.limit,
        })
    }

    pub async fn list_waiting_games(
        &self,
        pagination: Pagination,
    ) -> Result<GameListResponse, GameServiceError> {
        self.list_by_status(GameStatus::Waiting, pagination).await
    }

    pub async fn list_active_games(
        &self,
        pagination: Pagination,
    ) -> Result<GameListResponse, GameServiceError> {
        self.list_by_status(GameStatus::Active, pagination).await
    }

    pub async fn get_game_history(
        &self,
        game_id: &str,
        player_id: &str,
    ) -> Result<Vec<Move>, GameServiceError> {
        let game = self.load_for_participant(game_id, player_id).await?;
        Ok(game.moves)
    }

    pub async fn is_player_in_game(
        &self,
        game_id: &str,
        player_id: &str,
    ) -> Result<bool, GameServiceError> {
        let game = self.load(game_id).await?;
        Ok(game.is_player_in_game(player_id))
    }

    pub async fn get_player_stats(&self, player_id: &str) -> Result<PlayerStats, GameServiceError> {
        require_id(player_id, "Player ID")?;
        let games = self
            .repository
            .find_by_player(player_id)
            .await
            .map_err(map_repository_error)?;

        let mut stats = PlayerStats {
            total_games: games.len(),
            ..PlayerStats::default()
        };
        for game in &games {
            match game.status {
                GameStatus::Active => stats.active_games += 1,
                GameStatus::Finished => {
                    let won = match game.result {
                        Some(GameResult::WhiteWins) => Some(game.white_player == player_id),
                        Some(GameResult::BlackWins) => {
                            Some(game.black_player.as_deref() == Some(player_id))
                        }
                        Some(GameResult::Draw) => {
                            stats.draws += 1;
                            None
                        }
                        Some(GameResult::Abandoned) | None => None,
                    };
                    match won {
                        Some(true) => stats.wins += 1,
                        Some(false) => stats.losses += 1,
                        None => {}
                    }
                }
                GameStatus::Waiting | GameStatus::Abandoned => {}
            }
        }
        Ok(stats)
    }

    /// Cancels a game nobody has joined yet. Only its creator may do this.
    pub async fn delete_game(&self, game_id: &str, player_id: &str) -> Result<(), GameServiceError> {
        let game = self.load(game_id).await?;
        if game.white_player != player_id {
            return Err(GameServiceError::Forbidden(
                "only the creator can delete a game".to_string(),
            ));
        }
        if game.status != GameStatus::Waiting {
            return Err(GameError::NotWaiting.into());
        }

        self.repository
            .delete_game(game_id)
            .await
            .map_err(map_repository_error)?;
        info!("Player {} deleted game {}", player_id, game_id);
        Ok(())
    }
}
