use serde::{Deserialize, Serialize};

use super::Game;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GameResponse {
    pub message: String,
    pub game_id: String,
    pub game: Game,
}

impl GameResponse {
    pub fn new(message: &str, game: Game) -> Self {
        GameResponse {
            message: message.to_string(),
            game_id: game.id.clone(),
            game,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GameListResponse {
    pub games: Vec<Game>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct PlayerStats {
    pub total_games: usize,
    pub wins: usize,
    pub losses: usize,
    pub draws: usize,
    pub active_games: usize,
}
