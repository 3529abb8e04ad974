pub mod requests;
pub mod responses;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Debug, Error, PartialEq)]
pub enum GameError {
    #[error("{0} player id cannot be empty")]
    MissingPlayer(Color),
    #[error("game is not waiting for players")]
    NotWaiting,
    #[error("game is not active")]
    NotActive,
    #[error("player cannot play against themselves")]
    SelfJoin,
    #[error("it's not your turn")]
    NotYourTurn,
    #[error("player is not part of this game")]
    NotParticipant,
    #[error("invalid game: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Waiting,
    Active,
    Finished,
    Abandoned,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Waiting => "waiting",
            GameStatus::Active => "active",
            GameStatus::Finished => "finished",
            GameStatus::Abandoned => "abandoned",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GameResult {
    WhiteWins,
    BlackWins,
    Draw,
    Abandoned,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opponent(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

/// A recorded move. Squares, piece and notation are stored exactly as submitted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Move {
    pub from: String,
    pub to: String,
    pub piece: String,
    pub player: Color,
    pub timestamp: DateTime<Utc>,
    pub notation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Game {
    pub id: String,
    pub white_player: String,
    // Index key attributes must be absent rather than null.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub black_player: Option<String>,
    pub status: GameStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<GameResult>,
    pub current_turn: Color,
    #[serde(default)]
    pub moves: Vec<Move>,
    pub board: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl Game {
    pub fn new(white_player_id: &str) -> Result<Self, GameError> {
        if white_player_id.is_empty() {
            return Err(GameError::MissingPlayer(Color::White));
        }

        let now = Utc::now();
        Ok(Game {
            id: Uuid::new_v4().to_string(),
            white_player: white_player_id.to_string(),
            black_player: None,
            status: GameStatus::Waiting,
            result: None,
            current_turn: Color::White,
            moves: vec![],
            board: STARTING_FEN.to_string(),
            created_at: now,
            updated_at: now,
            finished_at: None,
        })
    }

    pub fn join(&mut self, black_player_id: &str) -> Result<(), GameError> {
        if black_player_id.is_empty() {
            return Err(GameError::MissingPlayer(Color::Black));
        }
        if self.status != GameStatus::Waiting {
            return Err(GameError::NotWaiting);
        }
        if self.white_player == black_player_id {
            return Err(GameError::SelfJoin);
        }

        self.black_player = Some(black_player_id.to_string());
        self.status = GameStatus::Active;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Appends a move for the player whose turn it is. The board is never
    /// consulted: only the stored turn decides who may move.
    pub fn make_move(
        &mut self,
        player_id: &str,
        from: &str,
        to: &str,
        piece: &str,
        notation: &str,
    ) -> Result<&Move, GameError> {
        if self.status != GameStatus::Active {
            return Err(GameError::NotActive);
        }
        if self.player_for(self.current_turn) != Some(player_id) {
            return Err(GameError::NotYourTurn);
        }

        let now = Utc::now();
        self.moves.push(Move {
            from: from.to_string(),
            to: to.to_string(),
            piece: piece.to_string(),
            player: self.current_turn,
            timestamp: now,
            notation: notation.to_string(),
        });
        self.current_turn = self.current_turn.opponent();
        self.updated_at = now;

        Ok(&self.moves[self.moves.len() - 1])
    }

    pub fn resign(&mut self, player_id: &str) -> Result<GameResult, GameError> {
        if self.status != GameStatus::Active {
            return Err(GameError::NotActive);
        }

        let result = match self.player_color(player_id)? {
            Color::White => GameResult::BlackWins,
            Color::Black => GameResult::WhiteWins,
        };
        self.close(result);
        Ok(result)
    }

    pub fn finish(&mut self, result: GameResult) -> Result<(), GameError> {
        if self.status != GameStatus::Active {
            return Err(GameError::NotActive);
        }
        self.close(result);
        Ok(())
    }

    pub fn is_player_in_game(&self, player_id: &str) -> bool {
        self.player_color(player_id).is_ok()
    }

    pub fn player_color(&self, player_id: &str) -> Result<Color, GameError> {
        if player_id.is_empty() {
            return Err(GameError::NotParticipant);
        }
        if self.white_player == player_id {
            Ok(Color::White)
        } else if self.black_player.as_deref() == Some(player_id) {
            Ok(Color::Black)
        } else {
            Err(GameError::NotParticipant)
        }
    }

    pub fn validate(&self) -> Result<(), GameError> {
        if self.white_player.is_empty() {
            return Err(GameError::Invalid("white player cannot be empty".to_string()));
        }
        if self.status == GameStatus::Active && self.black_player.is_none() {
            return Err(GameError::Invalid(
                "active game must have black player".to_string(),
            ));
        }
        Ok(())
    }

    fn player_for(&self, color: Color) -> Option<&str> {
        match color {
            Color::White => Some(self.white_player.as_str()),
            Color::Black => self.black_player.as_deref(),
        }
    }

    fn close(&mut self, result: GameResult) {
        let now = Utc::now();
        self.status = GameStatus::Finished;
        self.result = Some(result);
        self.finished_at = Some(now);
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active_game() -> Game {
        let mut game = Game::new("white-id").unwrap();
        game.join("black-id").unwrap();
        game
    }

    #[test]
    fn test_new_game_fields() {
        let game = Game::new("white-id").unwrap();

        assert_eq!(game.white_player, "white-id");
        assert!(game.black_player.is_none());
        assert_eq!(game.status, GameStatus::Waiting);
        assert_eq!(game.current_turn, Color::White);
        assert!(game.moves.is_empty());
        assert_eq!(game.board, STARTING_FEN);
        assert!(game.result.is_none());
        assert!(game.finished_at.is_none());
        assert!(game.validate().is_ok());
    }

    #[test]
    fn test_new_game_requires_white_player() {
        assert_eq!(
            Game::new("").unwrap_err(),
            GameError::MissingPlayer(Color::White)
        );
    }

    #[test]
    fn test_game_ids_are_unique() {
        let first = Game::new("white-id").unwrap();
        let second = Game::new("white-id").unwrap();
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_join_activates_game() {
        let game = active_game();

        assert_eq!(game.black_player.as_deref(), Some("black-id"));
        assert_eq!(game.status, GameStatus::Active);
        assert!(game.validate().is_ok());
    }

    #[test]
    fn test_cannot_join_own_game() {
        let mut game = Game::new("white-id").unwrap();

        assert_eq!(game.join("white-id").unwrap_err(), GameError::SelfJoin);
        assert_eq!(game.status, GameStatus::Waiting);
        assert!(game.black_player.is_none());
    }

    #[test]
    fn test_cannot_join_active_game() {
        let mut game = active_game();
        assert_eq!(game.join("third-id").unwrap_err(), GameError::NotWaiting);
        assert_eq!(game.black_player.as_deref(), Some("black-id"));
    }

    #[test]
    fn test_join_requires_player_id() {
        let mut game = Game::new("white-id").unwrap();
        assert_eq!(
            game.join("").unwrap_err(),
            GameError::MissingPlayer(Color::Black)
        );
    }

    #[test]
    fn test_moves_alternate_turns() {
        let mut game = active_game();

        let first = game
            .make_move("white-id", "e2", "e4", "pawn", "e4")
            .unwrap()
            .clone();
        assert_eq!(first.player, Color::White);
        assert_eq!(game.current_turn, Color::Black);

        game.make_move("black-id", "e7", "e5", "pawn", "e5").unwrap();
        assert_eq!(game.current_turn, Color::White);
        assert_eq!(game.moves.len(), 2);
        assert_eq!(game.moves[1].player, Color::Black);
        assert_eq!(game.moves[1].notation, "e5");
    }

    #[test]
    fn test_move_out_of_turn_rejected() {
        let mut game = active_game();

        assert_eq!(
            game.make_move("black-id", "e7", "e5", "pawn", "e5")
                .unwrap_err(),
            GameError::NotYourTurn
        );
        assert!(game.moves.is_empty());
        assert_eq!(game.current_turn, Color::White);
    }

    #[test]
    fn test_moves_are_not_checked_against_the_board() {
        let mut game = active_game();

        // A king teleporting across the board is stored as submitted.
        let recorded = game
            .make_move("white-id", "e1", "e8", "king", "Ke8??")
            .unwrap();
        assert_eq!(recorded.from, "e1");
        assert_eq!(recorded.to, "e8");
        assert_eq!(game.board, STARTING_FEN);
    }

    #[test]
    fn test_move_requires_active_game() {
        let mut waiting = Game::new("white-id").unwrap();
        assert_eq!(
            waiting
                .make_move("white-id", "e2", "e4", "pawn", "e4")
                .unwrap_err(),
            GameError::NotActive
        );
    }

    #[test]
    fn test_resign_awards_opponent() {
        let mut game = active_game();
        assert_eq!(game.resign("white-id").unwrap(), GameResult::BlackWins);
        assert_eq!(game.status, GameStatus::Finished);
        assert_eq!(game.result, Some(GameResult::BlackWins));
        assert!(game.finished_at.is_some());

        let mut game = active_game();
        assert_eq!(game.resign("black-id").unwrap(), GameResult::WhiteWins);
    }

    #[test]
    fn test_resign_by_outsider_rejected() {
        let mut game = active_game();
        assert_eq!(
            game.resign("outsider").unwrap_err(),
            GameError::NotParticipant
        );
        assert_eq!(game.status, GameStatus::Active);
    }

    #[test]
    fn test_finished_game_rejects_further_transitions() {
        let mut game = active_game();
        game.finish(GameResult::Draw).unwrap();

        assert_eq!(game.result, Some(GameResult::Draw));
        assert_eq!(game.finish(GameResult::WhiteWins).unwrap_err(), GameError::NotActive);
        assert_eq!(game.resign("white-id").unwrap_err(), GameError::NotActive);
        assert_eq!(
            game.make_move("white-id", "e2", "e4", "pawn", "e4")
                .unwrap_err(),
            GameError::NotActive
        );
    }

    #[test]
    fn test_player_color() {
        let game = active_game();

        assert_eq!(game.player_color("white-id").unwrap(), Color::White);
        assert_eq!(game.player_color("black-id").unwrap(), Color::Black);
        assert!(game.player_color("nobody").is_err());
        assert!(game.is_player_in_game("black-id"));
        assert!(!game.is_player_in_game(""));
    }

    #[test]
    fn test_validate_catches_active_game_without_black() {
        let mut game = Game::new("white-id").unwrap();
        game.status = GameStatus::Active;
        assert!(matches!(game.validate(), Err(GameError::Invalid(_))));
    }

    #[test]
    fn test_enum_wire_format() {
        assert_eq!(
            serde_json::to_string(&GameStatus::Waiting).unwrap(),
            "\"waiting\""
        );
        assert_eq!(
            serde_json::to_string(&GameResult::WhiteWins).unwrap(),
            "\"white_wins\""
        );
        assert_eq!(serde_json::to_string(&Color::Black).unwrap(), "\"black\"");
        assert_eq!(GameStatus::Abandoned.as_str(), "abandoned");
    }

    #[test]
    fn test_waiting_game_serialization_omits_empty_fields() {
        let game = Game::new("white-id").unwrap();
        let serialized = serde_json::to_string(&game).unwrap();

        assert!(!serialized.contains("black_player"));
        assert!(!serialized.contains("finished_at"));

        let deserialized: Game = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, game);
    }
}
