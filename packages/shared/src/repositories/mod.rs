pub mod errors;
pub mod game_repository;
pub mod session_repository;
pub mod user_repository;
