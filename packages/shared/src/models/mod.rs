pub mod auth;
pub mod game;
pub mod session;
pub mod user;
