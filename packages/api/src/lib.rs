use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod cookies;
pub mod error;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod state;

pub use state::AppState;

/// Builds the full `/api` router around the given state.
pub fn create_app(state: AppState) -> Router {
    // ToDo: Tighten this up once the frontend origin is fixed
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/auth", routes::auth::routes())
        .nest("/game", routes::game::routes());

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Binds the local listener. `host` may be a hostname or an IPv4/IPv6
/// literal; it is resolved rather than parsed as `host:port`.
pub async fn bind_listener(host: &str, port: u16) -> std::io::Result<TcpListener> {
    TcpListener::bind((host, port)).await
}
