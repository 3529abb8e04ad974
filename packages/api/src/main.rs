use std::sync::Arc;

use lambda_http::tracing::{self, info, warn};
use lambda_http::{run, Error};

use api::{bind_listener, create_app, AppState};
use shared::config::Config;
use shared::repositories::game_repository::DynamoDbGameRepository;
use shared::repositories::session_repository::DynamoDbSessionRepository;
use shared::repositories::user_repository::DynamoDbUserRepository;
use shared::services::auth_service::AuthService;
use shared::services::game_service::GameService;
use shared::services::user_service::UserService;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let on_lambda = std::env::var("AWS_LAMBDA_RUNTIME_API").is_ok();

    if on_lambda {
        // required to enable CloudWatch error logging by the runtime
        tracing::init_default_subscriber();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "api=debug,shared=debug,tower_http=debug".into()),
            )
            .init();
    }

    let config = Config::from_env()?;

    // Set up services
    let aws_config = aws_config::load_from_env().await;
    let client = aws_sdk_dynamodb::Client::new(&aws_config);

    let user_repository = Arc::new(DynamoDbUserRepository::new(
        client.clone(),
        &config.users_table,
    ));
    let session_repository = Arc::new(DynamoDbSessionRepository::new(
        client.clone(),
        &config.sessions_table,
    ));
    let game_repository = Arc::new(DynamoDbGameRepository::new(client, &config.games_table));

    let user_service = Arc::new(UserService::new(user_repository));
    let auth_service = Arc::new(AuthService::new(
        user_service,
        session_repository,
        config.session_ttl(),
    ));
    let game_service = Arc::new(GameService::new(game_repository));

    let app = create_app(AppState {
        auth_service,
        game_service,
        cookie_secure: config.cookie_secure,
    });

    if on_lambda {
        return run(app).await;
    }

    let listener = bind_listener(&config.host, config.port).await?;
    info!("Chess API listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("Could not install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
