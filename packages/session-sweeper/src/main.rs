use std::sync::Arc;

use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde_json::{json, Value};
use tracing::{error, info};

use shared::repositories::session_repository::{DynamoDbSessionRepository, SessionRepository};

const SESSIONS_TABLE: &str = "SESSIONS_TABLE";

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt().init();

    let table_name = std::env::var(SESSIONS_TABLE)
        .map_err(|_| Error::from(format!("{} environment variable must be set", SESSIONS_TABLE)))?;
    let config = aws_config::load_from_env().await;
    let client = aws_sdk_dynamodb::Client::new(&config);
    let repository: Arc<dyn SessionRepository> =
        Arc::new(DynamoDbSessionRepository::new(client, table_name));

    run(service_fn(move |event: LambdaEvent<Value>| {
        let repository = repository.clone();
        async move { sweep_handler(repository.as_ref(), event).await }
    }))
    .await
}

/// Triggered on a schedule. DynamoDB's own TTL deletion can lag, so expired
/// sessions are removed here as well.
async fn sweep_handler(
    repository: &dyn SessionRepository,
    _event: LambdaEvent<Value>,
) -> Result<Value, Error> {
    let removed = repository.cleanup().await.map_err(|e| {
        error!("Session cleanup failed: {}", e);
        Error::from(format!("Failed to clean up sessions: {}", e))
    })?;
    let remaining = repository.count().await.map_err(|e| {
        Error::from(format!("Failed to count sessions: {}", e))
    })?;

    info!("Removed {} expired sessions, {} still active", removed, remaining);
    Ok(json!({ "removed": removed, "active": remaining }))
}
