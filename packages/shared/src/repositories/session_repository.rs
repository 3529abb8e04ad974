use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::{AttributeValue, DeleteRequest, Select, WriteRequest};
use aws_sdk_dynamodb::Client;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_dynamo::aws_sdk_dynamodb_1::{from_item, to_item};
use tracing::{debug, warn};

use crate::models::session::Session;
use crate::repositories::errors::session_repository_errors::SessionRepositoryError;

#[cfg(test)]
use mockall::automock;

const USER_SESSIONS_INDEX: &str = "GSI_SessionsByUser";
// DynamoDB rejects batch writes with more than 25 requests.
const MAX_BATCH_SIZE: usize = 25;
const MAX_BATCH_ATTEMPTS: u32 = 5;

/// Stored form of a [`Session`]. `expires_at_epoch` is the table's TTL attribute,
/// so DynamoDB reaps the record on its own once it lapses.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionRecord {
    id: String,
    user_id: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    ttl_seconds: i64,
    expires_at_epoch: i64,
}

impl From<&Session> for SessionRecord {
    fn from(session: &Session) -> Self {
        SessionRecord {
            id: session.id.clone(),
            user_id: session.user_id.clone(),
            created_at: session.created_at,
            expires_at: session.expires_at,
            ttl_seconds: session.ttl_seconds,
            expires_at_epoch: session.expires_at.timestamp(),
        }
    }
}

impl From<SessionRecord> for Session {
    fn from(record: SessionRecord) -> Self {
        Session {
            id: record.id,
            user_id: record.user_id,
            created_at: record.created_at,
            expires_at: record.expires_at,
            ttl_seconds: record.ttl_seconds,
        }
    }
}

pub struct DynamoDbSessionRepository {
    pub client: Client,
    pub table_name: String,
}

impl DynamoDbSessionRepository {
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    fn parse(item: HashMap<String, AttributeValue>) -> Result<Session, SessionRepositoryError> {
        let record: SessionRecord =
            from_item(item).map_err(|e| SessionRepositoryError::Serialization(e.to_string()))?;
        Ok(record.into())
    }

    async fn session_ids_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<String>, SessionRepositoryError> {
        let items = self
            .client
            .query()
            .table_name(&self.table_name)
            .index_name(USER_SESSIONS_INDEX)
            .key_condition_expression("user_id = :user_id")
            .expression_attribute_values(":user_id", AttributeValue::S(user_id.to_string()))
            .projection_expression("id")
            .into_paginator()
            .items()
            .send()
            .collect::<Result<Vec<_>, _>>()
            .await
            .map_err(|e| SessionRepositoryError::DynamoDb(DisplayErrorContext(&e).to_string()))?;

        Ok(items.iter().filter_map(extract_id).collect())
    }

    /// Deletes the given sessions in batches, resubmitting whatever DynamoDB
    /// reports back as unprocessed.
    async fn batch_delete(&self, session_ids: &[String]) -> Result<usize, SessionRepositoryError> {
        for chunk in session_ids.chunks(MAX_BATCH_SIZE) {
            let mut pending = chunk
                .iter()
                .map(|id| {
                    DeleteRequest::builder()
                        .key("id", AttributeValue::S(id.clone()))
                        .build()
                        .map(|request| WriteRequest::builder().delete_request(request).build())
                        .map_err(|e| SessionRepositoryError::DynamoDb(e.to_string()))
                })
                .collect::<Result<Vec<_>, _>>()?;

            let mut attempt = 0;
            while !pending.is_empty() {
                if attempt == MAX_BATCH_ATTEMPTS {
                    return Err(SessionRepositoryError::DynamoDb(format!(
                        "{} session deletes still unprocessed after {} attempts",
                        pending.len(),
                        MAX_BATCH_ATTEMPTS
                    )));
                }
                if attempt > 0 {
                    let backoff = 50 * 2u64.pow(attempt - 1);
                    tokio::time::sleep(std::time::Duration::from_millis(backoff)).await;
                }

                let output = self
                    .client
                    .batch_write_item()
                    .request_items(&self.table_name, pending)
                    .send()
                    .await
                    .map_err(|e| {
                        SessionRepositoryError::DynamoDb(DisplayErrorContext(&e).to_string())
                    })?;

                pending = output
                    .unprocessed_items
                    .and_then(|mut unprocessed| unprocessed.remove(&self.table_name))
                    .unwrap_or_default();
                attempt += 1;
            }
        }
        Ok(session_ids.len())
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn save(&self, session: &Session) -> Result<(), SessionRepositoryError>;
    /// Expired sessions are removed on sight and reported as `Expired`.
    async fn find_by_id(&self, session_id: &str) -> Result<Session, SessionRepositoryError>;
    async fn find_by_user_id(&self, user_id: &str) -> Result<Vec<Session>, SessionRepositoryError>;
    /// Deleting a session that does not exist is not an error.
    async fn delete(&self, session_id: &str) -> Result<(), SessionRepositoryError>;
    async fn delete_by_user_id(&self, user_id: &str) -> Result<usize, SessionRepositoryError>;
    async fn refresh(
        &self,
        session_id: &str,
        ttl: Duration,
    ) -> Result<Session, SessionRepositoryError>;
    async fn cleanup(&self) -> Result<usize, SessionRepositoryError>;
    async fn count(&self) -> Result<i64, SessionRepositoryError>;
}

#[async_trait]
impl SessionRepository for DynamoDbSessionRepository {
    async fn save(&self, session: &Session) -> Result<(), SessionRepositoryError> {
        if !session.is_valid() {
            return Err(SessionRepositoryError::Invalid(
                "session id, user id and ttl are required".to_string(),
            ));
        }

        let item = to_item(SessionRecord::from(session))
            .map_err(|e| SessionRepositoryError::Serialization(e.to_string()))?;
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|e| SessionRepositoryError::DynamoDb(DisplayErrorContext(&e).to_string()))?;
        Ok(())
    }

    async fn find_by_id(&self, session_id: &str) -> Result<Session, SessionRepositoryError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(session_id.to_string()))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| SessionRepositoryError::DynamoDb(DisplayErrorContext(&e).to_string()))?;

        let session = match output.item {
            Some(item) => Self::parse(item)?,
            None => return Err(SessionRepositoryError::NotFound),
        };

        // The native TTL sweep can lag by hours, so expiry is checked on every read.
        if session.is_expired() {
            if let Err(e) = self.delete(session_id).await {
                warn!("Failed to remove expired session: {}", e);
            }
            return Err(SessionRepositoryError::Expired);
        }

        Ok(session)
    }

    async fn find_by_user_id(&self, user_id: &str) -> Result<Vec<Session>, SessionRepositoryError> {
        let items = self
            .client
            .query()
            .table_name(&self.table_name)
            .index_name(USER_SESSIONS_INDEX)
            .key_condition_expression("user_id = :user_id")
            .expression_attribute_values(":user_id", AttributeValue::S(user_id.to_string()))
            .into_paginator()
            .items()
            .send()
            .collect::<Result<Vec<_>, _>>()
            .await
            .map_err(|e| SessionRepositoryError::DynamoDb(DisplayErrorContext(&e).to_string()))?;

        let mut live = Vec::new();
        let mut expired = Vec::new();
        for item in items {
            let session = Self::parse(item)?;
            if session.is_expired() {
                expired.push(session.id);
            } else {
                live.push(session);
            }
        }

        if !expired.is_empty() {
            debug!("Removing {} expired sessions for user {}", expired.len(), user_id);
            if let Err(e) = self.batch_delete(&expired).await {
                warn!("Failed to remove expired sessions for user {}: {}", user_id, e);
            }
        }

        Ok(live)
    }

    async fn delete(&self, session_id: &str) -> Result<(), SessionRepositoryError> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(session_id.to_string()))
            .send()
            .await
            .map_err(|e| SessionRepositoryError::DynamoDb(DisplayErrorContext(&e).to_string()))?;
        Ok(())
    }

    async fn delete_by_user_id(&self, user_id: &str) -> Result<usize, SessionRepositoryError> {
        let session_ids = self.session_ids_for_user(user_id).await?;
        if session_ids.is_empty() {
            return Ok(0);
        }
        self.batch_delete(&session_ids).await
    }

    async fn refresh(
        &self,
        session_id: &str,
        ttl: Duration,
    ) -> Result<Session, SessionRepositoryError> {
        let mut session = self.find_by_id(session_id).await?;
        session.refresh(ttl);
        let record = SessionRecord::from(&session);

        let expires_at = serde_dynamo::aws_sdk_dynamodb_1::to_attribute_value(record.expires_at)
            .map_err(|e| SessionRepositoryError::Serialization(e.to_string()))?;

        self.client
            .update_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(session_id.to_string()))
            .update_expression(
                "SET expires_at = :expires_at, expires_at_epoch = :epoch, ttl_seconds = :ttl",
            )
            .condition_expression("attribute_exists(id)")
            .expression_attribute_values(":expires_at", expires_at)
            .expression_attribute_values(
                ":epoch",
                AttributeValue::N(record.expires_at_epoch.to_string()),
            )
            .expression_attribute_values(":ttl", AttributeValue::N(record.ttl_seconds.to_string()))
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error()
                    .is_some_and(|se| se.is_conditional_check_failed_exception())
                {
                    SessionRepositoryError::NotFound
                } else {
                    SessionRepositoryError::DynamoDb(DisplayErrorContext(&e).to_string())
                }
            })?;

        Ok(session)
    }

    async fn cleanup(&self) -> Result<usize, SessionRepositoryError> {
        let items = self
            .client
            .scan()
            .table_name(&self.table_name)
            .filter_expression("expires_at_epoch <= :now")
            .expression_attribute_values(":now", AttributeValue::N(Utc::now().timestamp().to_string()))
            .projection_expression("id")
            .into_paginator()
            .items()
            .send()
            .collect::<Result<Vec<_>, _>>()
            .await
            .map_err(|e| SessionRepositoryError::DynamoDb(DisplayErrorContext(&e).to_string()))?;

        let expired: Vec<String> = items.iter().filter_map(extract_id).collect();
        if expired.is_empty() {
            return Ok(0);
        }
        self.batch_delete(&expired).await
    }

    async fn count(&self) -> Result<i64, SessionRepositoryError> {
        let mut pages = self
            .client
            .scan()
            .table_name(&self.table_name)
            .select(Select::Count)
            .filter_expression("expires_at_epoch > :now")
            .expression_attribute_values(":now", AttributeValue::N(Utc::now().timestamp().to_string()))
            .into_paginator()
            .send();

        let mut total = 0i64;
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| {
                SessionRepositoryError::DynamoDb(DisplayErrorContext(&e).to_string())
            })?;
            total += i64::from(page.count);
        }
        Ok(total)
    }
}

fn extract_id(item: &HashMap<String, AttributeValue>) -> Option<String> {
    match item.get("id") {
        Some(AttributeValue::S(id)) => Some(id.clone()),
        _ => None,
    }
}
