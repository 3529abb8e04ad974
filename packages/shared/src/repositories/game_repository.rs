use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::{AttributeValue, Select};
use aws_sdk_dynamodb::Client;
use serde_dynamo::aws_sdk_dynamodb_1::{from_item, to_item};

use crate::models::game::{Game, GameStatus};
use crate::repositories::errors::game_repository_errors::GameRepositoryError;

#[cfg(test)]
use mockall::automock;

const STATUS_INDEX: &str = "GSI_GamesByStatus";
const WHITE_PLAYER_INDEX: &str = "GSI_GamesByWhitePlayer";
const BLACK_PLAYER_INDEX: &str = "GSI_GamesByBlackPlayer";

pub struct DynamoDbGameRepository {
    pub client: Client,
    pub table_name: String,
}

impl DynamoDbGameRepository {
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    async fn query_index(
        &self,
        index_name: &str,
        key_name: &str,
        key_value: &str,
    ) -> Result<Vec<Game>, GameRepositoryError> {
        // `status` is a reserved word, so every key goes through a name placeholder.
        let items = self
            .client
            .query()
            .table_name(&self.table_name)
            .index_name(index_name)
            .key_condition_expression("#key = :value")
            .expression_attribute_names("#key", key_name)
            .expression_attribute_values(":value", AttributeValue::S(key_value.to_string()))
            .into_paginator()
            .items()
            .send()
            .collect::<Result<Vec<_>, _>>()
            .await
            .map_err(|e| GameRepositoryError::DynamoDb(DisplayErrorContext(&e).to_string()))?;

        items.into_iter().map(parse_game).collect()
    }

    async fn count_index(
        &self,
        index_name: &str,
        key_name: &str,
        key_value: &str,
    ) -> Result<i64, GameRepositoryError> {
        let mut pages = self
            .client
            .query()
            .table_name(&self.table_name)
            .index_name(index_name)
            .select(Select::Count)
            .key_condition_expression("#key = :value")
            .expression_attribute_names("#key", key_name)
            .expression_attribute_values(":value", AttributeValue::S(key_value.to_string()))
            .into_paginator()
            .send();

        let mut total = 0i64;
        while let Some(page) = pages.next().await {
            let page =
                page.map_err(|e| GameRepositoryError::DynamoDb(DisplayErrorContext(&e).to_string()))?;
            total += i64::from(page.count);
        }
        Ok(total)
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait GameRepository: Send + Sync {
    async fn create_game(&self, game: &Game) -> Result<(), GameRepositoryError>;
    async fn get_game(&self, game_id: &str) -> Result<Game, GameRepositoryError>;
    /// Replaces the stored document. Concurrent writers race; the last one wins.
    async fn update_game(&self, game: &Game) -> Result<(), GameRepositoryError>;
    async fn delete_game(&self, game_id: &str) -> Result<(), GameRepositoryError>;
    /// Games where the player holds either colour.
    async fn find_by_player(&self, player_id: &str) -> Result<Vec<Game>, GameRepositoryError>;
    async fn find_by_status(&self, status: GameStatus) -> Result<Vec<Game>, GameRepositoryError>;
    async fn count_by_status(&self, status: GameStatus) -> Result<i64, GameRepositoryError>;
    async fn count_by_player(&self, player_id: &str) -> Result<i64, GameRepositoryError>;
}

#[async_trait]
impl GameRepository for DynamoDbGameRepository {
    async fn create_game(&self, game: &Game) -> Result<(), GameRepositoryError> {
        let item = to_item(game).map_err(|e| GameRepositoryError::Serialization(e.to_string()))?;

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .condition_expression("attribute_not_exists(id)")
            .send()
            .await
            .map_err(|e| GameRepositoryError::DynamoDb(DisplayErrorContext(&e).to_string()))?;

        Ok(())
    }

    async fn get_game(&self, game_id: &str) -> Result<Game, GameRepositoryError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(game_id.to_string()))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| GameRepositoryError::DynamoDb(DisplayErrorContext(&e).to_string()))?;

        match output.item {
            Some(item) => parse_game(item),
            None => Err(GameRepositoryError::NotFound),
        }
    }

    async fn update_game(&self, game: &Game) -> Result<(), GameRepositoryError> {
        let item = to_item(game).map_err(|e| GameRepositoryError::Serialization(e.to_string()))?;

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .condition_expression("attribute_exists(id)")
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error()
                    .is_some_and(|se| se.is_conditional_check_failed_exception())
                {
                    GameRepositoryError::NotFound
                } else {
                    GameRepositoryError::DynamoDb(DisplayErrorContext(&e).to_string())
                }
            })?;

        Ok(())
    }

    async fn delete_game(&self, game_id: &str) -> Result<(), GameRepositoryError> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(game_id.to_string()))
            .condition_expression("attribute_exists(id)")
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error()
                    .is_some_and(|se| se.is_conditional_check_failed_exception())
                {
                    GameRepositoryError::NotFound
                } else {
                    GameRepositoryError::DynamoDb(DisplayErrorContext(&e).to_string())
                }
            })?;

        Ok(())
    }

    async fn find_by_player(&self, player_id: &str) -> Result<Vec<Game>, GameRepositoryError> {
        let (as_white, as_black) = tokio::try_join!(
            self.query_index(WHITE_PLAYER_INDEX, "white_player", player_id),
            self.query_index(BLACK_PLAYER_INDEX, "black_player", player_id),
        )?;

        let mut games = as_white;
        games.extend(as_black);
        Ok(games)
    }

    async fn find_by_status(&self, status: GameStatus) -> Result<Vec<Game>, GameRepositoryError> {
        self.query_index(STATUS_INDEX, "status", status.as_str()).await
    }

    async fn count_by_status(&self, status: GameStatus) -> Result<i64, GameRepositoryError> {
        self.count_index(STATUS_INDEX, "status", status.as_str()).await
    }

    async fn count_by_player(&self, player_id: &str) -> Result<i64, GameRepositoryError> {
        let (as_white, as_black) = tokio::try_join!(
            self.count_index(WHITE_PLAYER_INDEX, "white_player", player_id),
            self.count_index(BLACK_PLAYER_INDEX, "black_player", player_id),
        )?;
        Ok(as_white + as_black)
    }
}

fn parse_game(item: HashMap<String, AttributeValue>) -> Result<Game, GameRepositoryError> {
    from_item(item).map_err(|e| GameRepositoryError::Serialization(e.to_string()))
}
