use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use serde_dynamo::aws_sdk_dynamodb_1::{from_item, to_item};

use crate::models::user::User;
use crate::repositories::errors::user_repository_errors::UserRepositoryError;

#[cfg(test)]
use mockall::automock;

const USERNAME_INDEX: &str = "GSI_UserByUsername";

pub struct DynamoDbUserRepository {
    pub client: Client,
    pub table_name: String,
}

impl DynamoDbUserRepository {
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, user: &User) -> Result<(), UserRepositoryError>;
    async fn get_user_by_id(&self, user_id: &str) -> Result<User, UserRepositoryError>;
    async fn get_user_by_username(&self, username: &str) -> Result<User, UserRepositoryError>;
    async fn update_user(&self, user: &User) -> Result<(), UserRepositoryError>;
    async fn delete_user(&self, user_id: &str) -> Result<(), UserRepositoryError>;
    async fn username_exists(&self, username: &str) -> Result<bool, UserRepositoryError>;
}

#[async_trait]
impl UserRepository for DynamoDbUserRepository {
    async fn create_user(&self, user: &User) -> Result<(), UserRepositoryError> {
        let item = to_item(user).map_err(|e| UserRepositoryError::Serialization(e.to_string()))?;
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .condition_expression("attribute_not_exists(id)")
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error()
                    .is_some_and(|se| se.is_conditional_check_failed_exception())
                {
                    UserRepositoryError::AlreadyExists
                } else {
                    UserRepositoryError::DynamoDb(DisplayErrorContext(&e).to_string())
                }
            })?;
        Ok(())
    }

    async fn get_user_by_id(&self, user_id: &str) -> Result<User, UserRepositoryError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(user_id.to_string()))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| UserRepositoryError::DynamoDb(DisplayErrorContext(&e).to_string()))?;

        match output.item {
            Some(item) => {
                from_item(item).map_err(|e| UserRepositoryError::Serialization(e.to_string()))
            }
            None => Err(UserRepositoryError::NotFound),
        }
    }

    async fn get_user_by_username(&self, username: &str) -> Result<User, UserRepositoryError> {
        let output = self
            .client
            .query()
            .table_name(&self.table_name)
            .index_name(USERNAME_INDEX)
            .key_condition_expression("username = :username")
            .expression_attribute_values(":username", AttributeValue::S(username.to_string()))
            .limit(1)
            .send()
            .await
            .map_err(|e| UserRepositoryError::DynamoDb(DisplayErrorContext(&e).to_string()))?;

        // The index projects only keys, so fetch the full record from the base table.
        let user_id = output
            .items
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|item| match item.get("id") {
                Some(AttributeValue::S(id)) => Some(id.clone()),
                _ => None,
            })
            .ok_or(UserRepositoryError::NotFound)?;

        self.get_user_by_id(&user_id).await
    }

    async fn update_user(&self, user: &User) -> Result<(), UserRepositoryError> {
        let item = to_item(user).map_err(|e| UserRepositoryError::Serialization(e.to_string()))?;
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
                    UserRepositoryError::NotFound
                } else {
                    UserRepositoryError::DynamoDb(DisplayErrorContext(&e).to_string())
                }
            })?;
        Ok(())
    }

    async fn delete_user(&self, user_id: &str) -> Result<(), UserRepositoryError> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(user_id.to_string()))
            .condition_expression("attribute_exists(id)")
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error()
                    .is_some_and(|se| se.is_conditional_check_failed_exception())
                {
                    UserRepositoryError::NotFound
                } else {
                    UserRepositoryError::DynamoDb(DisplayErrorContext(&e).to_string())
                }
            })?;
        Ok(())
    }

    async fn username_exists(&self, username: &str) -> Result<bool, UserRepositoryError> {
        let output = self
            .client
            .query()
            .table_name(&self.table_name)
            .index_name(USERNAME_INDEX)
            .key_condition_expression("username = :username")
            .expression_attribute_values(":username", AttributeValue::S(username.to_string()))
            .limit(1)
            .send()
            .await
            .map_err(|e| UserRepositoryError::DynamoDb(DisplayErrorContext(&e).to_string()))?;

        Ok(output.items.is_some_and(|items| !items.is_empty()))
    }
}
