use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types::AttributeValue;
use log::{debug, error, info};
use std::collections::HashMap;

use crate::ddb::model::PredictionRecord;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("DynamoDB error: {0}")]
    DynamoDb(String),
}

#[async_trait]
pub trait PredictionStore: Send + Sync {
    async fn save(&self, record: &PredictionRecord) -> Result<(), StoreError>;
}

#[derive(Clone)]
pub struct DynamoPredictionStore {
    client: Client,
    table_name: String,
}

impl DynamoPredictionStore {
    pub fn new(client: Client, table_name: String) -> Self {
        info!("Prediction records will be written to table: {}", table_name);
        Self { client, table_name }
    }
}

pub fn record_to_item(record: &PredictionRecord) -> HashMap<String, AttributeValue> {
    let mut item = HashMap::new();
    item.insert("id".to_string(), AttributeValue::S(record.id.clone()));
    item.insert("result".to_string(), AttributeValue::S(record.result.to_string()));
    item.insert(
        "suggestion".to_string(),
        AttributeValue::S(record.suggestion.clone()),
    );
    item.insert(
        "createdAt".to_string(),
        AttributeValue::S(record.created_at.clone()),
    );
    item
}

#[async_trait]
impl PredictionStore for DynamoPredictionStore {
    async fn save(&self, record: &PredictionRecord) -> Result<(), StoreError> {
        debug!("Writing prediction {} to {}", record.id, self.table_name);
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(record_to_item(record)))
            .send()
            .await
            .map_err(|e| {
                error!("DynamoDB put_item failed for prediction {}: {:?}", record.id, e);
                StoreError::DynamoDb(e.to_string())
            })?;
        info!("Prediction {} stored", record.id);
        Ok(())
    }
}
