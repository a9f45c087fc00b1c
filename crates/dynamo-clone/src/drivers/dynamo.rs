//! DynamoDB driver: paginated `Scan` source and `BatchWriteItem`
//! destination, with conversion between the engine's attribute model
//! and the SDK's.

use crate::config::EndpointConfig;
use crate::error::{CloneError, Result};
use crate::item::{AttrValue, Cursor, Item};
use crate::source::{ScanPage, TableSource};
use crate::target::TableTarget;
use async_trait::async_trait;
use aws_sdk_dynamodb::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::{AttributeValue, PutRequest, WriteRequest};
use aws_sdk_dynamodb::Client;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// BatchWriteItem accepts at most 25 put requests per call.
const BATCH_WRITE_CHUNK: usize = 25;

/// Retries for unprocessed items before giving up.
const MAX_UNPROCESSED_RETRIES: u32 = 8;

/// Build a DynamoDB client for an endpoint with explicit static
/// credentials.
pub fn client_for(endpoint: &EndpointConfig) -> Client {
    let credentials = Credentials::new(
        endpoint.access_key_id.clone(),
        endpoint.secret_access_key.clone(),
        None,
        None,
        "dynamo-clone",
    );
    let config = aws_sdk_dynamodb::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new(endpoint.region.clone()))
        .credentials_provider(credentials)
        .build();
    Client::from_conf(config)
}

/// Scanning side of a DynamoDB table.
pub struct DynamoSource {
    client: Client,
    table: String,
}

impl DynamoSource {
    /// Connect to the source table described by `endpoint`.
    pub fn new(endpoint: &EndpointConfig) -> Self {
        Self {
            client: client_for(endpoint),
            table: endpoint.table.clone(),
        }
    }
}

#[async_trait]
impl TableSource for DynamoSource {
    async fn scan(&self, cursor: Option<&Cursor>) -> Result<ScanPage> {
        let start_key = cursor.map(|c| to_sdk_item(c.key()));

        let output = self
            .client
            .scan()
            .table_name(&self.table)
            .set_exclusive_start_key(start_key)
            .send()
            .await
            .map_err(|e| CloneError::source(format!("{}", DisplayErrorContext(&e))))?;

        let items = output
            .items
            .unwrap_or_default()
            .into_iter()
            .map(from_sdk_item)
            .collect::<Result<Vec<Item>>>()?;

        let next_cursor = output
            .last_evaluated_key
            .map(from_sdk_item)
            .transpose()?
            .map(Cursor::new);

        Ok(ScanPage { items, next_cursor })
    }

    async fn count_hint(&self) -> Result<Option<u64>> {
        let output = self
            .client
            .describe_table()
            .table_name(&self.table)
            .send()
            .await
            .map_err(|e| CloneError::source(format!("{}", DisplayErrorContext(&e))))?;

        Ok(output
            .table
            .and_then(|t| t.item_count)
            .map(|count| count.max(0) as u64))
    }
}

/// Writing side of a DynamoDB table.
pub struct DynamoTarget {
    client: Client,
    table: String,
}

impl DynamoTarget {
    /// Connect to the destination table described by `endpoint`.
    pub fn new(endpoint: &EndpointConfig) -> Self {
        Self {
            client: client_for(endpoint),
            table: endpoint.table.clone(),
        }
    }

    async fn write_chunk(&self, chunk: &[Item]) -> Result<()> {
        let mut requests = Vec::with_capacity(chunk.len());
        for item in chunk {
            let put = PutRequest::builder()
                .set_item(Some(to_sdk_item(item)))
                .build()
                .map_err(|e| CloneError::target(e.to_string()))?;
            requests.push(WriteRequest::builder().put_request(put).build());
        }

        let mut pending: HashMap<String, Vec<WriteRequest>> =
            HashMap::from([(self.table.clone(), requests)]);

        // BatchWriteItem is not atomic: it can accept part of a chunk
        // and hand the rest back as unprocessed. Keep resubmitting until
        // the whole chunk is durably accepted, or fail the page so the
        // checkpoint never advances past it.
        let mut attempts = 0;
        loop {
            let output = self
                .client
                .batch_write_item()
                .set_request_items(Some(pending))
                .send()
                .await
                .map_err(|e| CloneError::target(format!("{}", DisplayErrorContext(&e))))?;

            let unprocessed = output.unprocessed_items.unwrap_or_default();
            if unprocessed.values().all(|reqs| reqs.is_empty()) {
                return Ok(());
            }

            attempts += 1;
            if attempts > MAX_UNPROCESSED_RETRIES {
                return Err(CloneError::target(format!(
                    "{} items still unprocessed after {} retries",
                    unprocessed.values().map(Vec::len).sum::<usize>(),
                    MAX_UNPROCESSED_RETRIES
                )));
            }

            debug!(
                "Retrying {} unprocessed items (attempt {})",
                unprocessed.values().map(Vec::len).sum::<usize>(),
                attempts
            );
            tokio::time::sleep(Duration::from_millis(100 * u64::from(attempts))).await;
            pending = unprocessed;
        }
    }
}

#[async_trait]
impl TableTarget for DynamoTarget {
    async fn write_batch(&self, items: &[Item]) -> Result<()> {
        for chunk in items.chunks(BATCH_WRITE_CHUNK) {
            self.write_chunk(chunk).await?;
        }
        Ok(())
    }
}

fn to_sdk_value(value: &AttrValue) -> AttributeValue {
    match value {
        AttrValue::S(s) => AttributeValue::S(s.clone()),
        AttrValue::N(n) => AttributeValue::N(n.clone()),
        AttrValue::B(b) => AttributeValue::B(Blob::new(b.clone())),
        AttrValue::Bool(b) => AttributeValue::Bool(*b),
        AttrValue::Null(b) => AttributeValue::Null(*b),
        AttrValue::L(list) => AttributeValue::L(list.iter().map(to_sdk_value).collect()),
        AttrValue::M(map) => AttributeValue::M(
            map.iter()
                .map(|(k, v)| (k.clone(), to_sdk_value(v)))
                .collect(),
        ),
        AttrValue::Ss(set) => AttributeValue::Ss(set.clone()),
        AttrValue::Ns(set) => AttributeValue::Ns(set.clone()),
        AttrValue::Bs(set) => {
            AttributeValue::Bs(set.iter().map(|b| Blob::new(b.clone())).collect())
        }
    }
}

fn from_sdk_value(value: AttributeValue) -> Result<AttrValue> {
    Ok(match value {
        AttributeValue::S(s) => AttrValue::S(s),
        AttributeValue::N(n) => AttrValue::N(n),
        AttributeValue::B(b) => AttrValue::B(b.into_inner()),
        AttributeValue::Bool(b) => AttrValue::Bool(b),
        AttributeValue::Null(b) => AttrValue::Null(b),
        AttributeValue::L(list) => {
            AttrValue::L(list.into_iter().map(from_sdk_value).collect::<Result<_>>()?)
        }
        AttributeValue::M(map) => AttrValue::M(
            map.into_iter()
                .map(|(k, v)| Ok((k, from_sdk_value(v)?)))
                .collect::<Result<_>>()?,
        ),
        AttributeValue::Ss(set) => AttrValue::Ss(set),
        AttributeValue::Ns(set) => AttrValue::Ns(set),
        AttributeValue::Bs(set) => {
            AttrValue::Bs(set.into_iter().map(Blob::into_inner).collect())
        }
        other => {
            return Err(CloneError::source(format!(
                "unsupported attribute value: {:?}",
                other
            )))
        }
    })
}

fn to_sdk_item(item: &Item) -> HashMap<String, AttributeValue> {
    item.iter()
        .map(|(k, v)| (k.clone(), to_sdk_value(v)))
        .collect()
}

fn from_sdk_item(item: HashMap<String, AttributeValue>) -> Result<Item> {
    item.into_iter()
        .map(|(k, v)| Ok((k, from_sdk_value(v)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_value_round_trip_through_sdk() {
        let mut map = BTreeMap::new();
        map.insert("id".to_string(), AttrValue::N("7".to_string()));
        let original = AttrValue::L(vec![
            AttrValue::S("a".to_string()),
            AttrValue::B(vec![1, 2, 3]),
            AttrValue::Bool(true),
            AttrValue::Null(true),
            AttrValue::M(map),
            AttrValue::Ss(vec!["x".to_string()]),
            AttrValue::Ns(vec!["1".to_string(), "2".to_string()]),
            AttrValue::Bs(vec![vec![9]]),
        ]);

        let back = from_sdk_value(to_sdk_value(&original)).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn test_item_round_trip_through_sdk() {
        let mut item = Item::new();
        item.insert("pk".to_string(), AttrValue::S("user#1".to_string()));
        item.insert("count".to_string(), AttrValue::N("3".to_string()));

        let back = from_sdk_item(to_sdk_item(&item)).unwrap();
        assert_eq!(back, item);
    }
}
