//! 🔌 Backends - where the real I/O happens.
//!
//! 🚰 Sources pour verse records out of somewhere. Stores take documents and keep them.
//! And in between, we panic! (kidding, we use anyhow)
//!
//! 🎭 This module is the casting agency:
//! - [`Source`] / [`SourceBackend`]: the Record Reader. A JSON file on disk. Tests
//!   also hand the supervisor a handful of batches in RAM through the same trait.
//! - [`DocumentStore`] / [`StoreBackend`]: the Store Client. Elasticsearch over HTTP,
//!   or an in-memory stand-in that records everything it was asked to do.
//!
//! 🦆 The duck is here because every file must have one. This is law.

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::app_config::{SourceConfig, StoreConfig};
use crate::common::RawVerseRecord;

pub(crate) mod elasticsearch;
pub(crate) mod file;
pub(crate) mod in_mem;

pub use elasticsearch::ElasticsearchConfig;
pub use file::FileSourceConfig;

// ===== Source Trait and Backend Enum =====

/// 🚰 A source of verse records, one decoded array per call.
///
/// # Contract 📜
/// - `Ok(Some(batch))` while arrays keep coming. A batch may be empty (`[]` is valid JSON).
/// - `Ok(None)` at clean end of input. The well is dry. 🏁
/// - `Err(...)` on anything else. Decode errors are fatal, no partial credit.
#[async_trait]
pub(crate) trait Source: std::fmt::Debug + Send {
    async fn next_batch(&mut self) -> Result<Option<Vec<RawVerseRecord>>>;
}

/// 🎭 The sources a config can name. One face for now: the file.
#[derive(Debug)]
pub(crate) enum SourceBackend {
    File(file::FileSource),
}

impl SourceBackend {
    /// 🏗️ Open whatever the config points at. A missing or unreadable input fails here.
    pub(crate) async fn from_config(config: &SourceConfig) -> Result<Self> {
        match config {
            SourceConfig::File(file_config) => Ok(SourceBackend::File(
                file::FileSource::new(file_config.clone()).await?,
            )),
        }
    }
}

#[async_trait]
impl Source for SourceBackend {
    async fn next_batch(&mut self) -> Result<Option<Vec<RawVerseRecord>>> {
        match self {
            SourceBackend::File(source) => source.next_batch().await,
        }
    }
}

// ===== Store Trait and Backend Enum =====

/// 📬 What the store says back after a `_bulk` call.
///
/// Elasticsearch answers 200 even when half the documents bounced, so the real
/// verdict lives in `errors` and in each item. We keep items as raw JSON; the
/// only thing we ever ask of them is "did you fail, and why".
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct BulkResponse {
    #[serde(default)]
    pub errors: bool,
    #[serde(default)]
    pub items: Vec<Value>,
}

impl BulkResponse {
    /// 💀 Items carrying an `error` object, whatever the action key was.
    pub(crate) fn failed_items(&self) -> impl Iterator<Item = &Value> {
        self.items.iter().filter_map(|item| {
            item.as_object()
                .and_then(|actions| actions.values().next())
                .filter(|result| result.get("error").is_some())
        })
    }

    /// 🔍 The first failure reason, for the error message. Falls back to the raw error JSON.
    pub(crate) fn first_failure_reason(&self) -> Option<String> {
        self.failed_items().next().map(|result| {
            let the_error = &result["error"];
            the_error
                .get("reason")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| the_error.to_string())
        })
    }
}

/// 🗄️ The Store Client contract: index lifecycle plus bulk submission.
///
/// # Contract 📜
/// - `index_exists`: a plain yes/no. Anything the store can't answer cleanly is an `Err`.
/// - `delete_index` / `create_index`: return the store's `acknowledged` flag.
///   Deleting an index that isn't there is `Ok(false)`, not an error.
/// - `bulk`: one payload, one round trip. Transport and HTTP failures are `Err`;
///   per-item failures come back inside the [`BulkResponse`] for the caller to judge.
#[async_trait]
pub(crate) trait DocumentStore: std::fmt::Debug + Send + Sync {
    async fn index_exists(&self, index: &str) -> Result<bool>;
    async fn delete_index(&self, index: &str) -> Result<bool>;
    async fn create_index(&self, index: &str, body: &Value) -> Result<bool>;
    async fn bulk(&self, payload: String) -> Result<BulkResponse>;
}

/// 🎭 Store dispatch. The supervisor holds one of these and never asks which.
#[derive(Debug)]
pub(crate) enum StoreBackend {
    InMemory(in_mem::InMemoryStore),
    Elasticsearch(elasticsearch::ElasticsearchStore),
}

impl StoreBackend {
    /// 🏗️ Connect to whatever the config points at. For Elasticsearch this pings the
    /// cluster, so an unreachable store fails here, before the file is even read.
    pub(crate) async fn from_config(config: &StoreConfig) -> Result<Self> {
        match config {
            StoreConfig::Elasticsearch(es_config) => Ok(StoreBackend::Elasticsearch(
                elasticsearch::ElasticsearchStore::new(es_config.clone()).await?,
            )),
            StoreConfig::InMemory => Ok(StoreBackend::InMemory(in_mem::InMemoryStore::new())),
        }
    }
}

#[async_trait]
impl DocumentStore for StoreBackend {
    async fn index_exists(&self, index: &str) -> Result<bool> {
        match self {
            StoreBackend::InMemory(store) => store.index_exists(index).await,
            StoreBackend::Elasticsearch(store) => store.index_exists(index).await,
        }
    }

    async fn delete_index(&self, index: &str) -> Result<bool> {
        match self {
            StoreBackend::InMemory(store) => store.delete_index(index).await,
            StoreBackend::Elasticsearch(store) => store.delete_index(index).await,
        }
    }

    async fn create_index(&self, index: &str, body: &Value) -> Result<bool> {
        match self {
            StoreBackend::InMemory(store) => store.create_index(index, body).await,
            StoreBackend::Elasticsearch(store) => store.create_index(index, body).await,
        }
    }

    async fn bulk(&self, payload: String) -> Result<BulkResponse> {
        match self {
            StoreBackend::InMemory(store) => store.bulk(payload).await,
            StoreBackend::Elasticsearch(store) => store.bulk(payload).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn the_one_where_a_clean_bulk_response_has_nothing_to_confess() {
        let the_response: BulkResponse = serde_json::from_value(json!({
            "took": 3,
            "errors": false,
            "items": [{"index": {"_id": "a", "status": 201}}]
        }))
        .expect("💀 bulk response should parse");
        assert!(!the_response.errors);
        assert_eq!(the_response.failed_items().count(), 0);
        assert_eq!(the_response.first_failure_reason(), None);
    }

    #[test]
    fn the_one_where_one_verse_bounced_and_we_know_why() {
        let the_response: BulkResponse = serde_json::from_value(json!({
            "errors": true,
            "items": [
                {"index": {"_id": "a", "status": 201}},
                {"index": {"_id": "b", "status": 400, "error": {
                    "type": "mapper_parsing_exception",
                    "reason": "failed to parse field [chapter_no]"
                }}},
                {"index": {"_id": "c", "status": 429, "error": {"type": "es_rejected_execution_exception"}}}
            ]
        }))
        .expect("💀 bulk response should parse");
        assert_eq!(the_response.failed_items().count(), 2);
        assert_eq!(
            the_response.first_failure_reason().as_deref(),
            Some("failed to parse field [chapter_no]")
        );
    }

    #[test]
    fn the_one_where_a_reasonless_error_still_says_something() {
        let the_response: BulkResponse = serde_json::from_value(json!({
            "errors": true,
            "items": [{"index": {"_id": "c", "status": 429, "error": {"type": "es_rejected_execution_exception"}}}]
        }))
        .expect("💀 bulk response should parse");
        let the_reason = the_response.first_failure_reason().expect("💀 there was an error");
        assert!(the_reason.contains("es_rejected_execution_exception"));
    }
}
