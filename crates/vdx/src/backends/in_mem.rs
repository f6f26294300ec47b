//! # Previously, on Versedex...
//!
//! 🎬 The cluster was down. The demo was in ten minutes. Someone needed a store so
//! simple it lives entirely in RAM, gone the moment you blink.
//!
//! That someone was this module.
//!
//! `in_mem` provides an in-memory [`DocumentStore`], plus a test-only `Source`.
//! The [`InMemoryStore`] keeps indices and every bulk payload behind an
//! `Arc<Mutex<...>>` so callers can inspect what arrived. Great for assertions, great
//! for trust issues, great for `store_config = "InMemory"` dry runs. The test source
//! hands out pre-built batches and then, like my motivation on a Friday afternoon,
//! yields nothing further.
//!
//! 🦆
//!
//! ✅ No network calls. No disk I/O. No heartbeat. Just vibes and heap memory.

use std::collections::HashMap;
#[cfg(test)]
use std::collections::VecDeque;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::Mutex;

use crate::backends::{BulkResponse, DocumentStore};
#[cfg(test)]
use crate::backends::Source;
#[cfg(test)]
use crate::common::RawVerseRecord;

/// 📦 A source that already knows all its batches. Pops them front to back.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct InMemorySource {
    batches: VecDeque<Vec<RawVerseRecord>>,
}

#[cfg(test)]
impl InMemorySource {
    pub(crate) fn new(batches: Vec<Vec<RawVerseRecord>>) -> Self {
        Self {
            batches: batches.into(),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl Source for InMemorySource {
    async fn next_batch(&mut self) -> Result<Option<Vec<RawVerseRecord>>> {
        Ok(self.batches.pop_front())
    }
}

/// 🔒 Everything the in-memory store has been asked to remember.
#[derive(Debug, Default)]
pub(crate) struct InMemoryState {
    /// index name → the body it was created with
    pub indices: HashMap<String, Value>,
    /// every `_bulk` payload, verbatim, in arrival order
    pub bulk_payloads: Vec<String>,
    pub create_calls: usize,
    pub delete_calls: usize,
}

/// 📦 A store that never forgets. Clone-able, because tests need to peek inside
/// after handing a copy to the supervisor. The `Arc` means everyone shares one state.
#[derive(Debug, Default, Clone)]
pub(crate) struct InMemoryStore {
    pub(crate) state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// 🏗️ A store where the index already exists, with whatever mapping you like.
    #[cfg(test)]
    pub(crate) fn with_existing_index(index: &str, body: Value) -> Self {
        let mut state = InMemoryState::default();
        state.indices.insert(index.to_string(), body);
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn index_exists(&self, index: &str) -> Result<bool> {
        Ok(self.state.lock().await.indices.contains_key(index))
    }

    async fn delete_index(&self, index: &str) -> Result<bool> {
        let mut state = self.state.lock().await;
        state.delete_calls += 1;
        Ok(state.indices.remove(index).is_some())
    }

    async fn create_index(&self, index: &str, body: &Value) -> Result<bool> {
        let mut state = self.state.lock().await;
        state.create_calls += 1;
        if state.indices.contains_key(index) {
            // -- same thing the real cluster says, minus the stack trace
            anyhow::bail!("💀 resource_already_exists_exception: index [{}] already exists", index);
        }
        state.indices.insert(index.to_string(), body.clone());
        Ok(true)
    }

    /// 🚰 Keeps the payload and answers like a cluster that accepted every document.
    async fn bulk(&self, payload: String) -> Result<BulkResponse> {
        let mut items = Vec::new();
        // -- action lines are the even lines; odd lines are the sources
        for action_line in payload.lines().step_by(2) {
            let the_action: Value = serde_json::from_str(action_line)?;
            items.push(json!({
                "index": {
                    "_index": the_action["index"]["_index"],
                    "_id": the_action["index"]["_id"],
                    "status": 201
                }
            }));
        }
        self.state.lock().await.bulk_payloads.push(payload);
        Ok(BulkResponse {
            errors: false,
            items,
        })
    }
}
