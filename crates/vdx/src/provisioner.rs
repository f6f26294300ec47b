//! 🏗️ The Index Provisioner. Before a single verse moves, the index has to be
//! in the right shape: gone (if asked), then present with the verse mapping.
//!
//! 🧠 Knowledge graph:
//! - delete requested → `DELETE /{index}` → "Index deleted" (ack logged)
//! - exists? → leave it alone, mapping untouched, even if it's not ours
//! - absent → `PUT /{index}` with [`index_mapping`] → "Index created" (ack logged)
//!
//! 🦆 The duck has no opinion on shard counts.

use anyhow::{Context, Result};
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::app_config::IndexConfig;
use crate::backends::DocumentStore;

/// 📐 Settings plus typeless mappings for the verse documents.
///
/// One shard, no replicas: a Bible fits on one node with room for the Apocrypha.
/// `book` and `es_id` are stored but not searchable; `verse` is the full-text field.
pub(crate) fn index_mapping() -> Value {
    json!({
        "settings": {
            "number_of_shards": 1,
            "number_of_replicas": 0
        },
        "mappings": {
            "properties": {
                "epochtime_loaded": { "type": "date" },
                "version": { "type": "nested" },
                "book": { "type": "keyword", "index": false },
                "chapter_no": { "type": "integer" },
                "verse_no": { "type": "integer" },
                "verse": { "type": "text", "index": true },
                "es_id": { "type": "text", "index": false },
                "utctime_loaded": { "type": "date" }
            }
        }
    })
}

/// 📊 What provisioning did to the index.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ProvisionOutcome {
    /// 🗑️ a delete was issued
    pub deleted: bool,
    pub delete_acknowledged: bool,
    /// 🏗️ a create was issued and succeeded
    pub created: bool,
    /// the index was there after the delete step, so nothing was created
    pub already_existed: bool,
}

/// 🚀 Get the index ready. Any store error is fatal and carries the index name.
pub(crate) async fn provision<S: DocumentStore + ?Sized>(
    store: &S,
    index_config: &IndexConfig,
) -> Result<ProvisionOutcome> {
    let index = index_config.name.as_str();
    let mut the_outcome = ProvisionOutcome::default();

    if index_config.delete_index {
        let acknowledged = store
            .delete_index(index)
            .await
            .context(format!("💀 Could not delete index '{}'", index))?;
        the_outcome.deleted = true;
        the_outcome.delete_acknowledged = acknowledged;
        info!(index, acknowledged, "🗑️ Index deleted");
    }

    let exists = store
        .index_exists(index)
        .await
        .context(format!("💀 Could not check whether index '{}' exists", index))?;
    if exists {
        // -- not our mapping to judge. existing indices are left exactly as found.
        info!(
            index,
            "📚 Index already exists, mapping left untouched. Set DELETE_INDEX=true to start over."
        );
        the_outcome.already_existed = true;
        return Ok(the_outcome);
    }

    let acknowledged = store
        .create_index(index, &index_mapping())
        .await
        .context(format!("💀 Could not create index '{}'", index))?;
    the_outcome.created = true;
    info!(index, acknowledged, "🏗️ Index created");
    if !acknowledged {
        warn!(
            index,
            "⚠️ Index creation was not acknowledged in time. It may still appear; loading anyway."
        );
    }

    Ok(the_outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::in_mem::InMemoryStore;

    fn the_index(delete_index: bool) -> IndexConfig {
        IndexConfig {
            name: "bible-v1".to_string(),
            delete_index,
        }
    }

    #[test]
    fn the_one_where_the_mapping_says_what_it_means() {
        let the_mapping = index_mapping();
        assert_eq!(the_mapping["settings"]["number_of_shards"], 1);
        assert_eq!(the_mapping["settings"]["number_of_replicas"], 0);
        let the_props = &the_mapping["mappings"]["properties"];
        assert_eq!(the_props.as_object().map(|p| p.len()), Some(8));
        assert_eq!(the_props["book"], json!({"type": "keyword", "index": false}));
        assert_eq!(the_props["verse"], json!({"type": "text", "index": true}));
        assert_eq!(the_props["es_id"], json!({"type": "text", "index": false}));
        assert_eq!(the_props["version"]["type"], "nested");
        assert_eq!(the_props["epochtime_loaded"]["type"], "date");
        assert_eq!(the_props["utctime_loaded"]["type"], "date");
        assert_eq!(the_props["chapter_no"]["type"], "integer");
        assert_eq!(the_props["verse_no"]["type"], "integer");
    }

    #[tokio::test]
    async fn the_one_where_a_fresh_cluster_gets_a_fresh_index() -> Result<()> {
        let the_store = InMemoryStore::new();
        let the_outcome = provision(&the_store, &the_index(false)).await?;
        assert_eq!(
            the_outcome,
            ProvisionOutcome {
                created: true,
                ..Default::default()
            }
        );
        let the_state = the_store.state.lock().await;
        assert_eq!(the_state.indices.get("bible-v1"), Some(&index_mapping()));
        assert_eq!(the_state.delete_calls, 0);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_an_existing_index_is_left_alone() -> Result<()> {
        let the_store = InMemoryStore::with_existing_index("bible-v1", json!({"mine": true}));
        let the_outcome = provision(&the_store, &the_index(false)).await?;
        assert!(the_outcome.already_existed);
        assert!(!the_outcome.created);
        let the_state = the_store.state.lock().await;
        assert_eq!(the_state.create_calls, 0);
        assert_eq!(the_state.indices.get("bible-v1"), Some(&json!({"mine": true})));
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_delete_then_recreate_gets_our_mapping_back() -> Result<()> {
        let the_store = InMemoryStore::with_existing_index("bible-v1", json!({"stale": true}));
        let the_outcome = provision(&the_store, &the_index(true)).await?;
        assert_eq!(
            the_outcome,
            ProvisionOutcome {
                deleted: true,
                delete_acknowledged: true,
                created: true,
                already_existed: false,
            }
        );
        let the_state = the_store.state.lock().await;
        assert_eq!(the_state.indices.get("bible-v1"), Some(&index_mapping()));
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_deleting_nothing_still_creates_something() -> Result<()> {
        let the_store = InMemoryStore::new();
        let the_outcome = provision(&the_store, &the_index(true)).await?;
        assert!(the_outcome.deleted);
        assert!(!the_outcome.delete_acknowledged);
        assert!(the_outcome.created);
        Ok(())
    }
}
