//! 🎬 *[documents pile up in a Vec. nobody sends them. not yet.]*
//! *[the reader finishes. the room goes quiet. then: one request, carrying everything.]*
//!
//! 📦 The Bulk Submitter. It queues rendered `index` operations for the whole run
//! and flushes them at the very end, in ONE round trip by default.
//!
//! 🧠 Knowledge graph:
//! - `queue`: `VerseDoc` → `ElasticsearchBulk` two-line item → pending Vec
//! - `flush`: pending Vec → NDJSON payload (trailing `\n`) → `DocumentStore::bulk`
//! - `max_docs_per_request` (optional) splits the flush into several requests.
//!   Unset means the whole dataset goes in one request, however big it is.
//! - Per-item failures in the response are fatal, same as transport failures.
//!
//! 🦆 (the duck asks: if a bulk request carries the whole Bible, is it a canon request?)

use anyhow::{Context, Result};
use tracing::{debug, trace};

use crate::backends::DocumentStore;
use crate::common::VerseDoc;
use crate::transforms::{EgressTransform, ElasticsearchBulk};

/// 📡 Join rendered items into one `_bulk` body. Each item gets exactly one trailing
/// `\n`; for two-line items that yields `action\nsource\n` per document.
fn collect_ndjson(items: &[String]) -> String {
    let estimated_size: usize = items.iter().map(|s| s.len() + 1).sum();
    let mut payload = String::with_capacity(estimated_size);
    for item in items {
        payload.push_str(item);
        payload.push('\n');
    }
    payload
}

/// 📊 What a flush did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BulkReport {
    pub requests: usize,
    pub documents: usize,
}

/// 📦 Holds every rendered document until `flush`. Nothing leaves early.
#[derive(Debug)]
pub(crate) struct BulkSubmitter {
    index: String,
    max_docs_per_request: Option<usize>,
    pending: Vec<String>,
}

impl BulkSubmitter {
    pub(crate) fn new(index: &str, max_docs_per_request: Option<usize>) -> Self {
        Self {
            index: index.to_string(),
            // -- a chunk size of 0 would loop forever in spirit; treat it as "no chunking"
            max_docs_per_request: max_docs_per_request.filter(|&n| n > 0),
            pending: Vec::new(),
        }
    }

    /// 📥 Render and park one document as an `index` operation keyed by its `es_id`.
    pub(crate) fn queue(&mut self, doc: &VerseDoc) -> Result<()> {
        let the_item = ElasticsearchBulk::transform_doc(doc, &self.index)?;
        self.pending.push(the_item);
        Ok(())
    }

    pub(crate) fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// 🚀 Send everything. One request unless chunking was asked for.
    ///
    /// An empty queue sends nothing. On success the queue is empty again; on failure
    /// the error propagates and the run is over anyway.
    pub(crate) async fn flush<S: DocumentStore + ?Sized>(&mut self, store: &S) -> Result<BulkReport> {
        let mut the_report = BulkReport::default();
        if self.pending.is_empty() {
            debug!("📭 Nothing queued, skipping the bulk request");
            return Ok(the_report);
        }

        let chunk_size = self.max_docs_per_request.unwrap_or(self.pending.len());
        for the_chunk in self.pending.chunks(chunk_size) {
            let the_payload = collect_ndjson(the_chunk);
            trace!(
                "📦 Bulk request #{}: {} documents, {} bytes",
                the_report.requests + 1,
                the_chunk.len(),
                the_payload.len()
            );

            let the_response = store.bulk(the_payload).await.context(format!(
                "💀 Bulk request #{} ({} documents) for index '{}' failed. Nothing after it was sent.",
                the_report.requests + 1,
                the_chunk.len(),
                self.index
            ))?;

            if the_response.errors {
                let failed = the_response.failed_items().count();
                anyhow::bail!(
                    "💀 Elasticsearch accepted bulk request #{} but rejected {} of its {} documents. First reason: {}",
                    the_report.requests + 1,
                    failed,
                    the_chunk.len(),
                    the_response
                        .first_failure_reason()
                        .unwrap_or_else(|| "none given".to_string())
                );
            }

            the_report.requests += 1;
            the_report.documents += the_chunk.len();
        }

        debug!(
            "✅ {} documents emigrated to '{}' in {} request(s)",
            the_report.documents, self.index, the_report.requests
        );
        self.pending.clear();
        Ok(the_report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::in_mem::InMemoryStore;
    use crate::common::TranslationTable;
    use crate::transforms::VerseTransformer;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn the_docs(count: usize) -> Vec<VerseDoc> {
        let the_transformer = VerseTransformer::new(TranslationTable::standard(), "kjv");
        (1..=count)
            .map(|verse| {
                the_transformer
                    .build_doc(&format!("Genesis 1:{}", verse), "text")
                    .expect("💀 fixture docs should build")
            })
            .collect()
    }

    #[test]
    fn the_one_where_ndjson_ends_with_a_newline() {
        let the_payload = collect_ndjson(&["a\nb".to_string(), "c\nd".to_string()]);
        assert_eq!(the_payload, "a\nb\nc\nd\n");
        assert_eq!(collect_ndjson(&[]), "");
    }

    #[tokio::test]
    async fn the_one_where_everything_goes_in_one_trip() -> Result<()> {
        let the_store = InMemoryStore::new();
        let mut the_submitter = BulkSubmitter::new("bible-v1", None);
        let the_docs = the_docs(3);
        for doc in &the_docs {
            the_submitter.queue(doc)?;
        }
        assert_eq!(the_submitter.pending_len(), 3);

        let the_report = the_submitter.flush(&the_store).await?;
        assert_eq!(the_report, BulkReport { requests: 1, documents: 3 });
        assert_eq!(the_submitter.pending_len(), 0);

        let the_state = the_store.state.lock().await;
        assert_eq!(the_state.bulk_payloads.len(), 1);
        let the_lines: Vec<&str> = the_state.bulk_payloads[0].lines().collect();
        assert_eq!(the_lines.len(), 6);
        let the_first_action: serde_json::Value = serde_json::from_str(the_lines[0])?;
        assert_eq!(the_first_action["index"]["_id"], the_docs[0].es_id.to_string());
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_chunking_was_requested_politely() -> Result<()> {
        let the_store = InMemoryStore::new();
        let mut the_submitter = BulkSubmitter::new("bible-v1", Some(2));
        for doc in &the_docs(5) {
            the_submitter.queue(doc)?;
        }
        let the_report = the_submitter.flush(&the_store).await?;
        assert_eq!(the_report, BulkReport { requests: 3, documents: 5 });
        assert_eq!(the_store.state.lock().await.bulk_payloads.len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_zero_chunk_size_means_no_chunking() -> Result<()> {
        let the_store = InMemoryStore::new();
        let mut the_submitter = BulkSubmitter::new("bible-v1", Some(0));
        for doc in &the_docs(4) {
            the_submitter.queue(doc)?;
        }
        assert_eq!(the_submitter.flush(&the_store).await?.requests, 1);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_an_empty_queue_sends_nothing() -> Result<()> {
        let the_store = InMemoryStore::new();
        let mut the_submitter = BulkSubmitter::new("bible-v1", None);
        assert_eq!(the_submitter.flush(&the_store).await?, BulkReport::default());
        assert!(the_store.state.lock().await.bulk_payloads.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_item_errors_sink_the_whole_run() -> Result<()> {
        use crate::backends::elasticsearch::{ElasticsearchConfig, ElasticsearchStore};

        let the_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&the_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/_bulk"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "errors": true,
                "items": [
                    {"index": {"status": 201}},
                    {"index": {"status": 400, "error": {"reason": "failed to parse field [verse_no]"}}}
                ]
            })))
            .mount(&the_server)
            .await;
        let the_store = ElasticsearchStore::new(ElasticsearchConfig {
            url: the_server.uri(),
            ..Default::default()
        })
        .await?;

        let mut the_submitter = BulkSubmitter::new("bible-v1", None);
        for doc in &the_docs(2) {
            the_submitter.queue(doc)?;
        }
        let the_error = the_submitter
            .flush(&the_store)
            .await
            .expect_err("💀 item failures must fail the flush");
        let the_message = the_error.to_string();
        assert!(the_message.contains("rejected 1 of its 2"));
        assert!(the_message.contains("failed to parse field [verse_no]"));
        Ok(())
    }
}
