//! 🎬 *[camera pans across a dimly lit server room]*
//! 🎬 "In a world where verses sat unindexed..."
//! 🎬 "One supervisor dared to load them all. Once."
//! 🎬 *[record scratch]* 🦆
//!
//! 📦 The Supervisor runs the whole load, start to finish, strictly in order:
//!
//! 1. connect to the store (ping). Unreachable cluster → stop here.
//! 2. provision the index (delete if asked, create if absent)
//! 3. open the input file. Missing file → stop here, index already provisioned.
//! 4. read every array, transform every record, queue every document
//! 5. flush the queue in bulk, then "Data Loaded"
//!
//! Any fatal error ends the run with nothing else attempted. Malformed verse
//! references are the one exception: warned about, counted, skipped.

use std::future::Future;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::app_config::AppConfig;
use crate::backends::{DocumentStore, Source, SourceBackend, StoreBackend};
use crate::bulk::BulkSubmitter;
use crate::common::TranslationTable;
use crate::provisioner::provision;
use crate::transforms::VerseTransformer;

/// 📊 How the run went, for the CLI to show off.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// 📖 records decoded from the input, good and bad
    pub records_read: u64,
    /// ✅ documents the store accepted
    pub documents_indexed: u64,
    /// ⚠️ records dropped for a malformed reference
    pub records_skipped: u64,
    pub bulk_requests: u64,
    pub index_created: bool,
    pub index_deleted: bool,
}

/// 📦 The Supervisor: owns the config, borrows nobody's patience.
pub(crate) struct Supervisor {
    app_config: AppConfig,
}

impl Supervisor {
    pub(crate) fn new(app_config: AppConfig) -> Self {
        Self { app_config }
    }

    /// 🚀 Connect to the store from config and drive the load. The source is opened
    /// by `drive`, after provisioning.
    pub(crate) async fn start(&self) -> Result<RunSummary> {
        let store = StoreBackend::from_config(&self.app_config.store_config)
            .await
            .context("💀 Could not connect to the document store")?;
        self.drive(&store, || async {
            SourceBackend::from_config(&self.app_config.source_config)
                .await
                .context("💀 Could not open the verse source")
        })
        .await
    }

    /// 🔄 Provision, open, read, transform, queue, flush. Generic over the seams so tests
    /// can hand in whatever source and store they like.
    ///
    /// `open_source` runs only once the index is provisioned, so a delete request
    /// still takes effect when the input turns out to be missing.
    pub(crate) async fn drive<St, Src, Open, Opening>(
        &self,
        store: &St,
        open_source: Open,
    ) -> Result<RunSummary>
    where
        St: DocumentStore + ?Sized,
        Src: Source,
        Open: FnOnce() -> Opening,
        Opening: Future<Output = Result<Src>>,
    {
        let mut the_summary = RunSummary::default();

        let the_outcome = provision(store, &self.app_config.index).await?;
        the_summary.index_deleted = the_outcome.deleted;
        the_summary.index_created = the_outcome.created;

        let mut source = open_source().await?;

        let the_transformer = VerseTransformer::new(
            TranslationTable::standard(),
            &self.app_config.transform.translation,
        );
        debug!("📖 Loading the '{}' text of every verse", the_transformer.translation());
        let mut the_submitter = BulkSubmitter::new(
            &self.app_config.index.name,
            self.app_config.bulk.max_docs_per_request,
        );

        while let Some(batch) = source.next_batch().await? {
            debug!("📖 Transforming a batch of {} records", batch.len());
            for record in &batch {
                the_summary.records_read += 1;
                match the_transformer.transform(record) {
                    Ok(doc) => the_submitter.queue(&doc)?,
                    Err(err) => {
                        warn!("⚠️ Skipping record #{}: {}", the_summary.records_read, err);
                        the_summary.records_skipped += 1;
                    }
                }
            }
        }

        debug!(
            "📦 {} documents queued for '{}'",
            the_submitter.pending_len(),
            self.app_config.index.name
        );
        let the_report = the_submitter.flush(store).await?;
        the_summary.bulk_requests = the_report.requests as u64;
        the_summary.documents_indexed = the_report.documents as u64;

        info!(
            index = %self.app_config.index.name,
            documents = the_summary.documents_indexed,
            skipped = the_summary.records_skipped,
            "✅ Data Loaded"
        );
        Ok(the_summary)
    }
}
