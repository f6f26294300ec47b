//! 📖 vdx: loads a JSON file of Bible verses into an Elasticsearch index, once.
//!
//! 🚰 file → verse records → verse documents → one big `_bulk` → "Data Loaded"
//!
//! The only public surface is config loading and [`run`]. Everything else is the
//! supervisor's private business. 🦆

pub mod app_config;
pub(crate) mod backends;
pub(crate) mod bulk;
pub(crate) mod common;
pub(crate) mod progress;
pub(crate) mod provisioner;
pub(crate) mod supervisors;
pub(crate) mod transforms;

use anyhow::{Context, Result};

use crate::app_config::AppConfig;
use crate::supervisors::Supervisor;

pub use crate::supervisors::RunSummary;

/// 🚀 Do the whole load described by `app_config`. Any error means the run stopped
/// where it failed; nothing is retried and nothing is rolled back.
pub async fn run(app_config: AppConfig) -> Result<RunSummary> {
    Supervisor::new(app_config)
        .start()
        .await
        .context("💀 The verse load did not finish")
}
