//! 🔧 App Configuration - the sacred TOML-to-struct pipeline.
//!
//! 📡 "Config not found: We looked everywhere. Under the couch. Behind the fridge.
//! In the junk drawer. Nothing." - every developer at 3am 🦆
//!
//! 🏗️ Powered by Figment. Layers, lowest to highest:
//! 1. serde defaults (localhost:9200, `bible-v1`, `kjv`, the usual file name)
//! 2. `VDX_*` environment variables, `__` for nesting (`VDX_INDEX__NAME=bible-v2`)
//! 3. the TOML file, when one was given
//!
//! Then one last word from the environment: `DELETE_INDEX=true` (any casing) asks for
//! the index to be dropped before the load, OR'ed with `index.delete_index`.

use std::path::Path;

use anyhow::Context;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;
use tracing::info;

pub use crate::backends::{ElasticsearchConfig, FileSourceConfig};

/// 🚩 The one env var that isn't `VDX_` prefixed. It predates the prefix.
pub const DELETE_INDEX_ENV: &str = "DELETE_INDEX";

/// 📦 The AppConfig: one struct to rule them all, one struct to find them,
/// one struct to bring them all, and in the Figment bind them.
///
/// Every section has a default, so an empty config is a valid config: it loads
/// `os-bibles-escape-chr.json` as KJV into `bible-v1` on localhost.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    /// 📡 Where the verses come from.
    pub source_config: SourceConfig,
    /// 🗄️ Where the documents go.
    pub store_config: StoreConfig,
    pub index: IndexConfig,
    pub transform: TransformConfig,
    pub bulk: BulkConfig,
}

/// 🚰 Input selection. Externally tagged, so TOML reads `[source_config.File]`.
#[derive(Debug, Deserialize, Clone)]
pub enum SourceConfig {
    #[serde(alias = "file")]
    File(FileSourceConfig),
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::File(FileSourceConfig::default())
    }
}

/// 🗄️ Store selection. `store_config = "InMemory"` is a dry run: everything happens,
/// nothing leaves the process.
#[derive(Debug, Deserialize, Clone)]
pub enum StoreConfig {
    // -- lowercase aliases: figment lowercases env keys, serde does not forgive
    #[serde(alias = "elasticsearch")]
    Elasticsearch(ElasticsearchConfig),
    #[serde(alias = "in_memory", alias = "inmemory")]
    InMemory,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::Elasticsearch(ElasticsearchConfig::default())
    }
}

/// 🏷️ The target index and what to do with the one already there.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct IndexConfig {
    pub name: String,
    /// 🗑️ Drop the index before loading. `DELETE_INDEX=true` also sets this.
    pub delete_index: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            name: "bible-v1".to_string(),
            delete_index: false,
        }
    }
}

/// 📖 Which translation's text becomes the `verse` field.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct TransformConfig {
    pub translation: String,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            translation: "kjv".to_string(),
        }
    }
}

/// 📦 Bulk submission knobs. Unset `max_docs_per_request` means one request for everything.
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct BulkConfig {
    pub max_docs_per_request: Option<usize>,
}

/// 🚩 Is this `DELETE_INDEX` value a yes? Only "true", in any casing. "1", "yes",
/// and "TRUE " with a trailing space are all no. Unset is no.
pub fn delete_index_requested(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

/// 🚀 Load the config from env vars and, optionally, a TOML file.
///
/// 📐 `None` means env vars and defaults only. `Some(path)` layers the file on top,
/// and the file wins on conflicts.
///
/// 💀 Returns an error if the config is unparseable, with the file name in the message.
pub fn load_config(config_file_name: Option<&Path>) -> anyhow::Result<AppConfig> {
    info!(
        "🔧 Loading configuration: {:#?}",
        config_file_name.unwrap_or(Path::new(""))
    );

    let mut app_config = extract_config(config_file_name)?;
    if delete_index_requested(std::env::var(DELETE_INDEX_ENV).ok().as_deref()) {
        app_config.index.delete_index = true;
    }
    Ok(app_config)
}

// -- the figment half of load_config, kept apart so tests don't trip over a stray DELETE_INDEX
fn extract_config(config_file_name: Option<&Path>) -> anyhow::Result<AppConfig> {
    let config = Figment::new().merge(Env::prefixed("VDX_").split("__"));

    let config = match config_file_name {
        Some(file_name) => config.merge(Toml::file(file_name)),
        None => config,
    };

    let context_msg = match config_file_name {
        Some(path) => format!(
            "💀 Failed to parse configuration from file '{}' and environment variables (VDX_*). \
             The file exists in our hearts, and the TOML inside it disagrees with us.",
            path.display()
        ),
        None => "💀 Failed to parse configuration from environment variables (VDX_*). \
                 No file was provided, so this one's all on the environment. Classic."
            .to_string(),
    };

    config.extract().context(context_msg)
}
