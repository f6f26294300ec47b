//! # 📡 THE ELASTICSEARCH BACKEND
//!
//! 🎬 COLD OPEN - INT. SERVER ROOM - 3:47 AM
//!
//! One engineer, one JSON file of scripture, one cluster on `localhost:9200` that may
//! or may not be running. "It's just a load script," they said. "It'll be fast,"
//! they said. The cluster responded with a 406 because someone forgot a header.
//!
//! 🚀 This module is the Store Client. It knows four verbs:
//! - `HEAD /{index}`: does it exist?
//! - `DELETE /{index}`: make it not exist
//! - `PUT /{index}`: make it exist, with a mapping
//! - `POST /_bulk`: fill it with verses
//!
//! It does not retry. Retries are someone else's career.
//!
//! 🦆 (mandatory duck, no context provided, none shall be requested)

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, trace};

use crate::backends::{BulkResponse, DocumentStore};

// 📡 ElasticsearchConfig - lives next to the store that uses it. Socks near feet.
// 🔧 auth is tri-modal: username+password, api_key, or "I hope anonymous works" (on localhost it does).
#[derive(Debug, Deserialize, Clone)]
pub struct ElasticsearchConfig {
    /// 📡 Scheme + host + port. All of it.
    #[serde(default = "default_url")]
    pub url: String,
    /// 🔒 Username for basic auth. Optional, like flossing.
    #[serde(default)]
    pub username: Option<String>,
    /// 🔒 Password. If this is in plaintext in your config file, we've filed a complaint.
    #[serde(default)]
    pub password: Option<String>,
    /// 🔒 API key. Wins over basic auth when both are set. Hierarchy.
    #[serde(default)]
    pub api_key: Option<String>,
    /// ⏱️ How long to wait for a TCP handshake before giving up on the cluster.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// ⏱️ How long to wait for any single response. The one big bulk request is the
    /// reason this is generous.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_url() -> String {
    "http://localhost:9200".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

// -- 5 minutes. The whole Bible in one request is ~31k verses. Elasticsearch needs a moment.
fn default_request_timeout_secs() -> u64 {
    300
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            username: None,
            password: None,
            api_key: None,
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// 📬 `{"acknowledged": true}` - the cluster's thumbs up for create and delete.
#[derive(Debug, Deserialize)]
struct AcknowledgedResponse {
    #[serde(default)]
    acknowledged: bool,
}

/// 📡 The HTTP Store Client. One `reqwest::Client`, reused for every call,
/// because building a new one per request is buying a car to go to the grocery store.
#[derive(Debug)]
pub(crate) struct ElasticsearchStore {
    client: reqwest::Client,
    config: ElasticsearchConfig,
}

impl ElasticsearchStore {
    /// 🚀 Build the client and ping the cluster root.
    ///
    /// If the cluster isn't there we want to know NOW, not after decoding 31,102 verses.
    pub(crate) async fn new(config: ElasticsearchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("💀 The HTTP client refused to be born. We tried to build a reqwest::Client and the universe said 'no'. Probably a TLS stack with opinions.")?;

        let the_store = Self { client, config };

        // -- 📡 "Hello? Is this thing on?" - a developer, gesturing at a cluster.
        let response = the_store
            .authorize(the_store.client.get(&the_store.config.url))
            .send()
            .await
            .context(format!(
                "💀 Could not reach Elasticsearch at '{}'. We knocked. Nobody answered.",
                the_store.config.url
            ))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "💀 Elasticsearch at '{}' answered the ping with '{}'. Body: '{}'. Check the URL and the credentials.",
                the_store.config.url,
                status,
                body
            );
        }
        debug!("✅ Elasticsearch at {} is awake and taking calls", the_store.config.url);

        Ok(the_store)
    }

    // -- trim_end_matches('/') - one slash of difference, infinite suffering of difference
    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.config.url.trim_end_matches('/'), path)
    }

    /// 🔒 Auth priority: API key wins over basic auth. This is not a democracy.
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        if let Some(ref api_key) = self.config.api_key {
            request.header("Authorization", format!("ApiKey {}", api_key))
        } else if let Some(ref username) = self.config.username {
            request.basic_auth(username, self.config.password.as_ref())
        } else {
            request
        }
    }

    /// 📬 Read an `acknowledged` body, or bail with whatever the cluster actually said.
    async fn read_acknowledged(response: reqwest::Response, what: &str) -> Result<bool> {
        let status = response.status();
        let body = response.text().await.context(format!(
            "💀 The cluster answered the {} request and then the body evaporated mid-read.",
            what
        ))?;
        if !status.is_success() {
            anyhow::bail!(
                "💀 The {} request came back '{}'. The body of the response read: '{}'.",
                what,
                status,
                body
            );
        }
        let the_ack: AcknowledgedResponse = serde_json::from_str(&body).context(format!(
            "💀 The {} response was a success, but not JSON we recognize: '{}'",
            what, body
        ))?;
        Ok(the_ack.acknowledged)
    }
}

#[async_trait]
impl DocumentStore for ElasticsearchStore {
    async fn index_exists(&self, index: &str) -> Result<bool> {
        let response = self
            .authorize(self.client.head(self.url_for(index)))
            .send()
            .await
            .context(format!(
                "💀 Reached out to check if index '{}' exists. Got ghosted by the network.",
                index
            ))?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => anyhow::bail!(
                "💀 Asked whether index '{}' exists and got '{}'. That is neither yes nor no.",
                index,
                status
            ),
        }
    }

    async fn delete_index(&self, index: &str) -> Result<bool> {
        let response = self
            .authorize(self.client.delete(self.url_for(index)))
            .send()
            .await
            .context(format!(
                "💀 The delete request for index '{}' never made it to the cluster.",
                index
            ))?;
        if response.status() == StatusCode::NOT_FOUND {
            // -- can't delete what was never there; from our side, the index is gone either way
            debug!("🗑️ Index '{}' was already absent, nothing to delete", index);
            return Ok(false);
        }
        Self::read_acknowledged(response, "delete index").await
    }

    async fn create_index(&self, index: &str, body: &Value) -> Result<bool> {
        let the_body = serde_json::to_string(body)
            .context("💀 The index mapping refused to serialize. The schema has trust issues.")?;
        let response = self
            .authorize(self.client.put(self.url_for(index)))
            .header("Content-Type", "application/json")
            .body(the_body)
            .send()
            .await
            .context(format!(
                "💀 The create request for index '{}' never made it to the cluster.",
                index
            ))?;
        Self::read_acknowledged(response, "create index").await
    }

    /// 📡 Fires a `_bulk` POST with the given NDJSON body. No retries. Good luck.
    async fn bulk(&self, payload: String) -> Result<BulkResponse> {
        debug!("📡 Sending {} bytes to /_bulk", payload.len());
        let response = self
            .authorize(self.client.post(self.url_for("_bulk")))
            // ⚠️ application/x-ndjson, not application/json. Elasticsearch WILL notice.
            .header("Content-Type", "application/x-ndjson")
            .body(payload)
            .send()
            .await
            .context("💀 The bulk request never made it to Elasticsearch. We launched the payload into the network and the network was not vibing with it. Check connectivity and timeouts.")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("💀 The bulk response body evaporated mid-read.")?;
        if !status.is_success() {
            anyhow::bail!(
                "💀 The bulk request arrived, but Elasticsearch said '{}'. The body of the response read: '{}'.",
                status,
                body
            );
        }
        trace!("🚀 Bulk request landed, documents have left the building");

        serde_json::from_str(&body).context(
            "💀 The bulk request succeeded, but the response is not the JSON we were promised.",
        )
    }
}
