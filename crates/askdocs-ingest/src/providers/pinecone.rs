//! Pinecone serverless index client
//!
//! Talks to two endpoints: the control plane for index management and the
//! per-index data plane host for upserts. The host is resolved once and
//! cached for the life of the client.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::OnceCell;

use crate::config::PineconeConfig;
use crate::error::{Error, Result};

/// Vectors per upsert request
const UPSERT_BATCH: usize = 100;

/// One vector with its stored metadata
#[derive(Debug, Clone, Serialize)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Pinecone index client
pub struct PineconeIndex {
    client: Client,
    config: PineconeConfig,
    host: OnceCell<String>,
}

#[derive(Serialize)]
struct CreateIndexRequest<'a> {
    name: &'a str,
    dimension: usize,
    metric: &'a str,
    spec: IndexSpec<'a>,
}

#[derive(Serialize)]
struct IndexSpec<'a> {
    serverless: ServerlessSpec<'a>,
}

#[derive(Serialize)]
struct ServerlessSpec<'a> {
    cloud: &'a str,
    region: &'a str,
}

#[derive(Deserialize)]
struct IndexList {
    #[serde(default)]
    indexes: Vec<IndexSummary>,
}

#[derive(Deserialize)]
struct IndexSummary {
    name: String,
}

#[derive(Deserialize)]
struct IndexDescription {
    host: String,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [VectorRecord],
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

impl PineconeIndex {
    pub fn new(config: &PineconeConfig) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            config: config.clone(),
            host: OnceCell::new(),
        })
    }

    /// Create the configured index if it does not already exist
    pub async fn ensure_index(&self) -> Result<()> {
        let url = format!("{}/indexes", self.config.control_url);
        let response = self
            .client
            .get(&url)
            .header("Api-Key", &self.config.api_key)
            .send()
            .await
            .map_err(|e| Error::vector_db(format!("Index list failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::vector_db(format!(
                "Index list failed: HTTP {}",
                response.status()
            )));
        }

        let list: IndexList = response
            .json()
            .await
            .map_err(|e| Error::vector_db(format!("Failed to parse index list: {}", e)))?;

        if list.indexes.iter().any(|index| index.name == self.config.index) {
            tracing::info!("Index {} already exists", self.config.index);
            return Ok(());
        }

        tracing::info!(
            "Creating index {} (dimension {}, {}/{})",
            self.config.index,
            self.config.dimension,
            self.config.cloud,
            self.config.region
        );

        let request = CreateIndexRequest {
            name: &self.config.index,
            dimension: self.config.dimension,
            metric: "cosine",
            spec: IndexSpec {
                serverless: ServerlessSpec {
                    cloud: &self.config.cloud,
                    region: &self.config.region,
                },
            },
        };

        let response = self
            .client
            .post(&url)
            .header("Api-Key", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::vector_db(format!("Index create failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::vector_db(format!(
                "Index create failed ({}): {}",
                status, body
            )));
        }

        Ok(())
    }

    /// Upsert vectors under an optional namespace, batched per request
    pub async fn upsert(&self, namespace: Option<&str>, vectors: &[VectorRecord]) -> Result<usize> {
        if vectors.is_empty() {
            return Ok(0);
        }

        let host = self.host().await?;
        let url = format!("{}/vectors/upsert", host);
        let mut upserted = 0;

        for batch in vectors.chunks(UPSERT_BATCH) {
            let request = UpsertRequest {
                vectors: batch,
                namespace,
            };

            let response = self
                .client
                .post(&url)
                .header("Api-Key", &self.config.api_key)
                .json(&request)
                .send()
                .await
                .map_err(|e| Error::vector_db(format!("Upsert failed: {}", e)))?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(Error::vector_db(format!(
                    "Upsert failed ({}): {}",
                    status, body
                )));
            }

            upserted += batch.len();
        }

        tracing::info!(
            "Upserted {} vectors into {} (namespace: {})",
            upserted,
            self.config.index,
            namespace.unwrap_or("default")
        );
        Ok(upserted)
    }

    /// Resolve and cache the index data-plane host
    async fn host(&self) -> Result<&str> {
        let host = self
            .host
            .get_or_try_init(|| async {
                let url = format!("{}/indexes/{}", self.config.control_url, self.config.index);
                let response = self
                    .client
                    .get(&url)
                    .header("Api-Key", &self.config.api_key)
                    .send()
                    .await
                    .map_err(|e| Error::vector_db(format!("Index describe failed: {}", e)))?;

                if !response.status().is_success() {
                    return Err(Error::vector_db(format!(
                        "Index describe failed: HTTP {}",
                        response.status()
                    )));
                }

                let description: IndexDescription = response
                    .json()
                    .await
                    .map_err(|e| Error::vector_db(format!("Failed to parse index description: {}", e)))?;

                Ok(normalize_host(description.host))
            })
            .await?;

        Ok(host.as_str())
    }
}

// The control plane reports hosts without a scheme.
fn normalize_host(host: String) -> String {
    if host.starts_with("http://") || host.starts_with("https://") {
        host
    } else {
        format!("https://{}", host)
    }
}
