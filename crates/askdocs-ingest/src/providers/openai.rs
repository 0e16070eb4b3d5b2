//! OpenAI embeddings client

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::OpenAiConfig;
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;

/// Client for the OpenAI `/embeddings` endpoint
pub struct OpenAiEmbedder {
    client: Client,
    config: OpenAiConfig,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

impl OpenAiEmbedder {
    pub fn new(config: &OpenAiConfig) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    async fn request_embeddings(&self, input: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.config.base_url);
        let request = EmbeddingRequest {
            model: &self.config.model,
            input,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::embedding(format!("Embedding request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::embedding(format!(
                "Embedding request failed ({}): {}",
                status, body
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::embedding(format!("Failed to parse embedding response: {}", e)))?;

        // The API may return entries out of order; index restores it.
        let mut data = parsed.data;
        data.sort_by_key(|entry| entry.index);
        Ok(data.into_iter().map(|entry| entry.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let input = [text.to_string()];
        let mut embeddings = self.request_embeddings(&input).await?;
        embeddings
            .pop()
            .ok_or_else(|| Error::embedding("Embedding response was empty"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = self.request_embeddings(texts).await?;
        if embeddings.len() != texts.len() {
            return Err(Error::embedding(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                embeddings.len()
            )));
        }
        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/models", self.config.base_url);
        match self
            .client
            .get(&url)
            .bearer_auth(&self.config.api_key)
            .send()
            .await
        {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn test_embedder(base_url: String) -> OpenAiEmbedder {
        OpenAiEmbedder::new(&OpenAiConfig {
            api_key: "test-key".to_string(),
            base_url,
            model: "text-embedding-3-small".to_string(),
            dimensions: 3,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_batch_embeddings_are_reordered_by_index() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/embeddings")
                    .header("authorization", "Bearer test-key");
                then.status(200).json_body(json!({
                    "data": [
                        {"index": 1, "embedding": [0.2, 0.2, 0.2]},
                        {"index": 0, "embedding": [0.1, 0.1, 0.1]}
                    ]
                }));
            })
            .await;

        let embedder = test_embedder(server.url("/v1"));
        let texts = vec!["first".to_string(), "second".to_string()];
        let embeddings = embedder.embed_batch(&texts).await.unwrap();

        assert_eq!(embeddings.len(), 2);
        assert_eq!(embeddings[0], vec![0.1, 0.1, 0.1]);
        assert_eq!(embeddings[1], vec![0.2, 0.2, 0.2]);
    }

    #[tokio::test]
    async fn test_count_mismatch_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/embeddings");
                then.status(200).json_body(json!({
                    "data": [{"index": 0, "embedding": [0.1, 0.1, 0.1]}]
                }));
            })
            .await;

        let embedder = test_embedder(server.url("/v1"));
        let texts = vec!["first".to_string(), "second".to_string()];
        let error = embedder.embed_batch(&texts).await.unwrap_err();

        assert!(matches!(error, Error::Embedding(_)));
    }

    #[tokio::test]
    async fn test_api_errors_carry_the_response_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/embeddings");
                then.status(429).body("rate limit exceeded");
            })
            .await;

        let embedder = test_embedder(server.url("/v1"));
        let error = embedder.embed("text").await.unwrap_err();

        assert!(error.to_string().contains("429"));
        assert!(error.to_string().contains("rate limit exceeded"));
    }

    #[tokio::test]
    async fn test_empty_batch_short_circuits() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/embeddings");
                then.status(200).json_body(json!({"data": []}));
            })
            .await;

        let embedder = test_embedder(server.url("/v1"));
        let embeddings = embedder.embed_batch(&[]).await.unwrap();

        assert!(embeddings.is_empty());
        mock.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn test_health_check() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/models");
                then.status(200).json_body(json!({"data": []}));
            })
            .await;

        let embedder = test_embedder(server.url("/v1"));
        assert!(embedder.health_check().await.unwrap());
        assert_eq!(embedder.name(), "openai");
        assert_eq!(embedder.dimensions(), 3);
    }
}
