// file: src/embedder/embeddings.rs
// description: HTTP embedding client with deterministic offline fallback
// reference: OpenAI-compatible /v1/embeddings request shape

use crate::config::QdrantConfig;
use crate::error::{IngestError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Serialize)]
struct EmbeddingRequest {
    input: Vec<String>,
    model: String,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Text-to-vector client. Talks to an OpenAI-style embeddings endpoint
/// when one is configured; otherwise produces a deterministic hash-based
/// vector so runs stay reproducible without a model server.
pub struct EmbeddingClient {
    client: Client,
    endpoint: Option<String>,
    api_key: Option<String>,
    model: String,
    dimension: usize,
    max_input_chars: usize,
}

impl EmbeddingClient {
    pub fn new(config: &QdrantConfig) -> Self {
        Self {
            client: Client::new(),
            endpoint: config.embedding_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model_name.clone(),
            dimension: config.embedding_dim,
            max_input_chars: config.max_input_chars,
        }
    }

    /// Vector length, fixed per configuration. All vectors written to one
    /// collection share this dimension.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn max_input_chars(&self) -> usize {
        self.max_input_chars
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.chars().count() > self.max_input_chars {
            return Err(IngestError::Embedding(format!(
                "input of {} chars exceeds model limit of {}",
                text.chars().count(),
                self.max_input_chars
            )));
        }

        let Some(endpoint) = &self.endpoint else {
            return Ok(Self::fallback_embedding(text, self.dimension));
        };

        let request = EmbeddingRequest {
            input: vec![text.to_string()],
            model: self.model.clone(),
        };

        debug!("Requesting embedding for {} chars", text.len());

        let mut builder = self.client.post(endpoint).json(&request);
        if let Some(api_key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = builder.send().await.map_err(|e| {
            IngestError::Embedding(format!("Failed to send embedding request: {}", e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(IngestError::Embedding(format!(
                "Embedding request failed with status {}: {}",
                status, error_text
            )));
        }

        let payload: EmbeddingResponse = response.json().await.map_err(|e| {
            IngestError::Embedding(format!("Failed to parse embedding response: {}", e))
        })?;

        match payload.data.into_iter().next() {
            Some(data) if data.embedding.len() == self.dimension => Ok(data.embedding),
            Some(data) => {
                warn!(
                    "Endpoint returned dimension {}, expected {}; using fallback",
                    data.embedding.len(),
                    self.dimension
                );
                Ok(Self::fallback_embedding(text, self.dimension))
            }
            None => Err(IngestError::Embedding(
                "No embedding data in response".to_string(),
            )),
        }
    }

    /// Deterministic embedding derived from a rolling hash of the text.
    pub fn fallback_embedding(text: &str, dim: usize) -> Vec<f32> {
        let hash = text
            .bytes()
            .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        (0..dim)
            .map(|i| (hash.wrapping_add(i as u64) % 1000) as f32 / 1000.0)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn client_with(config: QdrantConfig) -> EmbeddingClient {
        EmbeddingClient::new(&config)
    }

    #[test]
    fn test_fallback_embedding_shape() {
        let embedding = EmbeddingClient::fallback_embedding("test text", 384);
        assert_eq!(embedding.len(), 384);
        assert!(embedding.iter().all(|&x| (0.0..1.0).contains(&x)));
    }

    #[test]
    fn test_fallback_embedding_deterministic() {
        let emb1 = EmbeddingClient::fallback_embedding("same text", 128);
        let emb2 = EmbeddingClient::fallback_embedding("same text", 128);
        assert_eq!(emb1, emb2);

        let other = EmbeddingClient::fallback_embedding("other text", 128);
        assert_ne!(emb1, other);
    }

    #[tokio::test]
    async fn test_embed_without_endpoint_uses_fallback() {
        let client = client_with(QdrantConfig::default());
        let embedding = client.embed("some document text").await.unwrap();
        assert_eq!(embedding.len(), client.dimension());
        assert_eq!(
            embedding,
            EmbeddingClient::fallback_embedding("some document text", client.dimension())
        );
    }

    #[tokio::test]
    async fn test_embed_rejects_oversized_input() {
        let config = QdrantConfig {
            max_input_chars: 8,
            ..QdrantConfig::default()
        };
        let client = client_with(config);
        let result = client.embed("this is far too long").await;
        assert!(matches!(result, Err(IngestError::Embedding(_))));
    }

    #[tokio::test]
    async fn test_embed_via_endpoint() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/embeddings");
            then.status(200)
                .json_body(serde_json::json!({ "data": [ { "embedding": [0.25, 0.5] } ] }));
        });

        let config = QdrantConfig {
            embedding_url: Some(server.url("/v1/embeddings")),
            embedding_dim: 2,
            ..QdrantConfig::default()
        };
        let client = client_with(config);
        let embedding = client.embed("hello").await.unwrap();
        assert_eq!(embedding, vec![0.25, 0.5]);
    }

    #[tokio::test]
    async fn test_embed_endpoint_dimension_mismatch_falls_back() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/embeddings");
            then.status(200)
                .json_body(serde_json::json!({ "data": [ { "embedding": [0.1, 0.2, 0.3] } ] }));
        });

        let config = QdrantConfig {
            embedding_url: Some(server.url("/v1/embeddings")),
            embedding_dim: 2,
            ..QdrantConfig::default()
        };
        let client = client_with(config);
        let embedding = client.embed("hello").await.unwrap();
        assert_eq!(embedding.len(), 2);
    }
}
