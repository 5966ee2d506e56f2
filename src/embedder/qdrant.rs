// file: src/embedder/qdrant.rs
// description: Qdrant vector store backend over the REST API
// reference: https://api.qdrant.tech

use super::embeddings::EmbeddingClient;
use super::{StoreOutcome, VectorStore};
use crate::config::Config;
use crate::error::{IngestError, Result};
use crate::models::ParsedDocument;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

/// Storage backend that embeds documents and upserts them into a Qdrant
/// collection. Point IDs are the deterministic document UUIDs, so
/// re-ingesting the same source overwrites instead of duplicating.
pub struct QdrantStore {
    client: Client,
    base_url: String,
    embeddings: EmbeddingClient,
    batch_size: usize,
}

impl QdrantStore {
    pub fn new(config: &Config) -> Result<Self> {
        let base_url = format!(
            "http://{}:{}",
            config.vector_db.host, config.vector_db.port
        );
        Self::with_base_url(config, base_url)
    }

    /// Builds a store against an explicit endpoint, bypassing the
    /// host/port environment configuration.
    pub fn with_base_url(config: &Config, base_url: String) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            embeddings: EmbeddingClient::new(&config.qdrant),
            batch_size: config.qdrant.batch_size,
        })
    }

    async fn ensure_collection(&self, collection: &str) -> Result<()> {
        let url = format!("{}/collections/{}", self.base_url, collection);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| IngestError::Connection(format!("Qdrant unreachable: {}", e)))?;

        if response.status().is_success() {
            return Ok(());
        }

        if response.status() != reqwest::StatusCode::NOT_FOUND {
            return Err(IngestError::Connection(format!(
                "Unexpected status {} while checking collection '{}'",
                response.status(),
                collection
            )));
        }

        info!(
            "Creating collection '{}' (dimensions: {})",
            collection,
            self.embeddings.dimension()
        );

        let body = json!({
            "vectors": {
                "size": self.embeddings.dimension(),
                "distance": "Cosine",
            }
        });

        let response = self
            .client
            .put(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| IngestError::Connection(format!("Qdrant unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(IngestError::Connection(format!(
                "Failed to create collection '{}': status {}",
                collection,
                response.status()
            )));
        }

        Ok(())
    }

    /// Builds the upsert point for one document: deterministic UUID id,
    /// embedding vector, full document fields as payload.
    fn build_point(&self, document: &ParsedDocument, vector: Vec<f32>) -> Result<Value> {
        let payload = serde_json::to_value(document).map_err(|e| IngestError::StoreWrite {
            written: 0,
            message: format!("Failed to serialize document payload: {}", e),
        })?;

        Ok(json!({
            "id": document.document_id().to_string(),
            "vector": vector,
            "payload": payload,
        }))
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    fn store_type(&self) -> &str {
        "qdrant"
    }

    async fn ping(&self) -> Result<bool> {
        let url = format!("{}/collections", self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(e) => Err(IngestError::Connection(format!(
                "Qdrant health check failed: {}",
                e
            ))),
        }
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embeddings.embed(text).await
    }

    async fn store(&self, documents: &[ParsedDocument], collection: &str) -> Result<StoreOutcome> {
        let mut outcome = StoreOutcome::default();
        if documents.is_empty() {
            return Ok(outcome);
        }

        self.ensure_collection(collection).await?;

        let max_chars = self.embeddings.max_input_chars();
        let mut points = Vec::with_capacity(documents.len());
        for document in documents {
            // Truncate ahead of the model limit instead of failing the doc.
            let text: String = document.content.chars().take(max_chars).collect();
            if text.len() < document.content.len() {
                debug!(
                    "Truncated {} to {} chars for embedding",
                    document.source, max_chars
                );
            }
            match self.embeddings.embed(&text).await {
                Ok(vector) => points.push(self.build_point(document, vector)?),
                Err(e) => {
                    warn!("Embedding failed for {}: {}", document.source, e);
                    outcome.failures.push((document.source.clone(), e));
                }
            }
        }

        let url = format!(
            "{}/collections/{}/points?wait=true",
            self.base_url, collection
        );

        for chunk in points.chunks(self.batch_size.max(1)) {
            let body = json!({ "points": chunk });
            let response = self.client.put(&url).json(&body).send().await.map_err(|e| {
                IngestError::StoreWrite {
                    written: outcome.written,
                    message: format!("Upsert request failed: {}", e),
                }
            })?;

            if !response.status().is_success() {
                let status = response.status();
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                return Err(IngestError::StoreWrite {
                    written: outcome.written,
                    message: format!("Upsert rejected with status {}: {}", status, error_text),
                });
            }

            outcome.written += chunk.len();
        }

        info!(
            "Stored {}/{} document(s) in '{}'",
            outcome.written,
            documents.len(),
            collection
        );
        Ok(outcome)
    }
}
