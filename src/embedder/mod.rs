// file: src/embedder/mod.rs
// description: vector store trait and type-keyed registry

pub mod embeddings;
pub mod qdrant;

pub use embeddings::EmbeddingClient;
pub use qdrant::QdrantStore;

use crate::config::Config;
use crate::error::{IngestError, Result};
use crate::models::ParsedDocument;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Result of one store call: how many documents were written plus the
/// documents that could not be embedded, keyed by source locator.
#[derive(Debug, Default)]
pub struct StoreOutcome {
    pub written: usize,
    pub failures: Vec<(String, IngestError)>,
}

/// Capability exposed by every storage backend: embed text and persist
/// documents into a named collection.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Type string this backend registers under (e.g. "qdrant").
    fn store_type(&self) -> &str;

    /// Health check against the backing store. A run cannot start if the
    /// store is unreachable.
    async fn ping(&self) -> Result<bool>;

    /// Converts text into a fixed-length vector. Deterministic for
    /// identical input and model configuration; fails with
    /// `IngestError::Embedding` past the model's input limit.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embeds and upserts a batch of documents, chunked by the configured
    /// batch size. A document that fails to embed does not abort the batch;
    /// it comes back in the outcome's failures so callers can report it.
    /// A transport failure mid-batch carries the count already written
    /// inside `IngestError::StoreWrite`.
    async fn store(&self, documents: &[ParsedDocument], collection: &str)
        -> Result<StoreOutcome>;
}

/// Maps a declared store type string to its backend. Same registration
/// rule as the parser registry: deterministic order, last wins, every
/// replacement logged.
#[derive(Default)]
pub struct EmbedderRegistry {
    embedders: HashMap<String, Arc<dyn VectorStore>>,
}

impl EmbedderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults(config: &Config) -> Result<Self> {
        let mut registry = Self::new();
        registry.register(Arc::new(QdrantStore::new(config)?));
        info!(
            "Embedder registry initialized: {:?}",
            registry.supported_stores()
        );
        Ok(registry)
    }

    pub fn register(&mut self, embedder: Arc<dyn VectorStore>) {
        let store_type = embedder.store_type().to_string();
        if self.embedders.insert(store_type.clone(), embedder).is_some() {
            warn!(
                "Embedder for store type '{}' replaced by a later registration",
                store_type
            );
        } else {
            info!("Registered embedder: {}", store_type);
        }
    }

    pub fn get(&self, store_type: &str) -> Option<Arc<dyn VectorStore>> {
        self.embedders.get(store_type).cloned()
    }

    pub fn supported_stores(&self) -> Vec<String> {
        let mut stores: Vec<String> = self.embedders.keys().cloned().collect();
        stores.sort();
        stores
    }
}
