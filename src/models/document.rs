// file: src/models/document.rs
// description: normalized document model with deterministic identity
// reference: internal data structures

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Normalized unit of ingested content passed between pipeline stages.
///
/// Invariant: `content` must be non-empty for any document that proceeds
/// to embedding; the pipeline drops violating documents with a reported
/// error instead of storing them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedDocument {
    pub source: String,
    pub title: String,
    pub content: String,
    pub metadata: BTreeMap<String, Value>,
    pub timestamp: String,
    pub source_type: String,
}

impl ParsedDocument {
    pub fn new(
        source: String,
        title: String,
        content: String,
        metadata: BTreeMap<String, Value>,
        source_type: String,
    ) -> Self {
        Self {
            source,
            title,
            content,
            metadata,
            timestamp: Utc::now().to_rfc3339(),
            source_type,
        }
    }

    /// Stable identifier for upserts: re-ingesting the same locator
    /// overwrites the existing entry instead of duplicating it.
    pub fn document_id(&self) -> Uuid {
        document_id(&self.source)
    }

    pub fn has_content(&self) -> bool {
        !self.content.trim().is_empty()
    }
}

/// Derives a deterministic UUID from a source locator (first 16 bytes of
/// its SHA-256 digest).
pub fn document_id(source: &str) -> Uuid {
    let digest = Sha256::digest(source.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    Uuid::from_bytes(bytes)
}
