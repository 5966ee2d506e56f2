// file: src/parser/text.rs
// description: plain-text file parser for local sources

use super::SourceParser;
use crate::error::{IngestError, Result};
use crate::models::ParsedDocument;
use crate::utils::Validator;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Parser for local plain-text files. The locator is a filesystem path;
/// the file stem becomes the title.
#[derive(Default)]
pub struct TextParser;

impl TextParser {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SourceParser for TextParser {
    fn source_type(&self) -> &str {
        "text"
    }

    async fn fetch(&self, locator: &str) -> Result<String> {
        tokio::fs::read_to_string(locator)
            .await
            .map_err(|e| IngestError::Fetch {
                locator: locator.to_string(),
                message: e.to_string(),
            })
    }

    fn parse(&self, content: &str, locator: &str) -> Result<ParsedDocument> {
        if Validator::validate_content_not_empty(content).is_err() {
            return Err(IngestError::Parse {
                locator: locator.to_string(),
                message: "file contains no text".to_string(),
            });
        }
        let trimmed = content.trim();

        let path = Path::new(locator);
        let title = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("")
            .to_string();

        let mut metadata = BTreeMap::new();
        metadata.insert("path".to_string(), Value::String(locator.to_string()));
        if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
            metadata.insert("extension".to_string(), Value::String(extension.to_string()));
        }

        Ok(ParsedDocument::new(
            locator.to_string(),
            title,
            trimmed.to_string(),
            metadata,
            self.source_type().to_string(),
        ))
    }
}
