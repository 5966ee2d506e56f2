// file: src/parser/mod.rs
// description: source parser trait and type-keyed registry
// reference: explicit registration instead of dynamic plugin loading

pub mod html;
pub mod text;

pub use html::HtmlParser;
pub use text::TextParser;

use crate::config::Config;
use crate::error::Result;
use crate::models::ParsedDocument;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Capability exposed by every content-type parser.
#[async_trait]
pub trait SourceParser: Send + Sync {
    /// Type string this parser registers under (e.g. "html").
    fn source_type(&self) -> &str;

    /// Retrieves raw content from a locator. Network and filesystem
    /// failures surface as `IngestError::Fetch`, which callers treat as a
    /// recoverable per-locator failure.
    async fn fetch(&self, locator: &str) -> Result<String>;

    /// Converts raw content into a normalized document. Malformed input
    /// degrades to best-effort text extraction; `IngestError::Parse` is
    /// reserved for content that yields no text at all.
    fn parse(&self, content: &str, locator: &str) -> Result<ParsedDocument>;

    /// Absolute outbound links discovered in the content. Parsers that
    /// cannot be crawled return none, which is the default.
    fn extract_links(&self, _content: &str, _base: &str) -> Vec<String> {
        Vec::new()
    }
}

/// Maps a declared source type string to its parser.
///
/// Registration order is the collision rule: built-ins first in a fixed
/// order, then explicit `register` calls in call order. Last registered
/// wins and every replacement is logged.
#[derive(Default)]
pub struct ParserRegistry {
    parsers: HashMap<String, Arc<dyn SourceParser>>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults(config: &Config) -> Result<Self> {
        let mut registry = Self::new();
        registry.register(Arc::new(HtmlParser::new(&config.html)?));
        registry.register(Arc::new(TextParser::new()));
        info!(
            "Parser registry initialized: {:?}",
            registry.supported_types()
        );
        Ok(registry)
    }

    pub fn register(&mut self, parser: Arc<dyn SourceParser>) {
        let source_type = parser.source_type().to_string();
        if self.parsers.insert(source_type.clone(), parser).is_some() {
            warn!(
                "Parser for source type '{}' replaced by a later registration",
                source_type
            );
        } else {
            info!("Registered parser: {}", source_type);
        }
    }

    pub fn get(&self, source_type: &str) -> Option<Arc<dyn SourceParser>> {
        self.parsers.get(source_type).cloned()
    }

    pub fn supported_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.parsers.keys().cloned().collect();
        types.sort();
        types
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IngestError;
    use std::collections::BTreeMap;

    struct StubParser {
        type_name: &'static str,
        marker: &'static str,
    }

    #[async_trait]
    impl SourceParser for StubParser {
        fn source_type(&self) -> &str {
            self.type_name
        }

        async fn fetch(&self, locator: &str) -> Result<String> {
            Err(IngestError::Fetch {
                locator: locator.to_string(),
                message: "stub".to_string(),
            })
        }

        fn parse(&self, content: &str, locator: &str) -> Result<ParsedDocument> {
            Ok(ParsedDocument::new(
                locator.to_string(),
                self.marker.to_string(),
                content.to_string(),
                BTreeMap::new(),
                self.type_name.to_string(),
            ))
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = ParserRegistry::new();
        registry.register(Arc::new(StubParser {
            type_name: "stub",
            marker: "first",
        }));

        assert!(registry.get("stub").is_some());
        assert!(registry.get("missing").is_none());
        assert_eq!(registry.supported_types(), vec!["stub"]);
    }

    #[test]
    fn test_last_registration_wins() {
        let mut registry = ParserRegistry::new();
        registry.register(Arc::new(StubParser {
            type_name: "stub",
            marker: "first",
        }));
        registry.register(Arc::new(StubParser {
            type_name: "stub",
            marker: "second",
        }));

        let parser = registry.get("stub").unwrap();
        let doc = parser.parse("body", "loc").unwrap();
        assert_eq!(doc.title, "second");
        assert_eq!(registry.supported_types().len(), 1);
    }

    #[test]
    fn test_default_links_empty() {
        let parser = StubParser {
            type_name: "stub",
            marker: "first",
        };
        assert!(parser.extract_links("<a href=x>", "base").is_empty());
    }
}
