// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod config;
pub mod crawler;
pub mod embedder;
pub mod error;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod utils;

pub use config::{Config, HtmlConfig, QdrantConfig, VectorDbConfig};
pub use crawler::{CrawlOutcome, CrawlTask, Crawler, FetchedPage};
pub use crawler::scope::{normalize_url, ScopePrefix};
pub use embedder::{EmbedderRegistry, QdrantStore, StoreOutcome, VectorStore};
pub use error::{FailureKind, IngestError, Result};
pub use models::{document_id, ParsedDocument, Source};
pub use parser::{HtmlParser, ParserRegistry, SourceParser, TextParser};
pub use pipeline::{FailureRecord, IngestSummary, PipelineOrchestrator, RunOptions};
pub use utils::Validator;
