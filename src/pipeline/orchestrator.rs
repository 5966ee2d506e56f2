// file: src/pipeline/orchestrator.rs
// description: coordinates crawl, parse, embed, and store for one ingestion run

use crate::config::Config;
use crate::crawler::Crawler;
use crate::embedder::EmbedderRegistry;
use crate::error::{IngestError, Result};
use crate::models::{ParsedDocument, Source};
use crate::parser::{ParserRegistry, SourceParser};
use crate::pipeline::summary::IngestSummary;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Per-run knobs resolved from the CLI.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub store_type: String,
    pub collection: String,
    pub recursive: bool,
    pub max_depth: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            store_type: "qdrant".to_string(),
            collection: "documents".to_string(),
            recursive: false,
            max_depth: 3,
        }
    }
}

/// Drives sources through crawl, parse, embed, and store, isolating
/// per-locator failures and aggregating results. Owns every Source,
/// CrawlTask, and ParsedDocument for the duration of one run; only the
/// registries outlive it.
pub struct PipelineOrchestrator {
    config: Config,
    parsers: ParserRegistry,
    embedders: EmbedderRegistry,
    cancelled: Arc<AtomicBool>,
}

impl PipelineOrchestrator {
    pub fn new(config: Config) -> Result<Self> {
        let parsers = ParserRegistry::with_defaults(&config)?;
        let embedders = EmbedderRegistry::with_defaults(&config)?;
        Ok(Self::with_registries(config, parsers, embedders))
    }

    /// Assembles an orchestrator around pre-built registries, the hook
    /// for callers that register additional parser or store plugins.
    pub fn with_registries(
        config: Config,
        parsers: ParserRegistry,
        embedders: EmbedderRegistry,
    ) -> Self {
        Self {
            config,
            parsers,
            embedders,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag observed between fetches; setting it stops new work while the
    /// already accumulated batch still gets flushed to storage.
    pub fn cancellation_flag(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    pub async fn run(&self, sources: &[Source], options: &RunOptions) -> Result<IngestSummary> {
        let start = Instant::now();

        // Every declared type must resolve before any work starts.
        for source in sources {
            if self.parsers.get(&source.source_type).is_none() {
                return Err(IngestError::Config(format!(
                    "Unsupported source type: {}. Available types: {:?}",
                    source.source_type,
                    self.parsers.supported_types()
                )));
            }
        }

        let store = self.embedders.get(&options.store_type).ok_or_else(|| {
            IngestError::Config(format!(
                "Unknown store type: {}. Available: {:?}",
                options.store_type,
                self.embedders.supported_stores()
            ))
        })?;

        match store.ping().await {
            Ok(true) => info!("Vector store '{}' reachable", options.store_type),
            Ok(false) => {
                return Err(IngestError::Connection(format!(
                    "Vector store '{}' failed its health check",
                    options.store_type
                )))
            }
            Err(e) => return Err(e),
        }

        let delay = Duration::from_secs_f64(self.config.request_delay.max(0.0));
        let mut summary = IngestSummary::new();
        let mut batch: Vec<ParsedDocument> = Vec::new();

        if options.recursive {
            for (source_type, seeds) in seeds_by_type(sources) {
                let Some(parser) = self.parsers.get(&source_type) else {
                    continue;
                };
                let crawler = Crawler::new(parser.as_ref(), options.max_depth, delay)
                    .with_cancellation(self.cancelled.clone());
                let outcome = crawler.crawl(&seeds).await;

                summary.attempted += outcome.pages.len() + outcome.failures.len();
                for (locator, error) in &outcome.failures {
                    summary.record_failure(locator, error);
                }
                for page in &outcome.pages {
                    self.parse_into_batch(
                        parser.as_ref(),
                        &page.body,
                        page.url.as_str(),
                        &mut batch,
                        &mut summary,
                    );
                }
            }
        } else {
            for (index, source) in sources.iter().enumerate() {
                let Some(parser) = self.parsers.get(&source.source_type) else {
                    continue;
                };
                if self.cancelled.load(Ordering::Relaxed) {
                    warn!(
                        "Run cancelled; flushing {} accumulated document(s)",
                        batch.len()
                    );
                    break;
                }
                if index > 0 && !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }

                summary.attempted += 1;
                info!("Ingesting: {}", source.locator);
                match parser.fetch(&source.locator).await {
                    Ok(content) => self.parse_into_batch(
                        parser.as_ref(),
                        &content,
                        &source.locator,
                        &mut batch,
                        &mut summary,
                    ),
                    Err(e) => summary.record_failure(&source.locator, &e),
                }
            }
        }

        if batch.is_empty() {
            warn!("No documents were successfully parsed");
        } else {
            info!(
                "Storing {} document(s) into {}/{}",
                batch.len(),
                options.store_type,
                options.collection
            );
            match store.store(&batch, &options.collection).await {
                Ok(outcome) => {
                    summary.stored += outcome.written;
                    for (locator, error) in &outcome.failures {
                        summary.record_failure(locator, error);
                    }
                }
                Err(e) => {
                    if let IngestError::StoreWrite { written, .. } = &e {
                        summary.stored += *written;
                    }
                    summary.record_failure(&options.collection, &e);
                }
            }
        }

        summary.duration_secs = start.elapsed().as_secs_f64();
        Ok(summary)
    }

    fn parse_into_batch(
        &self,
        parser: &dyn SourceParser,
        content: &str,
        locator: &str,
        batch: &mut Vec<ParsedDocument>,
        summary: &mut IngestSummary,
    ) {
        match parser.parse(content, locator) {
            Ok(document) => {
                // Documents without content never reach embedding.
                if !document.has_content() {
                    let error = IngestError::Parse {
                        locator: locator.to_string(),
                        message: "document has no content".to_string(),
                    };
                    summary.record_failure(locator, &error);
                    return;
                }
                batch.push(document);
            }
            Err(e) => summary.record_failure(locator, &e),
        }
    }
}

/// Groups seed locators by declared source type, preserving the order in
/// which each type and locator first appears.
fn seeds_by_type(sources: &[Source]) -> Vec<(String, Vec<String>)> {
    let mut groups: Vec<(String, Vec<String>)> = Vec::new();
    for source in sources {
        match groups.iter_mut().find(|(t, _)| *t == source.source_type) {
            Some((_, seeds)) => seeds.push(source.locator.clone()),
            None => groups.push((source.source_type.clone(), vec![source.locator.clone()])),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::{StoreOutcome, VectorStore};
    use crate::error::FailureKind;
    use crate::models::document_id;
    use async_trait::async_trait;
    use std::collections::{BTreeMap, HashMap};
    use std::sync::Mutex;
    use uuid::Uuid;

    /// Parser stub: locators containing "dead" fail to fetch, locators
    /// containing "empty" parse to an empty document.
    struct StubParser;

    #[async_trait]
    impl SourceParser for StubParser {
        fn source_type(&self) -> &str {
            "stub"
        }

        async fn fetch(&self, locator: &str) -> Result<String> {
            if locator.contains("dead") {
                Err(IngestError::Fetch {
                    locator: locator.to_string(),
                    message: "connection refused".to_string(),
                })
            } else {
                Ok(format!("content of {}", locator))
            }
        }

        fn parse(&self, content: &str, locator: &str) -> Result<ParsedDocument> {
            let body = if locator.contains("empty") {
                String::new()
            } else {
                content.to_string()
            };
            Ok(ParsedDocument::new(
                locator.to_string(),
                "title".to_string(),
                body,
                BTreeMap::new(),
                "stub".to_string(),
            ))
        }
    }

    /// Store stub with upsert-by-ID semantics, mirroring the idempotence
    /// contract of the real backend. Documents whose source contains
    /// "noembed" fail to embed and come back in the outcome.
    #[derive(Default)]
    struct MemoryStore {
        points: Mutex<HashMap<Uuid, ParsedDocument>>,
        reachable: bool,
    }

    impl MemoryStore {
        fn reachable() -> Self {
            Self {
                points: Mutex::new(HashMap::new()),
                reachable: true,
            }
        }

        fn len(&self) -> usize {
            self.points.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl VectorStore for MemoryStore {
        fn store_type(&self) -> &str {
            "memory"
        }

        async fn ping(&self) -> Result<bool> {
            Ok(self.reachable)
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(vec![text.len() as f32; 4])
        }

        async fn store(
            &self,
            documents: &[ParsedDocument],
            _collection: &str,
        ) -> Result<StoreOutcome> {
            let mut outcome = StoreOutcome::default();
            let mut points = self.points.lock().unwrap();
            for document in documents {
                if document.source.contains("noembed") {
                    outcome.failures.push((
                        document.source.clone(),
                        IngestError::Embedding("input rejected".to_string()),
                    ));
                    continue;
                }
                points.insert(document.document_id(), document.clone());
                outcome.written += 1;
            }
            Ok(outcome)
        }
    }

    fn orchestrator(store: Arc<MemoryStore>) -> PipelineOrchestrator {
        let mut parsers = ParserRegistry::new();
        parsers.register(Arc::new(StubParser));
        let mut embedders = EmbedderRegistry::new();
        embedders.register(store);

        let mut config = Config::default_config();
        config.request_delay = 0.0;
        PipelineOrchestrator::with_registries(config, parsers, embedders)
    }

    fn sources(locators: &[&str]) -> Vec<Source> {
        locators
            .iter()
            .map(|locator| Source::new(*locator, "stub"))
            .collect()
    }

    fn options() -> RunOptions {
        RunOptions {
            store_type: "memory".to_string(),
            collection: "documents".to_string(),
            recursive: false,
            max_depth: 3,
        }
    }

    #[tokio::test]
    async fn test_run_isolates_fetch_failures() {
        let store = Arc::new(MemoryStore::reachable());
        let orchestrator = orchestrator(store.clone());

        let sources = sources(&[
            "https://example.com/a",
            "https://example.com/dead",
            "https://example.com/b",
        ]);
        let summary = orchestrator.run(&sources, &options()).await.unwrap();

        assert_eq!(summary.attempted, 3);
        assert_eq!(summary.stored, 2);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].kind, FailureKind::Fetch);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_run_drops_empty_documents() {
        let store = Arc::new(MemoryStore::reachable());
        let orchestrator = orchestrator(store.clone());

        let sources = sources(&["https://example.com/empty"]);
        let summary = orchestrator.run(&sources, &options()).await.unwrap();

        assert_eq!(summary.stored, 0);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].kind, FailureKind::Parse);
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn test_run_surfaces_embedding_failures() {
        let store = Arc::new(MemoryStore::reachable());
        let orchestrator = orchestrator(store.clone());

        let sources = sources(&["https://example.com/a", "https://example.com/noembed"]);
        let summary = orchestrator.run(&sources, &options()).await.unwrap();

        assert_eq!(summary.attempted, 2);
        assert_eq!(summary.stored, 1);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].kind, FailureKind::Embedding);
        assert_eq!(summary.failures[0].locator, "https://example.com/noembed");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_reingestion_is_idempotent() {
        let store = Arc::new(MemoryStore::reachable());
        let orchestrator = orchestrator(store.clone());

        let sources = sources(&["https://example.com/a"]);
        orchestrator.run(&sources, &options()).await.unwrap();
        orchestrator.run(&sources, &options()).await.unwrap();

        assert_eq!(store.len(), 1);
        assert!(store
            .points
            .lock()
            .unwrap()
            .contains_key(&document_id("https://example.com/a")));
    }

    #[tokio::test]
    async fn test_unknown_source_type_is_fatal() {
        let store = Arc::new(MemoryStore::reachable());
        let orchestrator = orchestrator(store);

        let sources = vec![Source::new("https://example.com/a", "pdf")];
        let result = orchestrator.run(&sources, &options()).await;

        assert!(matches!(result, Err(IngestError::Config(_))));
    }

    #[tokio::test]
    async fn test_unreachable_store_is_fatal() {
        let store = Arc::new(MemoryStore::default());
        let orchestrator = orchestrator(store);

        let result = orchestrator
            .run(&sources(&["https://example.com/a"]), &options())
            .await;

        assert!(matches!(result, Err(IngestError::Connection(_))));
    }

    #[tokio::test]
    async fn test_cancelled_run_flushes_accumulated_batch() {
        let store = Arc::new(MemoryStore::reachable());
        let orchestrator = orchestrator(store.clone());
        // Flag set before the second locator is reached.
        orchestrator
            .cancellation_flag()
            .store(true, Ordering::Relaxed);

        let sources = sources(&["https://example.com/a", "https://example.com/b"]);
        let summary = orchestrator.run(&sources, &options()).await.unwrap();

        assert_eq!(summary.attempted, 0);
        assert_eq!(store.len(), 0);
    }
}
