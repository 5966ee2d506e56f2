// file: src/crawler/mod.rs
// description: breadth-first frontier crawler bounded by scope and depth

pub mod scope;

pub use scope::{normalize_url, ScopePrefix};

use crate::error::IngestError;
use crate::parser::SourceParser;
use crate::utils::Validator;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// A unit of crawl work: the URL to fetch, its depth (0 = seed), and the
/// scope it must remain under.
#[derive(Debug, Clone)]
pub struct CrawlTask {
    pub url: Url,
    pub depth: usize,
    pub scope: ScopePrefix,
}

/// A successfully fetched page, kept so the orchestrator can parse it
/// without refetching.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: Url,
    pub depth: usize,
    pub body: String,
}

/// Everything one crawl invocation produced: pages in fetch order plus
/// per-locator failures.
#[derive(Debug, Default)]
pub struct CrawlOutcome {
    pub pages: Vec<FetchedPage>,
    pub failures: Vec<(String, IngestError)>,
}

/// Recursive link-following engine. The frontier queue and visited set
/// live only for the duration of one `crawl` call; nothing is shared
/// across runs.
///
/// Traversal is breadth-first by depth level: the FIFO frontier holds all
/// depth-d tasks ahead of any depth-(d+1) task, and links are enqueued in
/// discovery order. Links are deduplicated against every URL already
/// visited or queued, keyed by the normalized form from [`scope`].
pub struct Crawler<'a> {
    parser: &'a dyn SourceParser,
    max_depth: usize,
    request_delay: Duration,
    cancelled: Arc<AtomicBool>,
}

impl<'a> Crawler<'a> {
    pub fn new(parser: &'a dyn SourceParser, max_depth: usize, request_delay: Duration) -> Self {
        Self {
            parser,
            max_depth,
            request_delay,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shares a cancellation flag with the caller; once set, no further
    /// fetches start but everything already fetched is kept.
    pub fn with_cancellation(mut self, cancelled: Arc<AtomicBool>) -> Self {
        self.cancelled = cancelled;
        self
    }

    pub async fn crawl(&self, seeds: &[String]) -> CrawlOutcome {
        let mut outcome = CrawlOutcome::default();
        let mut queue: VecDeque<CrawlTask> = VecDeque::new();
        let mut seen: HashSet<String> = HashSet::new();

        for seed in seeds {
            // Only http(s) seeds are crawlable.
            if let Err(e) = Validator::validate_url(seed) {
                outcome.failures.push((seed.clone(), e));
                continue;
            }
            let url = match Url::parse(seed) {
                Ok(url) => url,
                Err(e) => {
                    outcome.failures.push((
                        seed.clone(),
                        IngestError::Validation(format!("Invalid seed URL: {}", e)),
                    ));
                    continue;
                }
            };
            if seen.insert(normalize_url(&url)) {
                let scope = ScopePrefix::from_seed(&url);
                queue.push_back(CrawlTask {
                    url,
                    depth: 0,
                    scope,
                });
            }
        }

        let mut fetched_any = false;
        while let Some(task) = queue.pop_front() {
            if self.cancelled.load(Ordering::Relaxed) {
                warn!("Crawl cancelled with {} task(s) still queued", queue.len() + 1);
                break;
            }

            // Politeness delay between consecutive fetches only; skipped
            // duplicates never enter the queue, so they never pay it.
            if fetched_any && !self.request_delay.is_zero() {
                tokio::time::sleep(self.request_delay).await;
            }
            fetched_any = true;

            info!("Crawling (depth {}): {}", task.depth, task.url);
            let body = match self.parser.fetch(task.url.as_str()).await {
                Ok(body) => body,
                Err(e) => {
                    // Failed URLs drop out without aborting siblings; their
                    // outbound links are never discovered.
                    outcome.failures.push((task.url.to_string(), e));
                    continue;
                }
            };

            if task.depth < self.max_depth {
                self.enqueue_links(&task, &body, &mut queue, &mut seen);
            }

            outcome.pages.push(FetchedPage {
                url: task.url,
                depth: task.depth,
                body,
            });
        }

        info!(
            "Crawl complete: {} page(s) fetched, {} failure(s)",
            outcome.pages.len(),
            outcome.failures.len()
        );
        outcome
    }

    fn enqueue_links(
        &self,
        task: &CrawlTask,
        body: &str,
        queue: &mut VecDeque<CrawlTask>,
        seen: &mut HashSet<String>,
    ) {
        for link in self.parser.extract_links(body, task.url.as_str()) {
            let Ok(url) = Url::parse(&link) else {
                continue;
            };
            if !task.scope.in_scope(&url) {
                debug!("Out of scope, skipping: {}", url);
                continue;
            }
            if seen.insert(normalize_url(&url)) {
                queue.push_back(CrawlTask {
                    url,
                    depth: task.depth + 1,
                    scope: task.scope.clone(),
                });
            }
        }
    }
}
