// file: src/pipeline/summary.rs
// description: per-run result aggregation and operator-facing reporting

use crate::error::{FailureKind, IngestError};
use crate::utils::Validator;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// One captured per-locator failure, with enough context for an operator
/// to re-run only what failed.
#[derive(Debug, Clone)]
pub struct FailureRecord {
    pub locator: String,
    pub kind: FailureKind,
    pub message: String,
}

/// Aggregated outcome of one ingestion run.
#[derive(Debug, Clone, Default)]
pub struct IngestSummary {
    pub attempted: usize,
    pub stored: usize,
    pub failures: Vec<FailureRecord>,
    pub duration_secs: f64,
}

impl IngestSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_failure(&mut self, locator: &str, error: &IngestError) {
        self.failures.push(FailureRecord {
            locator: locator.to_string(),
            kind: error.kind(),
            message: error.to_string(),
        });
    }

    pub fn failures_by_kind(&self) -> BTreeMap<FailureKind, usize> {
        let mut counts = BTreeMap::new();
        for failure in &self.failures {
            *counts.entry(failure.kind).or_insert(0) += 1;
        }
        counts
    }

    pub fn success_rate(&self) -> f64 {
        if self.attempted == 0 {
            return 0.0;
        }
        (self.stored as f64 / self.attempted as f64) * 100.0
    }

    pub fn log(&self) {
        info!("=== Ingestion Summary ===");
        info!("Duration: {:.2}s", self.duration_secs);
        info!("Locators attempted: {}", self.attempted);
        info!("Documents stored: {}", self.stored);
        info!("Failures: {}", self.failures.len());
        for (kind, count) in self.failures_by_kind() {
            info!("  {}: {}", kind, count);
        }
        for failure in &self.failures {
            warn!(
                "  [{}] {}: {}",
                failure.kind,
                failure.locator,
                Validator::truncate_text(&failure.message, 200)
            );
        }
        info!("Success rate: {:.2}%", self.success_rate());
        info!("=========================");
    }
}
