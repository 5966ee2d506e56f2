// file: src/models/source.rs
// description: seed source locator with its declared type

use serde::{Deserialize, Serialize};

/// A single seed locator (URL or file path) plus its declared source type.
/// Immutable once read from input; consumed exactly once by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub locator: String,
    pub source_type: String,
}

impl Source {
    pub fn new(locator: impl Into<String>, source_type: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
            source_type: source_type.into(),
        }
    }
}

/// Parses the contents of a sources file: one locator per line, blank
/// lines and surrounding whitespace ignored.
pub fn parse_sources_file(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
