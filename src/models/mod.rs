// file: src/models/mod.rs
// description: module declarations for core data models

pub mod document;
pub mod source;

pub use document::{document_id, ParsedDocument};
pub use source::{parse_sources_file, Source};
