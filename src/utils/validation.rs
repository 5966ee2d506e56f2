// file: src/utils/validation.rs
// description: data validation utilities and helpers
// reference: input validation patterns

use crate::error::{IngestError, Result};
use std::fs;
use std::path::Path;

pub struct Validator;

impl Validator {
    pub fn validate_file_path(path: &Path) -> Result<()> {
        let canonical = fs::canonicalize(path).map_err(|e| {
            IngestError::Validation(format!(
                "Cannot canonicalize path {}: {}",
                path.display(),
                e
            ))
        })?;

        if !canonical.is_file() {
            return Err(IngestError::Validation(format!(
                "Path is not a file: {}",
                canonical.display()
            )));
        }

        Ok(())
    }

    pub fn validate_content_not_empty(content: &str) -> Result<()> {
        if content.trim().is_empty() {
            return Err(IngestError::Validation("Content is empty".to_string()));
        }
        Ok(())
    }

    pub fn validate_url(url: &str) -> Result<()> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(IngestError::Validation(format!(
                "Invalid URL format: {}",
                url
            )));
        }
        Ok(())
    }

    pub fn validate_batch_size(size: usize) -> Result<()> {
        if size == 0 {
            return Err(IngestError::Validation(
                "Batch size must be greater than 0".to_string(),
            ));
        }

        if size > 10000 {
            return Err(IngestError::Validation(
                "Batch size too large (max 10000)".to_string(),
            ));
        }

        Ok(())
    }

    /// Truncates on a char boundary so multi-byte input never panics.
    pub fn truncate_text(text: &str, max_chars: usize) -> String {
        if text.chars().count() <= max_chars {
            text.to_string()
        } else {
            let truncated: String = text.chars().take(max_chars).collect();
            format!("{}...", truncated)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_validate_file_path() {
        let temp = TempDir::new().unwrap();
        let file_path = temp.path().join("sources.txt");
        fs::write(&file_path, "https://example.com").unwrap();

        assert!(Validator::validate_file_path(&file_path).is_ok());
        assert!(Validator::validate_file_path(Path::new("/nonexistent")).is_err());
    }

    #[test]
    fn test_validate_content_not_empty() {
        assert!(Validator::validate_content_not_empty("content").is_ok());
        assert!(Validator::validate_content_not_empty("").is_err());
        assert!(Validator::validate_content_not_empty("   ").is_err());
    }

    #[test]
    fn test_validate_url() {
        assert!(Validator::validate_url("https://example.com").is_ok());
        assert!(Validator::validate_url("http://example.com").is_ok());
        assert!(Validator::validate_url("example.com").is_err());
        assert!(Validator::validate_url("ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_batch_size() {
        assert!(Validator::validate_batch_size(100).is_ok());
        assert!(Validator::validate_batch_size(0).is_err());
        assert!(Validator::validate_batch_size(10001).is_err());
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(Validator::truncate_text("short", 10), "short");
        assert_eq!(
            Validator::truncate_text("this is a very long text", 10),
            "this is a ..."
        );
    }

    #[test]
    fn test_truncate_text_multibyte() {
        assert_eq!(Validator::truncate_text("héllo wörld", 5), "héllo...");
    }
}
