// file: src/config.rs
// description: application configuration management with yaml support
// reference: https://docs.rs/config

use crate::error::{IngestError, Result};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Behavior configuration loaded from a YAML file plus environment
/// overrides. Connection parameters for the vector store come from the
/// `VECTOR_DB_HOST`/`VECTOR_DB_PORT` environment variables, read once at
/// startup. Unknown keys in the file are ignored so that plugin-specific
/// sections can ride along.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "default_request_delay")]
    pub request_delay: f64,

    #[serde(default)]
    pub html: HtmlConfig,

    #[serde(default)]
    pub qdrant: QdrantConfig,

    #[serde(skip)]
    pub vector_db: VectorDbConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HtmlConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QdrantConfig {
    #[serde(default = "default_model_name")]
    pub model_name: String,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Optional HTTP embeddings endpoint. Without it a deterministic
    /// fallback embedding is used, which keeps offline runs working.
    #[serde(default)]
    pub embedding_url: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_embedding_dim")]
    pub embedding_dim: usize,

    /// Model input limit in characters; longer texts are truncated
    /// before embedding.
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
}

#[derive(Debug, Clone)]
pub struct VectorDbConfig {
    pub host: String,
    pub port: u16,
}

fn default_request_delay() -> f64 {
    1.0
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (compatible; VectorIngest/0.1)".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_model_name() -> String {
    "sentence-transformers/all-MiniLM-L6-v2".to_string()
}

fn default_batch_size() -> usize {
    32
}

fn default_embedding_dim() -> usize {
    384
}

fn default_max_input_chars() -> usize {
    8192
}

impl Default for HtmlConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout: default_timeout(),
        }
    }
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            model_name: default_model_name(),
            batch_size: default_batch_size(),
            embedding_url: None,
            api_key: None,
            embedding_dim: default_embedding_dim(),
            max_input_chars: default_max_input_chars(),
        }
    }
}

impl Default for VectorDbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6333,
        }
    }
}

impl VectorDbConfig {
    fn from_env() -> Result<Self> {
        let host = env::var("VECTOR_DB_HOST").unwrap_or_else(|_| "localhost".to_string());
        let port = match env::var("VECTOR_DB_PORT") {
            Ok(raw) => raw.parse::<u16>().map_err(|_| {
                IngestError::Config(format!("VECTOR_DB_PORT is not a valid port: {}", raw))
            })?,
            Err(_) => 6333,
        };
        Ok(Self { host, port })
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder =
                builder.add_source(config::File::from(Path::new("config/default.yaml")));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("INGEST")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| IngestError::Config(e.to_string()))?;

        let mut config: Config = settings
            .try_deserialize()
            .map_err(|e| IngestError::Config(e.to_string()))?;

        config.vector_db = VectorDbConfig::from_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            request_delay: default_request_delay(),
            html: HtmlConfig::default(),
            qdrant: QdrantConfig::default(),
            vector_db: VectorDbConfig::default(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.request_delay < 0.0 {
            return Err(IngestError::Config(
                "request_delay must not be negative".to_string(),
            ));
        }

        if self.html.timeout == 0 {
            return Err(IngestError::Config(
                "html.timeout must be greater than 0".to_string(),
            ));
        }

        crate::utils::Validator::validate_batch_size(self.qdrant.batch_size)
            .map_err(|e| IngestError::Config(e.to_string()))?;

        if self.qdrant.embedding_dim == 0 {
            return Err(IngestError::Config(
                "qdrant.embedding_dim must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default_config();
        assert_eq!(config.request_delay, 1.0);
        assert_eq!(config.html.timeout, 30);
        assert_eq!(config.qdrant.batch_size, 32);
        assert_eq!(config.vector_db.host, "localhost");
        assert_eq!(config.vector_db.port, 6333);
    }

    #[test]
    fn test_load_yaml_with_unknown_keys() {
        let mut file = NamedTempFile::with_suffix(".yaml").unwrap();
        writeln!(
            file,
            "request_delay: 0.5\nhtml:\n  user_agent: test-agent\n  timeout: 10\nfuture_plugin:\n  anything: goes"
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.request_delay, 0.5);
        assert_eq!(config.html.user_agent, "test-agent");
        assert_eq!(config.html.timeout, 10);
        // qdrant section absent, defaults apply
        assert_eq!(config.qdrant.batch_size, 32);
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let mut file = NamedTempFile::with_suffix(".yaml").unwrap();
        writeln!(file, "html:\n  timeout: 0").unwrap();

        let result = Config::load(Some(file.path()));
        assert!(matches!(result, Err(IngestError::Config(_))));
    }
}
