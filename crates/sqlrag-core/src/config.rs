use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, SqlRagError};

/// Top-level configuration for sqlrag.
///
/// Loaded from `~/.sqlrag/config.toml` by default. Every section is optional
/// and falls back to its defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SqlRagConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
}

impl SqlRagConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SqlRagConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| SqlRagError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Language model endpoint settings.
///
/// Any server speaking the OpenAI chat-completions protocol works (LM Studio,
/// Ollama, vLLM, hosted providers).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// When false no model is wired in and every model-backed step degrades.
    pub enabled: bool,
    /// Base URL up to and including the API version segment.
    pub base_url: String,
    /// Model identifier sent with each request.
    pub model: String,
    /// Inline API key. Prefer `api_key_env`.
    pub api_key: Option<String>,
    /// Environment variable consulted when `api_key` is unset.
    pub api_key_env: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Sampling temperature.
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "http://localhost:1234/v1".to_string(),
            model: "local-model".to_string(),
            api_key: None,
            api_key_env: "SQLRAG_API_KEY".to_string(),
            timeout_secs: 120,
            temperature: 0.0,
        }
    }
}

impl LlmConfig {
    /// Resolve the API key: inline value first, then the configured env var.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(ref key) = self.api_key {
            if !key.trim().is_empty() {
                return Some(key.clone());
            }
        }
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

/// Location of the Chinook sample database.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the SQLite file.
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "persistence/db/Chinook_Sqlite.db".to_string(),
        }
    }
}

/// Knowledge-base retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Knowledge-base text file. Built from the database schema when missing.
    pub knowledge_base_path: String,
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters shared between neighbouring chunks.
    pub chunk_overlap: usize,
    /// Passages returned per retrieval.
    pub top_k: usize,
    /// Embedding dimension.
    pub embedding_dim: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            knowledge_base_path: "rag/chinook_knowledge_base.txt".to_string(),
            chunk_size: 500,
            chunk_overlap: 50,
            top_k: 4,
            embedding_dim: 384,
        }
    }
}

/// Turn routing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// When false every turn goes straight to the responder.
    pub sql_enabled: bool,
    /// Prior dialogue entries from memory sent along with the answer prompt.
    pub history_messages: usize,
    /// Keywords added to the built-in classifier fallback list.
    pub extra_keywords: Vec<String>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            sql_enabled: true,
            history_messages: 6,
            extra_keywords: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = SqlRagConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert!(config.llm.enabled);
        assert_eq!(config.llm.base_url, "http://localhost:1234/v1");
        assert_eq!(config.database.path, "persistence/db/Chinook_Sqlite.db");
        assert_eq!(config.retrieval.chunk_size, 500);
        assert_eq!(config.retrieval.chunk_overlap, 50);
        assert_eq!(config.retrieval.top_k, 4);
        assert!(config.routing.sql_enabled);
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
[general]
log_level = "debug"

[llm]
enabled = false
base_url = "http://127.0.0.1:11434/v1"
model = "llama3"
timeout_secs = 30

[database]
path = "/data/chinook.db"

[retrieval]
top_k = 2

[routing]
sql_enabled = false
extra_keywords = ["playlist", "genre"]
"#;
        let file = create_temp_config(content);
        let config = SqlRagConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert!(!config.llm.enabled);
        assert_eq!(config.llm.model, "llama3");
        assert_eq!(config.llm.timeout_secs, 30);
        assert_eq!(config.database.path, "/data/chinook.db");
        assert_eq!(config.retrieval.top_k, 2);
        assert_eq!(config.retrieval.chunk_size, 500);
        assert!(!config.routing.sql_enabled);
        assert_eq!(config.routing.extra_keywords, vec!["playlist", "genre"]);
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let file = create_temp_config("[general]\nlog_level = \"warn\"\n");
        let config = SqlRagConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "warn");
        assert_eq!(config.llm.model, "local-model");
        assert_eq!(config.routing.history_messages, 6);
    }

    #[test]
    fn test_load_invalid_toml_is_error() {
        let file = create_temp_config("[llm\nmodel = ");
        let result = SqlRagConfig::load(file.path());
        assert!(matches!(result, Err(SqlRagError::Config(_))));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = SqlRagConfig::load_or_default(Path::new("/nonexistent/config.toml"));
        assert_eq!(config.general.log_level, "info");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = SqlRagConfig::default();
        config.llm.model = "gpt-4o-mini".to_string();
        config.save(&path).unwrap();

        let reloaded = SqlRagConfig::load(&path).unwrap();
        assert_eq!(reloaded.llm.model, "gpt-4o-mini");
        assert_eq!(reloaded.retrieval.top_k, config.retrieval.top_k);
    }

    #[test]
    fn test_resolve_api_key_prefers_inline() {
        let config = LlmConfig {
            api_key: Some("inline-key".to_string()),
            api_key_env: "SQLRAG_TEST_KEY_UNUSED".to_string(),
            ..LlmConfig::default()
        };
        assert_eq!(config.resolve_api_key().as_deref(), Some("inline-key"));
    }

    #[test]
    fn test_resolve_api_key_blank_inline_falls_through() {
        let config = LlmConfig {
            api_key: Some("   ".to_string()),
            api_key_env: "SQLRAG_TEST_KEY_DEFINITELY_NOT_SET".to_string(),
            ..LlmConfig::default()
        };
        assert_eq!(config.resolve_api_key(), None);
    }
}
