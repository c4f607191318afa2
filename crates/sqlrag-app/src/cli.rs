//! CLI argument definitions for the sqlrag binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use sqlrag_core::SqlRagConfig;

/// sqlrag: chat with a SQLite music store, answering data questions with generated SQL.
#[derive(Parser, Debug)]
#[command(name = "sqlrag", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Path to the SQLite database.
    #[arg(short = 'd', long = "db")]
    pub db: Option<PathBuf>,

    /// Model name sent to the chat-completions endpoint.
    #[arg(short = 'm', long = "model")]
    pub model: Option<String>,

    /// Base URL of an OpenAI-compatible endpoint.
    #[arg(long = "base-url")]
    pub base_url: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Interactive chat (default).
    Chat,
    /// Answer a single question and exit.
    Ask {
        question: String,
    },
    /// Run a SQL statement (a fenced block or a bare SELECT/WITH/INSERT/...).
    Sql {
        statement: String,
    },
    /// Print the database schema.
    Schema {
        /// Emit a JSON array instead of text chunks.
        #[arg(long)]
        json: bool,
    },
    /// Build the retrieval knowledge base from the database schema.
    BuildKb {
        /// Output path; defaults to `retrieval.knowledge_base_path`.
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
    },
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > SQLRAG_CONFIG env var > ~/.sqlrag/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("SQLRAG_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Chat)
    }

    /// Layer flag and environment overrides on top of the loaded file.
    pub fn apply_overrides(&self, mut config: SqlRagConfig) -> SqlRagConfig {
        let env = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());

        if let Some(db) = self
            .db
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned())
            .or_else(|| env("SQLRAG_DB"))
        {
            config.database.path = db;
        }
        if let Some(model) = self.model.clone().or_else(|| env("SQLRAG_MODEL")) {
            config.llm.model = model;
        }
        if let Some(url) = self.base_url.clone().or_else(|| env("SQLRAG_BASE_URL")) {
            config.llm.base_url = url;
        }
        if let Some(level) = self.log_level.clone() {
            config.general.log_level = level;
        }
        config
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".sqlrag").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".sqlrag").join("config.toml");
    }
    PathBuf::from("config.toml")
}
