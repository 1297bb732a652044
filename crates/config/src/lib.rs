//! Configuration loading, validation, and management for docpair.
//!
//! Loads configuration from `~/.docpair/config.toml` with environment
//! variable overrides (a `.env` file is honored). Validates all settings at
//! startup.

use docpair_core::document::{DocumentRef, DocumentRegistry};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variables checked for the API key, highest priority first.
pub const API_KEY_VARS: [&str; 3] = ["DOCPAIR_API_KEY", "GOOGLE_API_KEY", "GEMINI_API_KEY"];

/// The root configuration structure.
///
/// Maps directly to `~/.docpair/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the hosted document service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Generative model used to answer questions
    #[serde(default = "default_model")]
    pub model: String,

    /// Override the service base URL (proxies, tests)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// HTTP timeout per request, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Heading shown above the transcript
    #[serde(default = "default_title")]
    pub title: String,

    /// Directory holding `<identifier>.<extension>` files
    #[serde(default = "default_documents_dir")]
    pub documents_dir: PathBuf,

    /// File extension of the documents
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Documents offered for selection, in display order
    #[serde(default)]
    pub documents: Vec<DocumentConfig>,

    /// Upload retry policy
    #[serde(default)]
    pub upload: UploadConfig,
}

fn default_model() -> String {
    "gemini-2.0-flash".into()
}
fn default_request_timeout() -> u64 {
    120
}
fn default_title() -> String {
    "57582R2F2 vs 646039YM3 OS Analyzer".into()
}
fn default_documents_dir() -> PathBuf {
    PathBuf::from("./LEGAL-DATA")
}
fn default_extension() -> String {
    "pdf".into()
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("api_url", &self.api_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("title", &self.title)
            .field("documents_dir", &self.documents_dir)
            .field("extension", &self.extension)
            .field("documents", &self.documents)
            .field("upload", &self.upload)
            .finish()
    }
}

/// One selectable document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentConfig {
    /// Bond identifier (CUSIP)
    pub identifier: String,

    #[serde(default)]
    pub label: String,

    /// Explicit file path; defaults to `<documents_dir>/<identifier>.<extension>`.
    /// Relative paths resolve against `documents_dir`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl DocumentConfig {
    fn new(identifier: &str, label: &str) -> Self {
        Self {
            identifier: identifier.into(),
            label: label.into(),
            file: None,
        }
    }
}

/// The documents registered when the config lists none.
fn default_documents() -> Vec<DocumentConfig> {
    vec![
        DocumentConfig::new("57582R2F2", "57582R2F2 Official Statement"),
        DocumentConfig::new("646039YM3", "646039YM3 Official Statement"),
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Total upload attempts per document before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed delay between attempts, in seconds
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,
}

fn default_max_attempts() -> u32 {
    5
}
fn default_retry_delay() -> u64 {
    2
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay_secs: default_retry_delay(),
        }
    }
}

impl UploadConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.docpair/config.toml).
    ///
    /// Also checks environment variables:
    /// - `DOCPAIR_API_KEY`, `GOOGLE_API_KEY`, `GEMINI_API_KEY` (first found)
    /// - `DOCPAIR_MODEL`
    /// - `DOCPAIR_DOCUMENTS_DIR`
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(None)
    }

    /// Load from an explicit path (or the default one) and apply the environment.
    pub fn load_with(path: Option<&Path>) -> Result<Self, ConfigError> {
        let default_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(path.unwrap_or(default_path.as_path()))?;
        config.apply_env(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides using the given variable lookup.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_none() {
            self.api_key = API_KEY_VARS
                .iter()
                .find_map(|name| var(name).filter(|v| !v.trim().is_empty()));
        }

        if let Some(model) = var("DOCPAIR_MODEL") {
            self.model = model;
        }

        if let Some(dir) = var("DOCPAIR_DOCUMENTS_DIR") {
            self.documents_dir = PathBuf::from(dir);
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".docpair")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upload.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "upload.max_attempts must be at least 1".into(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "request_timeout_secs must be > 0".into(),
            ));
        }

        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationError("model must not be empty".into()));
        }

        let mut seen = HashSet::new();
        for doc in &self.documents {
            if doc.identifier.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "document identifier must not be empty".into(),
                ));
            }
            if !seen.insert(doc.identifier.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate document identifier: {}",
                    doc.identifier
                )));
            }
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// The API key, or the fatal startup error when none is configured.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingCredentials(API_KEY_VARS.join(", ")))
    }

    /// Build the document registry from the configured (or default) documents.
    pub fn registry(&self) -> DocumentRegistry {
        let configured = if self.documents.is_empty() {
            default_documents()
        } else {
            self.documents.clone()
        };

        DocumentRegistry::new(configured.into_iter().map(|doc| {
            let path = match doc.file {
                Some(file) => self.documents_dir.join(file),
                None => self
                    .documents_dir
                    .join(format!("{}.{}", doc.identifier, self.extension)),
            };
            DocumentRef::new(doc.identifier, doc.label, path)
        }))
    }

    /// Generate a default config TOML string (for `init` command).
    pub fn default_toml() -> String {
        let config = Self {
            documents: default_documents(),
            ..Self::default()
        };
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            api_url: None,
            request_timeout_secs: default_request_timeout(),
            title: default_title(),
            documents_dir: default_documents_dir(),
            extension: default_extension(),
            documents: vec![],
            upload: UploadConfig::default(),
        }
    }
}

/// Load a `.env` file from the current directory or its nearest ancestor.
///
/// Returns the path that was loaded, if any.
pub fn load_env_file() -> Option<PathBuf> {
    let cwd = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            tracing::warn!(error = %e, "Could not determine current directory for .env lookup");
            return None;
        }
    };

    for dir in cwd.ancestors() {
        let candidate = dir.join(".env");
        if candidate.exists() {
            return match dotenvy::from_path(&candidate) {
                Ok(()) => {
                    tracing::debug!(path = %candidate.display(), "Loaded environment from .env");
                    Some(candidate)
                }
                Err(e) => {
                    tracing::warn!(
                        path = %candidate.display(),
                        error = %e,
                        "Failed to load .env file"
                    );
                    None
                }
            };
        }
    }

    None
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("No API key configured; set one of {0} or api_key in config.toml")]
    MissingCredentials(String),
}
