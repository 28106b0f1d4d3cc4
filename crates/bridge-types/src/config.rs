//! Configuration loading for search-bridge.
//!
//! Layered: built-in defaults -> optional config file -> SEARCH_BRIDGE_*
//! environment variables. Read once by the host application and treated
//! as immutable for the process lifetime.

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::PathBuf;

use crate::error::ConfigError;

/// Main search-bridge settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Name of the engine container (index) documents live in
    #[serde(default = "default_index_name")]
    pub index_name: String,

    /// Index fieldname every document/content field must use
    #[serde(default = "default_document_field")]
    pub document_field: String,

    /// Analyzer applied to analyzed string fields that declare none
    #[serde(default = "default_analyzer")]
    pub default_analyzer: String,

    /// Default boolean operator between query-string terms
    #[serde(default = "default_operator")]
    pub default_operator: String,

    /// Scope searches to registered entity types when the caller gives
    /// no explicit scope
    #[serde(default = "default_true")]
    pub limit_to_registered_models: bool,

    /// Attach a spelling-suggestion block to every compiled query
    #[serde(default)]
    pub include_spelling: bool,

    /// Log-and-degrade instead of propagating transport/response failures
    #[serde(default = "default_true")]
    pub silently_fail: bool,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Engine settings body used when (re)creating the container
    #[serde(default = "default_container_settings")]
    pub container_settings: Value,
}

fn default_index_name() -> String {
    "search-bridge".to_string()
}

fn default_document_field() -> String {
    "text".to_string()
}

fn default_analyzer() -> String {
    "snowball".to_string()
}

fn default_operator() -> String {
    "AND".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Container settings shipped by default: custom ngram / edge-ngram
/// analyzers backing the `Ngram` and `EdgeNgram` value kinds.
fn default_container_settings() -> Value {
    json!({
        "settings": {
            "analysis": {
                "analyzer": {
                    "ngram_analyzer": {
                        "type": "custom",
                        "tokenizer": "lowercase",
                        "filter": ["bridge_ngram"]
                    },
                    "edgengram_analyzer": {
                        "type": "custom",
                        "tokenizer": "lowercase",
                        "filter": ["bridge_edgengram"]
                    }
                },
                "filter": {
                    "bridge_ngram": {
                        "type": "nGram",
                        "min_gram": 3,
                        "max_gram": 15
                    },
                    "bridge_edgengram": {
                        "type": "edgeNGram",
                        "min_gram": 2,
                        "max_gram": 15
                    }
                }
            }
        }
    })
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            index_name: default_index_name(),
            document_field: default_document_field(),
            default_analyzer: default_analyzer(),
            default_operator: default_operator(),
            limit_to_registered_models: true,
            include_spelling: false,
            silently_fail: true,
            log_level: default_log_level(),
            container_settings: default_container_settings(),
        }
    }
}

impl SearchConfig {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/search-bridge/config.toml)
    /// 3. Caller-specified config file (optional)
    /// 4. Environment variables (SEARCH_BRIDGE_*)
    pub fn load(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let config_dir = ProjectDirs::from("", "", "search-bridge")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("SEARCH_BRIDGE")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| ConfigError::Load(e.to_string()))?;

        let settings: Self = config
            .try_deserialize()
            .map_err(|e| ConfigError::Load(e.to_string()))?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.document_field.is_empty() {
            return Err(ConfigError::Invalid("document_field must be set".into()));
        }
        if self.index_name.is_empty() {
            return Err(ConfigError::Invalid("index_name must be set".into()));
        }
        match self.default_operator.as_str() {
            "AND" | "OR" => Ok(()),
            other => Err(ConfigError::Invalid(format!(
                "default_operator must be AND or OR, got {}",
                other
            ))),
        }
    }
}
