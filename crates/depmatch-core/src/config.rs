//! depmatch Configuration Management
//!
//! Handles configuration from environment variables and config files,
//! with defaults that work against the public UDPipe service.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Annotation backend configuration
    pub annotator: AnnotatorConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        Self::from_toml_str(&content).map_err(|message| ConfigError::ParseError { path, message })
    }

    /// Parse TOML content
    pub fn from_toml_str(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        self.apply_env(|key| std::env::var(key).ok())?;
        Ok(self)
    }

    /// Apply overrides from a variable lookup
    fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(backend) = lookup("DEPMATCH_ANNOTATOR") {
            self.annotator.backend = backend.parse()?;
        }
        if let Some(url) = lookup("UDPIPE_URL") {
            self.annotator.udpipe_url = url;
        }
        if let Some(model) = lookup("UDPIPE_MODEL") {
            self.annotator.udpipe_model = model;
        }
        if let Some(timeout) = lookup("UDPIPE_TIMEOUT_SECS") {
            self.annotator.timeout_secs =
                timeout.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "UDPIPE_TIMEOUT_SECS".to_string(),
                    value: timeout,
                })?;
        }
        if let Some(path) = lookup("DEPMATCH_CONLLU") {
            self.annotator.conllu_path = Some(PathBuf::from(path));
        }

        // Logging
        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(json) = lookup("LOG_JSON") {
            self.logging.json_format = matches!(json.to_lowercase().as_str(), "1" | "true" | "yes");
        }

        Ok(())
    }
}

/// Annotation backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotatorConfig {
    /// Which backend annotates input text
    pub backend: AnnotatorBackend,

    /// UDPipe REST service base URL
    pub udpipe_url: String,

    /// UDPipe model name
    pub udpipe_model: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Pre-parsed CoNLL-U corpus for the offline backend
    pub conllu_path: Option<PathBuf>,
}

impl AnnotatorConfig {
    /// Check that the selected backend has what it needs
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend == AnnotatorBackend::Conllu && self.conllu_path.is_none() {
            return Err(ConfigError::MissingRequired(
                "annotator.conllu_path (or DEPMATCH_CONLLU) for the conllu backend".to_string(),
            ));
        }
        if self.backend == AnnotatorBackend::Udpipe && self.udpipe_url.trim().is_empty() {
            return Err(ConfigError::MissingRequired("annotator.udpipe_url".to_string()));
        }
        Ok(())
    }
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            backend: AnnotatorBackend::Udpipe,
            udpipe_url: "https://lindat.mff.cuni.cz/services/udpipe/api".to_string(),
            udpipe_model: "spanish-ancora".to_string(),
            timeout_secs: 30,
            conllu_path: None,
        }
    }
}

/// Supported annotation backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotatorBackend {
    Udpipe,
    Conllu,
}

impl std::str::FromStr for AnnotatorBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "udpipe" => Ok(Self::Udpipe),
            "conllu" => Ok(Self::Conllu),
            _ => Err(ConfigError::InvalidValue {
                key: "DEPMATCH_ANNOTATOR".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.annotator.backend, AnnotatorBackend::Udpipe);
        assert_eq!(config.annotator.udpipe_model, "spanish-ancora");
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!(
            "udpipe".parse::<AnnotatorBackend>().unwrap(),
            AnnotatorBackend::Udpipe
        );
        assert_eq!(
            "CoNLLU".parse::<AnnotatorBackend>().unwrap(),
            AnnotatorBackend::Conllu
        );
        assert!("corenlp".parse::<AnnotatorBackend>().is_err());
    }

    #[test]
    fn test_partial_toml() {
        let config = AppConfig::from_toml_str(
            r#"
            [annotator]
            backend = "conllu"
            conllu_path = "fixtures/biodata.conllu"

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.annotator.backend, AnnotatorBackend::Conllu);
        assert_eq!(
            config.annotator.conllu_path,
            Some(PathBuf::from("fixtures/biodata.conllu"))
        );
        // Unset keys keep their defaults
        assert_eq!(config.annotator.timeout_secs, 30);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("UDPIPE_MODEL", "spanish-gsd"),
            ("UDPIPE_TIMEOUT_SECS", "5"),
            ("LOG_JSON", "true"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config
            .apply_env(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.annotator.udpipe_model, "spanish-gsd");
        assert_eq!(config.annotator.timeout_secs, 5);
        assert!(config.logging.json_format);
    }

    #[test]
    fn test_env_invalid_timeout() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env(|key| (key == "UDPIPE_TIMEOUT_SECS").then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_validate_conllu_backend() {
        let mut annotator = AnnotatorConfig {
            backend: AnnotatorBackend::Conllu,
            ..Default::default()
        };
        assert!(matches!(
            annotator.validate(),
            Err(ConfigError::MissingRequired(_))
        ));

        annotator.conllu_path = Some(PathBuf::from("fixtures/biodata.conllu"));
        assert!(annotator.validate().is_ok());
        assert!(AnnotatorConfig::default().validate().is_ok());
    }
}
