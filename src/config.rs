use anyhow::{Result, anyhow};
use serde::Deserialize;
use std::env;
use tracing::{info, warn};

use crate::quiz_service::MAX_QUESTION_COUNT;

// Import logging macros
use crate::{log_system_event, log_validation};

pub const DEFAULT_MODEL: &str = "Meta-Llama-3.1-8B-Instruct";

pub const DEFAULT_ENDPOINTS: [&str; 2] = [
    "https://api.sambanova.ai/v1/chat/completions",
    "https://cloud.sambanova.ai/api/v1/chat/completions",
];

pub const DEFAULT_QUESTION_COUNT: usize = 5;

/// Complete application configuration loaded from environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub generation: GenerationConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

/// Completion service configuration. Credentials and endpoints are tried in the order given.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GenerationConfig {
    pub credentials: Vec<String>,
    pub endpoints: Vec<String>,
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    pub question_count: usize,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

/// Logging system configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_enabled: bool,
    pub console_enabled: bool,
    pub log_directory: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            credentials: Vec::new(),
            endpoints: DEFAULT_ENDPOINTS.iter().map(|e| e.to_string()).collect(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            top_p: 0.95,
            max_tokens: 2048,
            question_count: DEFAULT_QUESTION_COUNT,
        }
    }
}

/// Lookup function for configuration values, `env::var` in production
type VarSource<'a> = &'a dyn Fn(&str) -> Option<String>;

fn process_env(key: &str) -> Option<String> {
    env::var(key).ok()
}

impl Config {
    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> Result<Self> {
        Self::from_source(&process_env)
    }

    pub(crate) fn from_source(source: VarSource<'_>) -> Result<Self> {
        log_system_event!(config, "Loading application configuration from environment variables");

        let config = Config {
            generation: GenerationConfig::from_source(source)?,
            server: ServerConfig::from_source(source)?,
            logging: LoggingConfig::from_source(source),
        };

        log_system_event!(config, "Configuration loaded successfully");
        config.log_configuration_summary();

        Ok(config)
    }

    /// Log a summary of loaded configuration (without sensitive data)
    fn log_configuration_summary(&self) {
        info!(
            credentials_masked = ?self.generation.credentials.iter().map(|c| mask_sensitive_data(c)).collect::<Vec<_>>(),
            endpoints = ?self.generation.endpoints,
            model = %self.generation.model,
            server_address = %format!("{}:{}", self.server.host, self.server.port),
            log_level = %self.logging.level,
            "Configuration summary"
        );
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.generation.validate()?;

        if self.server.port == 0 {
            return Err(anyhow!("Server port must be greater than 0"));
        }

        if !["trace", "debug", "info", "warn", "error"]
            .iter()
            .any(|level| self.logging.level.to_lowercase().starts_with(level))
        {
            warn!("Unrecognized log level '{}', filter may fall back to defaults", self.logging.level);
        }

        log_validation!(success, "configuration", "Configuration validation completed successfully");
        Ok(())
    }
}

impl GenerationConfig {
    fn from_source(source: VarSource<'_>) -> Result<Self> {
        let defaults = GenerationConfig::default();

        let credentials = source("NOMI_API_KEYS")
            .map(|raw| parse_list(&raw))
            .unwrap_or_default();

        let endpoints = source("NOMI_ENDPOINTS")
            .map(|raw| parse_list(&raw))
            .filter(|list| !list.is_empty())
            .unwrap_or(defaults.endpoints);

        let model = source("NOMI_MODEL")
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(defaults.model);

        Ok(GenerationConfig {
            credentials,
            endpoints,
            model,
            temperature: parse_or(source, "NOMI_TEMPERATURE", defaults.temperature)?,
            top_p: parse_or(source, "NOMI_TOP_P", defaults.top_p)?,
            max_tokens: parse_or(source, "NOMI_MAX_TOKENS", defaults.max_tokens)?,
            question_count: parse_or(source, "NOMI_QUESTION_COUNT", defaults.question_count)?,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.credentials.is_empty() {
            return Err(anyhow!("NOMI_API_KEYS must list at least one API credential"));
        }
        if self.endpoints.is_empty() {
            return Err(anyhow!("NOMI_ENDPOINTS must list at least one endpoint"));
        }
        if let Some(bad) = self
            .endpoints
            .iter()
            .find(|e| !e.starts_with("http://") && !e.starts_with("https://"))
        {
            return Err(anyhow!("Endpoint '{}' must be an http(s) URL", bad));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(anyhow!("Temperature {} is outside 0.0-2.0", self.temperature));
        }
        if !(self.top_p > 0.0 && self.top_p <= 1.0) {
            return Err(anyhow!("top_p {} is outside (0.0, 1.0]", self.top_p));
        }
        if self.max_tokens == 0 {
            return Err(anyhow!("max_tokens must be greater than 0"));
        }
        if !(1..=MAX_QUESTION_COUNT).contains(&self.question_count) {
            return Err(anyhow!(
                "NOMI_QUESTION_COUNT {} is outside 1-{}",
                self.question_count,
                MAX_QUESTION_COUNT
            ));
        }
        Ok(())
    }

    /// Number of (credential, endpoint) pairs the fallback loop will try
    pub fn attempt_count(&self) -> usize {
        self.credentials.len() * self.endpoints.len()
    }
}

impl ServerConfig {
    fn from_source(source: VarSource<'_>) -> Result<Self> {
        let port_str = source("PORT").unwrap_or_else(|| "3000".to_string());

        let port = port_str.parse::<u16>().map_err(|_| {
            anyhow!("Invalid PORT value: '{}'. Must be a number between 1-65535", port_str)
        })?;

        let host = source("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        Ok(ServerConfig { port, host })
    }
}

impl LoggingConfig {
    /// Logging settings alone, so tracing can be up before the rest of the configuration loads
    pub fn from_env() -> Self {
        Self::from_source(&process_env)
    }

    fn from_source(source: VarSource<'_>) -> Self {
        let level = source("RUST_LOG").unwrap_or_else(|| "info,nomi_quiz=debug".to_string());

        let file_enabled = source("LOG_FILE_ENABLED")
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(true);

        let console_enabled = source("LOG_CONSOLE_ENABLED")
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(true);

        let log_directory = source("LOG_DIRECTORY").unwrap_or_else(|| "logs".to_string());

        LoggingConfig {
            level,
            file_enabled,
            console_enabled,
            log_directory,
        }
    }
}

/// Split a comma-separated list, dropping blanks and keeping order
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_or<T: std::str::FromStr>(source: VarSource<'_>, key: &str, default: T) -> Result<T> {
    match source(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| anyhow!("Invalid {} value: '{}'", key, raw)),
        None => Ok(default),
    }
}

/// Mask sensitive data in configuration for safe logging
pub fn mask_sensitive_data(data: &str) -> String {
    let chars: Vec<char> = data.chars().collect();
    if chars.len() <= 8 {
        "*".repeat(chars.len())
    } else {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}***{}", head, tail)
    }
}
