//! Configuration management for the Trellis system

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, TrellisError};

/// Main system configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub chatbot: ChatbotConfig,
    pub site: SiteConfig,
}

impl Config {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TrellisError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| TrellisError::Config(format!("Failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| TrellisError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| TrellisError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let result = self.validate_comprehensive();
        if result.is_valid {
            Ok(())
        } else {
            Err(TrellisError::Config(format!(
                "Configuration validation failed: {}",
                result.errors.join("; ")
            )))
        }
    }

    /// Validation with separate errors and warnings
    pub fn validate_comprehensive(&self) -> ValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if self.server.port == 0 {
            errors.push("server.port: invalid port number".to_string());
        }
        if self.server.hostname.trim().is_empty() {
            errors.push("server.hostname: must not be empty".to_string());
        }

        if self.chatbot.api_key_env.trim().is_empty() {
            errors.push("chatbot.api_key_env: must name an environment variable".to_string());
        }
        if !(self.chatbot.api_base.starts_with("http://")
            || self.chatbot.api_base.starts_with("https://"))
        {
            errors.push(format!(
                "chatbot.api_base: '{}' is not an http(s) URL",
                self.chatbot.api_base
            ));
        }
        if !(0.0..=2.0).contains(&self.chatbot.temperature) {
            errors.push("chatbot.temperature: must be between 0.0 and 2.0".to_string());
        }
        if self.chatbot.max_tokens == 0 {
            errors.push("chatbot.max_tokens: must be greater than zero".to_string());
        }
        if self.chatbot.api_key().is_none() {
            warnings.push(format!(
                "{} is not set, chatbot replies will come from the mock responder",
                self.chatbot.api_key_env
            ));
        }

        if self.site.deployment_latency_ms > 60_000 {
            warnings.push("site.deployment_latency_ms: longer than a minute".to_string());
        }

        ValidationResult {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub hostname: String,
    pub port: u16,
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            hostname: "127.0.0.1".to_string(),
            port: 3000,
            enable_cors: true,
        }
    }
}

/// Chat-completion provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatbotConfig {
    /// Name of the environment variable holding the provider credential
    pub api_key_env: String,
    pub api_base: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub request_timeout_secs: u64,
}

impl ChatbotConfig {
    /// Read the credential from the environment. Blank values count as absent.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

impl Default for ChatbotConfig {
    fn default() -> Self {
        Self {
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_base: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.7,
            max_tokens: 500,
            request_timeout_secs: 30,
        }
    }
}

/// Site shell configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Directory for the navigation store
    pub data_dir: PathBuf,
    /// Simulated deployment duration
    pub deployment_latency_ms: u64,
}

impl SiteConfig {
    /// Default data directory: `<config dir>/trellis`, or `./.trellis`
    pub fn default_data_dir() -> PathBuf {
        dirs::config_dir()
            .map(|dir| dir.join("trellis"))
            .unwrap_or_else(|| PathBuf::from(".trellis"))
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            data_dir: Self::default_data_dir(),
            deployment_latency_ms: 1500,
        }
    }
}

/// Outcome of a comprehensive validation pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}
