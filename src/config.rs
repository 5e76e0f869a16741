//! Configuration System
//!
//! Layered configuration: built-in defaults, the global config file, the workspace
//! `colorbook.toml` (or an explicit file), then `COLORBOOK__SECTION__KEY`
//! environment overrides.

use crate::error::BookError;
use crate::generation::GenerationConfig;
use crate::logging::LoggingConfig;
use crate::provider::{ProvidersConfig, UpscaleConfig};
use crate::retry::RetryConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

mod loader;
mod merge_policy;
pub mod sources;

pub use loader::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookConfig {
    /// Directory holding one sub-directory per topic
    #[serde(default = "default_books_root")]
    pub books_root: PathBuf,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub providers: ProvidersConfig,

    #[serde(default)]
    pub upscale: UpscaleConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_books_root() -> PathBuf {
    PathBuf::from("books")
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            books_root: default_books_root(),
            retry: RetryConfig::default(),
            generation: GenerationConfig::default(),
            providers: ProvidersConfig::default(),
            upscale: UpscaleConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Provider(String, String),
    Upscale(String),
    System(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Provider(name, msg) => write!(f, "Provider '{}': {}", name, msg),
            ValidationError::Upscale(msg) => write!(f, "Upscale: {}", msg),
            ValidationError::System(msg) => write!(f, "System: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl BookConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.books_root.as_os_str().is_empty() {
            errors.push(ValidationError::System("books_root cannot be empty".to_string()));
        }
        if self.retry.delay_secs == 0 {
            errors.push(ValidationError::System(
                "retry.delay_secs must be at least 1".to_string(),
            ));
        }
        if self.retry.max_attempts == Some(0) {
            errors.push(ValidationError::System(
                "retry.max_attempts must be at least 1 when set".to_string(),
            ));
        }

        if let Err(e) = self.providers.text.validate() {
            errors.push(ValidationError::Provider("text".to_string(), e));
        }
        if let Err(e) = self.providers.rename.validate() {
            errors.push(ValidationError::Provider("rename".to_string(), e));
        }
        if let Err(e) = self.providers.image.validate() {
            errors.push(ValidationError::Provider("image".to_string(), e));
        }
        if let Err(e) = self.upscale.validate() {
            errors.push(ValidationError::Upscale(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate and fold every problem into a single error.
    pub fn validated(self) -> Result<Self, BookError> {
        self.validate().map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            BookError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                messages.join("\n")
            ))
        })?;
        Ok(self)
    }
}
