//! Hosted text-to-image inference endpoint.

use super::{api_key_from_env, build_http_client, check_status, ImageService};
use crate::error::{BookError, ServiceError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Image generation endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageProviderConfig {
    #[serde(default = "default_image_url")]
    pub url: String,

    /// Name of the environment variable holding the bearer token
    #[serde(default = "default_image_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,

    #[serde(default = "default_steps")]
    pub num_inference_steps: u32,

    #[serde(default = "default_image_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_image_url() -> String {
    "https://api-inference.huggingface.co/models/black-forest-labs/FLUX.1-dev".to_string()
}

fn default_image_key_env() -> String {
    "HF_TOKEN".to_string()
}

fn default_width() -> u32 {
    832
}

fn default_height() -> u32 {
    1152
}

fn default_steps() -> u32 {
    50
}

fn default_image_timeout_secs() -> u64 {
    240
}

impl Default for ImageProviderConfig {
    fn default() -> Self {
        Self {
            url: default_image_url(),
            api_key_env: default_image_key_env(),
            width: default_width(),
            height: default_height(),
            num_inference_steps: default_steps(),
            timeout_secs: default_image_timeout_secs(),
        }
    }
}

impl ImageProviderConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.url.trim().is_empty() {
            return Err("url cannot be empty".to_string());
        }
        if self.width == 0 || self.height == 0 {
            return Err("width and height must be greater than 0".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
}

#[derive(Serialize)]
struct InferenceParameters {
    width: u32,
    height: u32,
    num_inference_steps: u32,
}

pub struct InferenceImageService {
    client: Client,
    url: String,
    api_key: Option<String>,
    width: u32,
    height: u32,
    steps: u32,
}

impl InferenceImageService {
    pub fn new(config: &ImageProviderConfig) -> Result<Self, BookError> {
        config.validate().map_err(BookError::ConfigError)?;
        Ok(Self {
            client: build_http_client(Duration::from_secs(config.timeout_secs))?,
            url: config.url.clone(),
            api_key: api_key_from_env(&config.api_key_env),
            width: config.width,
            height: config.height,
            steps: config.num_inference_steps,
        })
    }

    fn request<'a>(&self, prompt: &'a str) -> InferenceRequest<'a> {
        InferenceRequest {
            inputs: prompt,
            parameters: InferenceParameters {
                width: self.width,
                height: self.height,
                num_inference_steps: self.steps,
            },
        }
    }
}

#[async_trait]
impl ImageService for InferenceImageService {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, ServiceError> {
        let mut builder = self.client.post(&self.url).json(&self.request(prompt));
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = check_status(builder.send().await?).await?;
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(ServiceError::EmptyResponse);
        }
        Ok(bytes.to_vec())
    }
}
