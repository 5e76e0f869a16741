//! External Service Adapters
//!
//! Narrow request/response contracts for the services the pipeline depends on:
//! category and prompt generation, image generation, renaming and upscaling.
//! Handles are built once by [`ServiceSet::from_config`] and passed down by `Arc`.

use crate::error::{BookError, ServiceError, UpscaleError};
use crate::types::{Category, Topic};
use async_trait::async_trait;
use image::DynamicImage;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub mod image_gen;
pub mod llm;
pub mod upscale;

pub use image_gen::{ImageProviderConfig, InferenceImageService};
pub use llm::{LlmCategoryService, LlmPromptService, LlmRenameService};
pub use upscale::{ResampleUpscaler, UpscaleConfig};

/// Topic → ordered category labels.
#[async_trait]
pub trait CategoryService: Send + Sync {
    async fn categories(&self, topic: &Topic) -> Result<Vec<Category>, ServiceError>;
}

/// (topic, category) → prompt texts, unordered.
#[async_trait]
pub trait PromptService: Send + Sync {
    async fn prompts(&self, topic: &Topic, category: &str) -> Result<Vec<String>, ServiceError>;
}

/// Composite prompt → raw encoded image bytes.
#[async_trait]
pub trait ImageService: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, ServiceError>;
}

/// Long descriptive text → short display name.
#[async_trait]
pub trait RenameService: Send + Sync {
    async fn shorten(&self, text: &str) -> Result<String, ServiceError>;
}

/// Bitmap → enlarged bitmap. Synchronous: holds an exclusive compute resource.
pub trait Upscaler: Send + Sync {
    fn upscale(&self, image: &DynamicImage) -> Result<DynamicImage, UpscaleError>;
}

/// Chat message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// OpenAI-compatible chat endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatProviderConfig {
    /// Base URL up to and including the version segment
    pub base_url: String,

    pub model: String,

    /// Name of the environment variable holding the API key
    pub api_key_env: String,

    #[serde(default)]
    pub temperature: Option<f32>,

    #[serde(default = "default_chat_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_chat_timeout_secs() -> u64 {
    120
}

impl ChatProviderConfig {
    /// Defaults for category and prompt generation.
    pub fn text_default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            temperature: None,
            timeout_secs: default_chat_timeout_secs(),
        }
    }

    /// Defaults for image renaming (Gemini via its OpenAI-compatible endpoint).
    pub fn rename_default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            model: "gemini-1.5-flash".to_string(),
            api_key_env: "GOOGLE_API_KEY".to_string(),
            temperature: None,
            timeout_secs: default_chat_timeout_secs(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.base_url.trim().is_empty() {
            return Err("base_url cannot be empty".to_string());
        }
        if self.model.trim().is_empty() {
            return Err("model cannot be empty".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// All external service settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProvidersConfig {
    /// Category and prompt generation
    #[serde(default = "ChatProviderConfig::text_default")]
    pub text: ChatProviderConfig,

    /// Image renaming
    #[serde(default = "ChatProviderConfig::rename_default")]
    pub rename: ChatProviderConfig,

    #[serde(default)]
    pub image: ImageProviderConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            text: ChatProviderConfig::text_default(),
            rename: ChatProviderConfig::rename_default(),
            image: ImageProviderConfig::default(),
        }
    }
}

/// Read an API key from the named environment variable.
pub(crate) fn api_key_from_env(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|key| !key.trim().is_empty())
}

const PROVIDER_HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) fn build_http_client(timeout: Duration) -> Result<Client, BookError> {
    Client::builder()
        .connect_timeout(PROVIDER_HTTP_CONNECT_TIMEOUT)
        .timeout(timeout)
        .build()
        .map_err(|e| BookError::ServiceSetup(format!("Failed to create HTTP client: {}", e)))
}

/// Turn a non-success response into a [`ServiceError::Status`].
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(ServiceError::Status {
        status: status.as_u16(),
        body,
    })
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible chat completion client
pub struct ChatClient {
    client: Client,
    model: String,
    api_key: Option<String>,
    base_url: String,
    temperature: Option<f32>,
}

impl ChatClient {
    pub fn new(config: &ChatProviderConfig) -> Result<Self, BookError> {
        config.validate().map_err(BookError::ConfigError)?;
        let client = build_http_client(Duration::from_secs(config.timeout_secs))?;
        Ok(Self {
            client,
            model: config.model.clone(),
            api_key: api_key_from_env(&config.api_key_env),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            temperature: config.temperature,
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }

    /// Send `messages` and return the first choice's content.
    ///
    /// With `json_mode` the endpoint is asked for a JSON object response.
    pub async fn complete(
        &self,
        messages: &[ChatMessage],
        json_mode: bool,
    ) -> Result<String, ServiceError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            response_format: json_mode.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        let url = format!("{}/chat/completions", self.base_url);
        let mut builder = self.client.post(&url).json(&request);
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = check_status(builder.send().await?).await?;
        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::Parse(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(ServiceError::EmptyResponse)
    }
}

/// Long-lived service handles shared by the pipeline stages.
#[derive(Clone)]
pub struct ServiceSet {
    pub categories: Arc<dyn CategoryService>,
    pub prompts: Arc<dyn PromptService>,
    pub images: Arc<dyn ImageService>,
    pub renamer: Arc<dyn RenameService>,
    pub upscaler: Arc<dyn Upscaler>,
}

impl ServiceSet {
    pub fn from_config(
        providers: &ProvidersConfig,
        upscale: &UpscaleConfig,
    ) -> Result<Self, BookError> {
        let text = Arc::new(ChatClient::new(&providers.text)?);
        let rename = Arc::new(ChatClient::new(&providers.rename)?);

        Ok(Self {
            categories: Arc::new(LlmCategoryService::new(Arc::clone(&text))),
            prompts: Arc::new(LlmPromptService::new(text)),
            images: Arc::new(InferenceImageService::new(&providers.image)?),
            renamer: Arc::new(LlmRenameService::new(rename)),
            upscaler: Arc::new(ResampleUpscaler::from_config(upscale)),
        })
    }
}
