//! In-memory service doubles shared by the integration tests.

use async_trait::async_trait;
use colorbook::config::BookConfig;
use colorbook::error::{ServiceError, UpscaleError};
use colorbook::provider::{
    CategoryService, ImageService, PromptService, RenameService, ServiceSet, Upscaler,
};
use colorbook::types::{Category, Topic};
use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const IMAGE_WIDTH: u32 = 16;
pub const IMAGE_HEIGHT: u32 = 24;

/// A small white PNG, the shape an inference endpoint would return.
pub fn png_bytes() -> Vec<u8> {
    let image = DynamicImage::ImageLuma8(GrayImage::from_pixel(
        IMAGE_WIDTH,
        IMAGE_HEIGHT,
        Luma([255]),
    ));
    let mut cursor = Cursor::new(Vec::new());
    image.write_to(&mut cursor, ImageFormat::Png).unwrap();
    cursor.into_inner()
}

/// Config rooted in `books_root` with production retry timing.
pub fn test_config(books_root: &Path) -> BookConfig {
    let mut config = BookConfig::default();
    config.books_root = books_root.to_path_buf();
    config
}

pub struct ScriptedCategories {
    categories: Vec<Category>,
    failures_remaining: AtomicU32,
    pub calls: AtomicUsize,
}

impl ScriptedCategories {
    pub fn new(categories: &[&str]) -> Self {
        Self::failing(categories, 0)
    }

    pub fn failing(categories: &[&str], failures: u32) -> Self {
        Self {
            categories: categories.iter().map(|c| c.to_string()).collect(),
            failures_remaining: AtomicU32::new(failures),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CategoryService for ScriptedCategories {
    async fn categories(&self, _topic: &Topic) -> Result<Vec<Category>, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if take_failure(&self.failures_remaining) {
            return Err(ServiceError::Timeout("scripted timeout".to_string()));
        }
        Ok(self.categories.clone())
    }
}

/// Per-category prompt lists, completion delays and failure counts.
#[derive(Default)]
pub struct ScriptedPrompts {
    prompts: HashMap<String, Vec<String>>,
    delays: HashMap<String, Duration>,
    failures: Mutex<HashMap<String, u32>>,
    always_fail: bool,
    pub calls: AtomicUsize,
}

impl ScriptedPrompts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn always_failing() -> Self {
        Self {
            always_fail: true,
            ..Self::default()
        }
    }

    pub fn with(mut self, category: &str, prompts: &[&str]) -> Self {
        self.prompts.insert(
            category.to_string(),
            prompts.iter().map(|p| p.to_string()).collect(),
        );
        self
    }

    pub fn with_delay(mut self, category: &str, delay: Duration) -> Self {
        self.delays.insert(category.to_string(), delay);
        self
    }

    pub fn with_failures(self, category: &str, failures: u32) -> Self {
        self.failures.lock().insert(category.to_string(), failures);
        self
    }
}

#[async_trait]
impl PromptService for ScriptedPrompts {
    async fn prompts(&self, _topic: &Topic, category: &str) -> Result<Vec<String>, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(category) {
            tokio::time::sleep(*delay).await;
        }
        if self.always_fail {
            return Err(ServiceError::Status {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        {
            let mut failures = self.failures.lock();
            if let Some(remaining) = failures.get_mut(category) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(ServiceError::Timeout("scripted timeout".to_string()));
                }
            }
        }
        Ok(self.prompts.get(category).cloned().unwrap_or_default())
    }
}

/// Returns PNG bytes. The first `failures` calls fail, then `corrupt` calls
/// return bytes that do not decode.
pub struct PngImages {
    failures_remaining: AtomicU32,
    corrupt_remaining: AtomicU32,
    pub calls: AtomicUsize,
    pub prompts: Mutex<Vec<String>>,
}

impl PngImages {
    pub fn new() -> Self {
        Self::failing(0)
    }

    pub fn failing(failures: u32) -> Self {
        Self {
            failures_remaining: AtomicU32::new(failures),
            corrupt_remaining: AtomicU32::new(0),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn corrupt(corrupt: u32) -> Self {
        let images = Self::new();
        images.corrupt_remaining.store(corrupt, Ordering::SeqCst);
        images
    }
}

#[async_trait]
impl ImageService for PngImages {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if take_failure(&self.failures_remaining) {
            return Err(ServiceError::Timeout("scripted timeout".to_string()));
        }
        if take_failure(&self.corrupt_remaining) {
            return Ok(b"<html>rate limited</html>".to_vec());
        }
        self.prompts.lock().push(prompt.to_string());
        Ok(png_bytes())
    }
}

/// Names an image after the prompt text, with the stray punctuation a model adds.
pub struct PromptRenamer;

#[async_trait]
impl RenameService for PromptRenamer {
    async fn shorten(&self, text: &str) -> Result<String, ServiceError> {
        let short = text.split_once(": ").map(|(_, rest)| rest).unwrap_or(text);
        Ok(format!(" {}.\n", short))
    }
}

/// Always answers with the same name.
pub struct ConstantRenamer(pub &'static str);

#[async_trait]
impl RenameService for ConstantRenamer {
    async fn shorten(&self, _text: &str) -> Result<String, ServiceError> {
        Ok(self.0.to_string())
    }
}

pub struct FailingUpscaler;

impl Upscaler for FailingUpscaler {
    fn upscale(&self, _image: &DynamicImage) -> Result<DynamicImage, UpscaleError> {
        Err(UpscaleError::Backend("out of device memory".to_string()))
    }
}

pub struct PanickingUpscaler;

impl Upscaler for PanickingUpscaler {
    fn upscale(&self, _image: &DynamicImage) -> Result<DynamicImage, UpscaleError> {
        panic!("upscaler crashed")
    }
}

/// Assemble a service set around the given doubles.
pub fn services(
    categories: Arc<dyn CategoryService>,
    prompts: Arc<dyn PromptService>,
    images: Arc<dyn ImageService>,
    renamer: Arc<dyn RenameService>,
    upscaler: Arc<dyn Upscaler>,
) -> ServiceSet {
    ServiceSet {
        categories,
        prompts,
        images,
        renamer,
        upscaler,
    }
}

fn take_failure(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}
