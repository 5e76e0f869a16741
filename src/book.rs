//! Book run orchestration: topic → prompts → prompts.csv → images.

use crate::config::BookConfig;
use crate::error::BookError;
use crate::generation::PromptFanOutCoordinator;
use crate::layout::BookDirectoryLayout;
use crate::persistence::PromptPersistence;
use crate::pipeline::{ImagePipeline, ImageRunReport};
use crate::provider::ServiceSet;
use crate::retry::RetryingCaller;
use crate::types::{PromptCollection, Topic};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Result of a run, for presentation.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub topic: Topic,
    pub prompts: PromptCollection,
    pub prompts_path: PathBuf,
    pub images_dir: PathBuf,
    pub images: Option<ImageRunReport>,
}

pub struct BookGenerator {
    layout: BookDirectoryLayout,
    coordinator: PromptFanOutCoordinator,
    persistence: PromptPersistence,
    pipeline: ImagePipeline,
}

impl BookGenerator {
    /// Wire the stages around already constructed service handles.
    pub fn new(config: &BookConfig, services: ServiceSet, cancel: Option<CancellationToken>) -> Self {
        let mut retry = RetryingCaller::from_config(&config.retry);
        if let Some(token) = cancel {
            retry = retry.with_cancellation(token);
        }
        let layout = BookDirectoryLayout::new(&config.books_root);

        Self {
            coordinator: PromptFanOutCoordinator::new(
                services.categories,
                services.prompts,
                retry.clone(),
                &config.generation,
            ),
            persistence: PromptPersistence::new(layout.clone()),
            pipeline: ImagePipeline::new(
                services.images,
                services.renamer,
                services.upscaler,
                retry,
                layout.clone(),
                &config.upscale,
            ),
            layout,
        }
    }

    /// Full run: prompts, then images.
    pub async fn generate(&self, topic: &Topic) -> Result<RunReport, BookError> {
        let mut report = self.prompts(topic).await?;
        report.images = Some(self.pipeline.run(&report.prompts, topic).await?);
        Ok(report)
    }

    /// Fan out and persist prompts without generating images.
    pub async fn prompts(&self, topic: &Topic) -> Result<RunReport, BookError> {
        self.layout.prepare(topic)?;
        let prompts = self.coordinator.generate(topic).await?;
        let prompts_path = self.persistence.write(topic, &prompts)?;
        info!(topic = %topic, prompt_count = prompts.len(), "Prompt generation complete");

        Ok(RunReport {
            topic: topic.clone(),
            prompts,
            prompts_path,
            images_dir: self.layout.images_dir(topic),
            images: None,
        })
    }

    /// Re-drive images from an existing prompt file.
    pub async fn images(&self, topic: &Topic) -> Result<RunReport, BookError> {
        let prompts = self.persistence.read(topic)?;
        info!(topic = %topic, prompt_count = prompts.len(), "Loaded prompts");
        let images = self.pipeline.run(&prompts, topic).await?;

        Ok(RunReport {
            topic: topic.clone(),
            prompts,
            prompts_path: self.layout.prompts_path(topic),
            images_dir: self.layout.images_dir(topic),
            images: Some(images),
        })
    }
}
