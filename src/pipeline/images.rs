//! Sequential image pipeline.
//!
//! Prompts are processed one at a time: `Generating → Naming → Upscaling → Written`.
//! Generation and naming retry until they succeed; upscaling never fails the
//! prompt, it falls back to the original bitmap.

use crate::error::{BookError, ServiceError};
use crate::layout::BookDirectoryLayout;
use crate::pipeline::enhance::{encode_jpeg, enhance, Enhancement};
use crate::pipeline::naming::tidy_display_name;
use crate::provider::upscale::UpscaleConfig;
use crate::provider::{ImageService, RenameService, Upscaler};
use crate::retry::RetryingCaller;
use crate::types::{ImageJob, PromptCollection, PromptRecord, Topic};
use image::DynamicImage;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Per-prompt stage, reported in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageStage {
    Generating,
    Naming,
    Upscaling,
    Written,
}

impl fmt::Display for ImageStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ImageStage::Generating => "generating",
            ImageStage::Naming => "naming",
            ImageStage::Upscaling => "upscaling",
            ImageStage::Written => "written",
        };
        f.write_str(label)
    }
}

/// What a pipeline run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageRunReport {
    /// Destination of every write, in prompt order. May repeat when names collide.
    pub written: Vec<PathBuf>,
    pub upscaled: usize,
    pub upscale_fallbacks: usize,
}

pub struct ImagePipeline {
    images: Arc<dyn ImageService>,
    renamer: Arc<dyn RenameService>,
    upscaler: Option<Arc<dyn Upscaler>>,
    retry: RetryingCaller,
    layout: BookDirectoryLayout,
    upscaled_quality: u8,
    original_quality: u8,
}

impl ImagePipeline {
    pub fn new(
        images: Arc<dyn ImageService>,
        renamer: Arc<dyn RenameService>,
        upscaler: Arc<dyn Upscaler>,
        retry: RetryingCaller,
        layout: BookDirectoryLayout,
        config: &UpscaleConfig,
    ) -> Self {
        Self {
            images,
            renamer,
            upscaler: config.enabled.then_some(upscaler),
            retry,
            layout,
            upscaled_quality: config.upscaled_quality,
            original_quality: config.original_quality,
        }
    }

    /// Process every prompt in order, writing one image each.
    pub async fn run(
        &self,
        prompts: &PromptCollection,
        topic: &Topic,
    ) -> Result<ImageRunReport, BookError> {
        self.layout.prepare(topic)?;
        info!(topic = %topic, prompt_count = prompts.len(), "Generating images for each prompt");

        let mut report = ImageRunReport::default();
        for record in prompts {
            let (path, enhancement) = self.process(record, topic).await?;
            match enhancement {
                Enhancement::Upscaled(_) => report.upscaled += 1,
                Enhancement::Fallback { .. } => report.upscale_fallbacks += 1,
                Enhancement::Skipped(_) => {}
            }
            report.written.push(path);
        }

        info!(
            topic = %topic,
            images_dir = %self.layout.images_dir(topic).display(),
            written = report.written.len(),
            upscale_fallbacks = report.upscale_fallbacks,
            "Images saved"
        );
        Ok(report)
    }

    async fn process(
        &self,
        record: &PromptRecord,
        topic: &Topic,
    ) -> Result<(PathBuf, Enhancement), BookError> {
        let prompt = topic.prefix(&record.text);
        info!(sequence = record.sequence_number, "{}. {}", record.sequence_number, prompt);

        self.enter(record, ImageStage::Generating);
        let started = Instant::now();
        let (raw_image_bytes, bitmap) = self.generate(&prompt).await?;
        info!(
            sequence = record.sequence_number,
            "Time taken to generate image: {:.2} seconds",
            started.elapsed().as_secs_f64()
        );

        self.enter(record, ImageStage::Naming);
        let renamer = &self.renamer;
        let prompt_ref = prompt.as_str();
        let raw_name = self
            .retry
            .call("naming image", move || renamer.shorten(prompt_ref))
            .await?;
        let final_name = tidy_display_name(&raw_name);

        let job = ImageJob {
            prompt: record,
            raw_image_bytes,
            final_path: self.layout.image_path(topic, &final_name),
            final_name,
        };
        debug!(
            sequence = job.prompt.sequence_number,
            name = %job.final_name,
            raw_bytes = job.raw_image_bytes.len(),
            "Named image"
        );

        self.enter(record, ImageStage::Upscaling);
        let enhancement = enhance(self.upscaler.clone(), bitmap).await;
        let quality = match &enhancement {
            Enhancement::Upscaled(_) => self.upscaled_quality,
            Enhancement::Fallback { error, .. } => {
                warn!(
                    sequence = record.sequence_number,
                    error = %error,
                    "Error in upscaling image: {}. Saving original instead",
                    error
                );
                self.original_quality
            }
            Enhancement::Skipped(_) => self.original_quality,
        };

        let encoded = encode_jpeg(enhancement.image(), quality).map_err(|e| BookError::Encode {
            path: job.final_path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&job.final_path, encoded).map_err(|e| BookError::io(&job.final_path, e))?;

        self.enter(record, ImageStage::Written);
        info!(
            sequence = record.sequence_number,
            path = %job.final_path.display(),
            upscaled = enhancement.is_upscaled(),
            "Image written"
        );
        Ok((job.final_path, enhancement))
    }

    /// Fetch and decode; decode failures retry exactly like transport failures.
    async fn generate(&self, prompt: &str) -> Result<(Vec<u8>, DynamicImage), BookError> {
        let images = &self.images;
        self.retry
            .call("generating image", move || async move {
                let bytes = images.generate(prompt).await?;
                let bitmap = image::load_from_memory(&bytes).map_err(ServiceError::from)?;
                Ok::<_, ServiceError>((bytes, bitmap))
            })
            .await
    }

    fn enter(&self, record: &PromptRecord, stage: ImageStage) {
        debug!(sequence = record.sequence_number, stage = %stage, "Image stage");
    }
}
