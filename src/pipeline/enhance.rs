//! Best-effort upscaling with an explicit fallback result.

use crate::error::UpscaleError;
use crate::provider::Upscaler;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageResult};
use std::sync::Arc;

/// Outcome of the upscaling step. Every variant carries a writable image.
#[derive(Debug)]
pub enum Enhancement {
    Upscaled(DynamicImage),
    /// Upscaling failed; the original bitmap is kept.
    Fallback {
        original: DynamicImage,
        error: UpscaleError,
    },
    /// Upscaling is disabled.
    Skipped(DynamicImage),
}

impl Enhancement {
    pub fn image(&self) -> &DynamicImage {
        match self {
            Enhancement::Upscaled(image) => image,
            Enhancement::Fallback { original, .. } => original,
            Enhancement::Skipped(image) => image,
        }
    }

    pub fn is_upscaled(&self) -> bool {
        matches!(self, Enhancement::Upscaled(_))
    }
}

/// Run the upscaler off the async executor. A panicking upscaler counts as a failure.
pub async fn enhance(upscaler: Option<Arc<dyn Upscaler>>, original: DynamicImage) -> Enhancement {
    let Some(upscaler) = upscaler else {
        return Enhancement::Skipped(original);
    };

    let input = original.clone();
    let result = tokio::task::spawn_blocking(move || upscaler.upscale(&input)).await;
    match result {
        Ok(Ok(upscaled)) => Enhancement::Upscaled(upscaled),
        Ok(Err(error)) => Enhancement::Fallback { original, error },
        Err(join_error) => Enhancement::Fallback {
            original,
            error: UpscaleError::Backend(join_error.to_string()),
        },
    }
}

/// Encode as baseline RGB JPEG at `quality` (1-100).
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> ImageResult<Vec<u8>> {
    let rgb = image.to_rgb8();
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality).encode_image(&rgb)?;
    Ok(buffer)
}
