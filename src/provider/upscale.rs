//! In-process resampling upscaler.

use super::Upscaler;
use crate::error::UpscaleError;
use image::imageops::FilterType;
use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// Upscaling and output encoding settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpscaleConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Integer scale factor
    #[serde(default = "default_factor")]
    pub factor: u32,

    /// Refuse to produce images larger than this many pixels
    #[serde(default = "default_max_pixels")]
    pub max_pixels: u64,

    /// JPEG quality for upscaled output (reduced to keep files small)
    #[serde(default = "default_upscaled_quality")]
    pub upscaled_quality: u8,

    /// JPEG quality for images written without upscaling
    #[serde(default = "default_original_quality")]
    pub original_quality: u8,
}

fn default_true() -> bool {
    true
}

fn default_factor() -> u32 {
    2
}

fn default_max_pixels() -> u64 {
    // 4x the default 832x1152 generation size.
    4 * 832 * 1152
}

fn default_upscaled_quality() -> u8 {
    80
}

fn default_original_quality() -> u8 {
    95
}

impl Default for UpscaleConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            factor: default_factor(),
            max_pixels: default_max_pixels(),
            upscaled_quality: default_upscaled_quality(),
            original_quality: default_original_quality(),
        }
    }
}

impl UpscaleConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.factor == 0 {
            return Err("factor must be at least 1".to_string());
        }
        for (name, quality) in [
            ("upscaled_quality", self.upscaled_quality),
            ("original_quality", self.original_quality),
        ] {
            if !(1..=100).contains(&quality) {
                return Err(format!("{} must be between 1 and 100", name));
            }
        }
        Ok(())
    }
}

/// Lanczos3 resize by an integer factor.
#[derive(Debug, Clone)]
pub struct ResampleUpscaler {
    factor: u32,
    max_pixels: u64,
}

impl ResampleUpscaler {
    pub fn new(factor: u32, max_pixels: u64) -> Self {
        Self { factor, max_pixels }
    }

    pub fn from_config(config: &UpscaleConfig) -> Self {
        Self::new(config.factor, config.max_pixels)
    }
}

impl Upscaler for ResampleUpscaler {
    fn upscale(&self, image: &DynamicImage) -> Result<DynamicImage, UpscaleError> {
        if self.factor == 0 {
            return Err(UpscaleError::InvalidFactor(self.factor));
        }
        let width = image.width().saturating_mul(self.factor);
        let height = image.height().saturating_mul(self.factor);
        if u64::from(width) * u64::from(height) > self.max_pixels {
            return Err(UpscaleError::TooLarge {
                width,
                height,
                max_pixels: self.max_pixels,
            });
        }
        Ok(image.resize_exact(width, height, FilterType::Lanczos3))
    }
}
