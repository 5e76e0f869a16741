//! Image pipeline: generate, rename, upscale and write one image per prompt.

pub mod enhance;
pub mod images;
pub mod naming;

pub use enhance::{encode_jpeg, Enhancement};
pub use images::{ImagePipeline, ImageRunReport, ImageStage};
pub use naming::tidy_display_name;
