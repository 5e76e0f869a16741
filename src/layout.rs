//! Book directory layout: where prompts and images live for a topic.
//!
//! ```text
//! <books_root>/<topic>/prompts.csv
//! <books_root>/<topic>/images/<name>.jpeg
//! ```

use crate::error::BookError;
use crate::types::Topic;
use std::path::{Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

pub const PROMPTS_FILE_NAME: &str = "prompts.csv";
pub const IMAGES_DIR_NAME: &str = "images";
pub const IMAGE_EXTENSION: &str = "jpeg";

const MAX_NAME_CHARS: usize = 120;
const UNTITLED: &str = "untitled";
const RESERVED: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Make `raw` safe as a single path segment.
///
/// NFC-normalizes, drops control characters, replaces reserved characters with
/// a space, collapses whitespace, strips trailing dots and spaces, and caps the
/// length. May return an empty string.
pub fn sanitize_segment(raw: &str) -> String {
    let replaced: String = raw
        .nfc()
        .filter(|c| !c.is_control())
        .map(|c| if RESERVED.contains(&c) { ' ' } else { c })
        .collect();

    let collapsed = replaced.split_whitespace().collect::<Vec<_>>().join(" ");
    let capped: String = collapsed.chars().take(MAX_NAME_CHARS).collect();
    capped.trim_end_matches(|c| c == '.' || c == ' ').to_string()
}

/// Sanitize an image name; falls back to `untitled` when nothing usable remains.
pub fn sanitize_file_name(raw: &str) -> String {
    let sanitized = sanitize_segment(raw);
    if sanitized.is_empty() {
        UNTITLED.to_string()
    } else {
        sanitized
    }
}

/// Path conventions shared by prompt persistence and the image pipeline.
#[derive(Debug, Clone)]
pub struct BookDirectoryLayout {
    root: PathBuf,
}

impl BookDirectoryLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn book_dir(&self, topic: &Topic) -> PathBuf {
        self.root.join(sanitize_segment(topic.as_str()))
    }

    pub fn prompts_path(&self, topic: &Topic) -> PathBuf {
        self.book_dir(topic).join(PROMPTS_FILE_NAME)
    }

    pub fn images_dir(&self, topic: &Topic) -> PathBuf {
        self.book_dir(topic).join(IMAGES_DIR_NAME)
    }

    /// Destination for an image. Identical names map to the same path.
    pub fn image_path(&self, topic: &Topic, name: &str) -> PathBuf {
        self.images_dir(topic)
            .join(format!("{}.{}", sanitize_file_name(name), IMAGE_EXTENSION))
    }

    /// Create the book and image directories if missing.
    pub fn prepare(&self, topic: &Topic) -> Result<(), BookError> {
        let images = self.images_dir(topic);
        std::fs::create_dir_all(&images).map_err(|e| BookError::io(&images, e))
    }
}
