//! Core data types: topics, categories, prompt records and collections.

use crate::error::BookError;
use crate::layout::sanitize_segment;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Subject of a coloring book, as the operator typed it (trimmed).
///
/// Only [`BookDirectoryLayout`](crate::layout::BookDirectoryLayout) turns it into a
/// path segment; everything else sees the original text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Topic(String);

impl Topic {
    /// Validate and normalize a user-supplied topic.
    pub fn parse(raw: &str) -> Result<Self, BookError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(BookError::InvalidTopic("topic is empty".to_string()));
        }
        let sanitized = sanitize_segment(trimmed);
        if sanitized.is_empty() || sanitized == "." || sanitized == ".." {
            return Err(BookError::InvalidTopic(format!(
                "'{}' is not usable as a directory name",
                raw
            )));
        }
        Ok(Topic(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Prefix `text` with the topic, unless it already carries that prefix.
    pub fn prefix(&self, text: &str) -> String {
        let marker = format!("{}: ", self.0);
        let text = text.trim();
        if text.starts_with(&marker) {
            text.to_string()
        } else {
            format!("{}{}", marker, text)
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Thematic grouping of prompts under a topic.
pub type Category = String;

/// One illustration description in its final position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptRecord {
    /// 1-based position in the persisted order
    pub sequence_number: usize,
    pub category: Category,
    /// Prompt text, prefixed with the topic
    pub text: String,
}

/// Ordered, immutable snapshot of every prompt in a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptCollection {
    records: Vec<PromptRecord>,
}

impl PromptCollection {
    /// Number prompts 1..=N in the order given.
    pub fn from_drained(topic: &Topic, drained: Vec<(Category, String)>) -> Self {
        let records = drained
            .into_iter()
            .enumerate()
            .map(|(index, (category, text))| PromptRecord {
                sequence_number: index + 1,
                category,
                text: topic.prefix(&text),
            })
            .collect();
        Self { records }
    }

    /// Build from records that already carry sequence numbers; sorts by them.
    pub fn from_records(mut records: Vec<PromptRecord>) -> Self {
        records.sort_by_key(|r| r.sequence_number);
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PromptRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[PromptRecord] {
        &self.records
    }
}

impl<'a> IntoIterator for &'a PromptCollection {
    type Item = &'a PromptRecord;
    type IntoIter = std::slice::Iter<'a, PromptRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Per-prompt working state inside the image pipeline.
#[derive(Debug)]
pub struct ImageJob<'a> {
    pub prompt: &'a PromptRecord,
    pub raw_image_bytes: Vec<u8>,
    pub final_name: String,
    pub final_path: PathBuf,
}
