//! Prompt persistence: the tab-separated `prompts.csv` side artifact.
//!
//! Prompt text is written verbatim. A tab or newline inside a prompt produces a
//! malformed row; that is a known limitation of the format.

use crate::error::BookError;
use crate::layout::BookDirectoryLayout;
use crate::types::{PromptCollection, PromptRecord, Topic};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

pub const PROMPTS_HEADER: &str = "No.\tPrompt";

pub struct PromptPersistence {
    layout: BookDirectoryLayout,
}

impl PromptPersistence {
    pub fn new(layout: BookDirectoryLayout) -> Self {
        Self { layout }
    }

    /// Create or truncate the topic's prompt file and write every record.
    pub fn write(&self, topic: &Topic, prompts: &PromptCollection) -> Result<PathBuf, BookError> {
        let path = self.layout.prompts_path(topic);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| BookError::io(parent, e))?;
        }
        let file = File::create(&path).map_err(|e| BookError::io(&path, e))?;
        let mut writer = BufWriter::new(file);

        write_rows(&mut writer, topic, prompts).map_err(|e| BookError::io(&path, e))?;
        writer.flush().map_err(|e| BookError::io(&path, e))?;

        info!(topic = %topic, rows = prompts.len(), path = %path.display(), "Prompts saved");
        Ok(path)
    }

    /// Load a previously written prompt file. Categories are not stored, so they come back empty.
    pub fn read(&self, topic: &Topic) -> Result<PromptCollection, BookError> {
        let path = self.layout.prompts_path(topic);
        let content = std::fs::read_to_string(&path).map_err(|e| BookError::io(&path, e))?;
        parse_rows(&path, topic, &content)
    }
}

fn write_rows<W: Write>(
    writer: &mut W,
    topic: &Topic,
    prompts: &PromptCollection,
) -> std::io::Result<()> {
    writeln!(writer, "{}", PROMPTS_HEADER)?;
    for record in prompts {
        writeln!(writer, "{}\t{}", record.sequence_number, topic.prefix(&record.text))?;
    }
    Ok(())
}

fn parse_rows(path: &Path, topic: &Topic, content: &str) -> Result<PromptCollection, BookError> {
    let malformed = |message: String| BookError::MalformedPrompts {
        path: path.to_path_buf(),
        message,
    };

    let mut lines = content.lines();
    match lines.next() {
        Some(header) if header.trim_end() == PROMPTS_HEADER => {}
        other => {
            return Err(malformed(format!(
                "expected header '{}', found {:?}",
                PROMPTS_HEADER.escape_default(),
                other
            )))
        }
    }

    let mut records = Vec::new();
    for (index, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let (number, text) = line
            .split_once('\t')
            .ok_or_else(|| malformed(format!("row {} has no tab separator", index + 1)))?;
        let sequence_number = number
            .trim()
            .parse::<usize>()
            .map_err(|e| malformed(format!("row {} has a bad number: {}", index + 1, e)))?;
        records.push(PromptRecord {
            sequence_number,
            category: String::new(),
            text: topic.prefix(text),
        });
    }

    let collection = PromptCollection::from_records(records);
    for (expected, record) in (1..).zip(collection.iter()) {
        if record.sequence_number != expected {
            return Err(malformed(format!(
                "row numbers must run 1..={} without gaps or repeats, found {} where {} was expected",
                collection.len(),
                record.sequence_number,
                expected
            )));
        }
    }
    Ok(collection)
}
