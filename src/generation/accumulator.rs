//! Thread-safe collector for prompts produced by concurrent category workers.

use crate::types::Category;
use parking_lot::Mutex;

/// Unordered append-only collector, drained once after every worker has joined.
#[derive(Debug, Default)]
pub struct PromptAccumulator {
    entries: Mutex<Vec<(Category, String)>>,
}

impl PromptAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append every prompt of one category in a single critical section.
    pub fn push_all(&self, category: &Category, prompts: Vec<String>) {
        let mut entries = self.entries.lock();
        entries.extend(prompts.into_iter().map(|p| (category.clone(), p)));
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take everything in push order, leaving the accumulator empty.
    pub fn drain(&self) -> Vec<(Category, String)> {
        std::mem::take(&mut *self.entries.lock())
    }
}
