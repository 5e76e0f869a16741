//! Category fan-out: one worker per category, merged after a join barrier.
//!
//! Workers push into a shared [`PromptAccumulator`] in whatever order they finish.
//! Sequence numbers are assigned in drain order once every worker has joined, so
//! numbering is contiguous but not reproducible across runs.

use crate::error::BookError;
use crate::generation::accumulator::PromptAccumulator;
use crate::provider::{CategoryService, PromptService};
use crate::retry::RetryingCaller;
use crate::types::{Category, PromptCollection, Topic};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info};

/// Fan-out settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationConfig {
    /// Category workers allowed to run at once. 0 means no limit.
    #[serde(default = "default_max_concurrent_categories")]
    pub max_concurrent_categories: usize,
}

fn default_max_concurrent_categories() -> usize {
    16
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_concurrent_categories: default_max_concurrent_categories(),
        }
    }
}

pub struct PromptFanOutCoordinator {
    categories: Arc<dyn CategoryService>,
    prompts: Arc<dyn PromptService>,
    retry: RetryingCaller,
    limiter: Option<Arc<Semaphore>>,
}

impl PromptFanOutCoordinator {
    pub fn new(
        categories: Arc<dyn CategoryService>,
        prompts: Arc<dyn PromptService>,
        retry: RetryingCaller,
        config: &GenerationConfig,
    ) -> Self {
        let limiter = match config.max_concurrent_categories {
            0 => None,
            limit => Some(Arc::new(Semaphore::new(limit))),
        };
        Self {
            categories,
            prompts,
            retry,
            limiter,
        }
    }

    /// Obtain categories, then prompts for every category concurrently.
    pub async fn generate(&self, topic: &Topic) -> Result<PromptCollection, BookError> {
        info!(topic = %topic, "Generating categories for the given topic");
        let categories = self
            .retry
            .call("generating categories", || self.categories.categories(topic))
            .await?;

        for (index, category) in categories.iter().enumerate() {
            info!(topic = %topic, "{}. {}", index + 1, category);
        }

        info!(
            topic = %topic,
            category_count = categories.len(),
            "Generating prompts for each category"
        );
        let accumulator = Arc::new(PromptAccumulator::new());
        let mut workers = JoinSet::new();
        for category in categories {
            workers.spawn(category_worker(
                topic.clone(),
                category,
                Arc::clone(&self.prompts),
                self.retry.clone(),
                self.limiter.clone(),
                Arc::clone(&accumulator),
            ));
        }

        let mut first_error = None;
        while let Some(joined) = workers.join_next().await {
            let outcome = joined.map_err(|e| BookError::WorkerFailed(e.to_string()));
            if let Err(err) = outcome.and_then(|result| result) {
                first_error.get_or_insert(err);
            }
        }
        if let Some(err) = first_error {
            return Err(err);
        }

        let drained = accumulator.drain();
        debug!(topic = %topic, prompt_count = drained.len(), "Merged category prompts");
        Ok(PromptCollection::from_drained(topic, drained))
    }
}

async fn category_worker(
    topic: Topic,
    category: Category,
    prompts: Arc<dyn PromptService>,
    retry: RetryingCaller,
    limiter: Option<Arc<Semaphore>>,
    accumulator: Arc<PromptAccumulator>,
) -> Result<(), BookError> {
    let _permit = match limiter {
        Some(semaphore) => Some(
            semaphore
                .acquire_owned()
                .await
                .map_err(|e| BookError::WorkerFailed(e.to_string()))?,
        ),
        None => None,
    };

    let texts = retry
        .call("generating prompts", || prompts.prompts(&topic, &category))
        .await?;
    let count = texts.len();
    accumulator.push_all(&category, texts);
    info!(category = %category, prompt_count = count, "{} | \u{2713}", category);
    Ok(())
}
