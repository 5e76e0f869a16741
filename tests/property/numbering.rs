//! Numbering stays a contiguous 1..=N sequence whatever order categories finish in.

use async_trait::async_trait;
use colorbook::error::ServiceError;
use colorbook::generation::{GenerationConfig, PromptAccumulator, PromptFanOutCoordinator};
use colorbook::provider::{CategoryService, PromptService};
use colorbook::retry::RetryingCaller;
use colorbook::types::{Category, PromptCollection, Topic};
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

/// (prompt count, completion delay in ms) per category.
struct Plan(Vec<(usize, u64)>);

fn category_name(index: usize) -> String {
    format!("Category {}", index)
}

#[async_trait]
impl CategoryService for Plan {
    async fn categories(&self, _topic: &Topic) -> Result<Vec<Category>, ServiceError> {
        Ok((0..self.0.len()).map(category_name).collect())
    }
}

#[async_trait]
impl PromptService for Plan {
    async fn prompts(&self, _topic: &Topic, category: &str) -> Result<Vec<String>, ServiceError> {
        let index: usize = category.trim_start_matches("Category ").parse().unwrap();
        let (count, delay_ms) = self.0[index];
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        Ok((0..count).map(|n| format!("{} prompt {}", category, n)).collect())
    }
}

fn assert_contiguous(collection: &PromptCollection, expected_total: usize) {
    let numbers: Vec<usize> = collection.iter().map(|r| r.sequence_number).collect();
    assert_eq!(numbers, (1..=expected_total).collect::<Vec<_>>());

    // Every category appears as a single run.
    let mut finished = HashSet::new();
    let mut current: Option<&str> = None;
    for record in collection {
        if current != Some(record.category.as_str()) {
            if let Some(previous) = current {
                finished.insert(previous.to_string());
            }
            assert!(!finished.contains(&record.category));
            current = Some(record.category.as_str());
        }
    }
}

/// Test that fan-out numbering is 1..=N for any completion schedule
#[test]
fn test_fanout_numbering_is_contiguous_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(
                prop::collection::vec((0usize..6, 0u64..5_000), 0..8),
                0usize..4,
            ),
            |(plan, limit)| {
                let expected_total: usize = plan.iter().map(|(count, _)| count).sum();
                let service = Arc::new(Plan(plan));
                let coordinator = PromptFanOutCoordinator::new(
                    service.clone(),
                    service,
                    RetryingCaller::default(),
                    &GenerationConfig {
                        max_concurrent_categories: limit,
                    },
                );
                let topic = Topic::parse("Cats").unwrap();

                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_time()
                    .start_paused(true)
                    .build()
                    .unwrap();
                let collection = runtime.block_on(coordinator.generate(&topic)).unwrap();

                assert_eq!(collection.len(), expected_total);
                assert_contiguous(&collection, expected_total);
                assert!(collection.iter().all(|r| r.text.starts_with("Cats: ")));
                Ok(())
            },
        )
        .unwrap();
}

/// Test that concurrent pushes never interleave and every prompt is kept
#[test]
fn test_accumulator_keeps_every_prompt_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&prop::collection::vec(0usize..10, 1..8), |counts| {
            let accumulator = Arc::new(PromptAccumulator::new());
            std::thread::scope(|scope| {
                for (index, count) in counts.iter().enumerate() {
                    let accumulator = Arc::clone(&accumulator);
                    scope.spawn(move || {
                        let texts = (0..*count).map(|n| format!("prompt {}", n)).collect();
                        accumulator.push_all(&category_name(index), texts);
                    });
                }
            });

            let topic = Topic::parse("Cats").unwrap();
            let collection = PromptCollection::from_drained(&topic, accumulator.drain());
            let expected_total: usize = counts.iter().sum();
            assert_contiguous(&collection, expected_total);

            let mut per_category: HashMap<&str, usize> = HashMap::new();
            for record in &collection {
                *per_category.entry(record.category.as_str()).or_default() += 1;
            }
            for (index, count) in counts.iter().enumerate() {
                let name = category_name(index);
                assert_eq!(per_category.get(name.as_str()).copied().unwrap_or(0), *count);
            }
            Ok(())
        })
        .unwrap();
}
