//! End-to-end runs of the book generator against in-memory services

use super::support::{
    services, test_config, FailingUpscaler, PngImages, PromptRenamer, ScriptedCategories,
    ScriptedPrompts,
};
use colorbook::book::BookGenerator;
use colorbook::error::BookError;
use colorbook::provider::ResampleUpscaler;
use colorbook::types::Topic;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn cat_prompts() -> ScriptedPrompts {
    ScriptedPrompts::new()
        .with("Sleepy Moments", &["A cat asleep", "A kitten yawning"])
        .with("Playtime", &["A cat chasing yarn", "Two kittens wrestling"])
}

fn cat_categories() -> ScriptedCategories {
    ScriptedCategories::new(&["Sleepy Moments", "Playtime"])
}

#[tokio::test(start_paused = true)]
async fn test_generate_writes_prompts_and_images() {
    let temp = TempDir::new().unwrap();
    let config = test_config(temp.path());
    let images = Arc::new(PngImages::new());
    let generator = BookGenerator::new(
        &config,
        services(
            Arc::new(cat_categories()),
            Arc::new(cat_prompts()),
            images.clone(),
            Arc::new(PromptRenamer),
            Arc::new(ResampleUpscaler::new(2, 1_000_000)),
        ),
        None,
    );
    let topic = Topic::parse("Cats").unwrap();

    let report = generator.generate(&topic).await.unwrap();

    assert_eq!(report.prompts.len(), 4);
    assert_eq!(report.prompts_path, temp.path().join("Cats").join("prompts.csv"));

    let csv = std::fs::read_to_string(&report.prompts_path).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[0], "No.\tPrompt");
    for (index, line) in lines[1..].iter().enumerate() {
        let (number, text) = line.split_once('\t').unwrap();
        assert_eq!(number, (index + 1).to_string());
        assert!(text.starts_with("Cats: "));
        assert!(!text.starts_with("Cats: Cats: "));
    }

    let image_report = report.images.unwrap();
    assert_eq!(image_report.written.len(), 4);
    assert_eq!(image_report.upscaled, 4);
    assert_eq!(std::fs::read_dir(&report.images_dir).unwrap().count(), 4);

    // Images are produced in prompt-file order.
    let expected: Vec<String> = lines[1..]
        .iter()
        .map(|line| line.split_once('\t').unwrap().1.to_string())
        .collect();
    assert_eq!(*images.prompts.lock(), expected);
}

#[tokio::test(start_paused = true)]
async fn test_prompts_command_does_not_generate_images() {
    let temp = TempDir::new().unwrap();
    let config = test_config(temp.path());
    let images = Arc::new(PngImages::new());
    let generator = BookGenerator::new(
        &config,
        services(
            Arc::new(cat_categories()),
            Arc::new(cat_prompts()),
            images.clone(),
            Arc::new(PromptRenamer),
            Arc::new(FailingUpscaler),
        ),
        None,
    );

    let report = generator.prompts(&Topic::parse("Cats").unwrap()).await.unwrap();

    assert!(report.images.is_none());
    assert!(report.prompts_path.exists());
    assert!(report.images_dir.is_dir());
    assert_eq!(images.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_images_command_reads_existing_prompt_file() {
    let temp = TempDir::new().unwrap();
    let book_dir = temp.path().join("Cats");
    std::fs::create_dir_all(&book_dir).unwrap();
    std::fs::write(
        book_dir.join("prompts.csv"),
        "No.\tPrompt\n1\tCats: A cat asleep\n2\tCats: A cat chasing yarn\n",
    )
    .unwrap();

    let config = test_config(temp.path());
    let categories = Arc::new(cat_categories());
    let images = Arc::new(PngImages::new());
    let generator = BookGenerator::new(
        &config,
        services(
            categories.clone(),
            Arc::new(cat_prompts()),
            images.clone(),
            Arc::new(PromptRenamer),
            Arc::new(FailingUpscaler),
        ),
        None,
    );

    let report = generator.images(&Topic::parse("Cats").unwrap()).await.unwrap();

    assert_eq!(categories.calls.load(Ordering::SeqCst), 0);
    assert_eq!(report.prompts.len(), 2);
    let image_report = report.images.unwrap();
    assert_eq!(image_report.upscale_fallbacks, 2);
    assert!(book_dir.join("images").join("A cat asleep.jpeg").exists());
    assert!(book_dir.join("images").join("A cat chasing yarn.jpeg").exists());
    assert_eq!(
        *images.prompts.lock(),
        vec!["Cats: A cat asleep".to_string(), "Cats: A cat chasing yarn".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn test_images_command_without_prompt_file_fails() {
    let temp = TempDir::new().unwrap();
    let config = test_config(temp.path());
    let generator = BookGenerator::new(
        &config,
        services(
            Arc::new(cat_categories()),
            Arc::new(cat_prompts()),
            Arc::new(PngImages::new()),
            Arc::new(PromptRenamer),
            Arc::new(FailingUpscaler),
        ),
        None,
    );

    let result = generator.images(&Topic::parse("Cats").unwrap()).await;
    assert!(matches!(result, Err(BookError::Io { .. })));
}

#[tokio::test(start_paused = true)]
async fn test_rerun_truncates_prompt_file() {
    let temp = TempDir::new().unwrap();
    let config = test_config(temp.path());
    let topic = Topic::parse("Cats").unwrap();
    let book_dir = temp.path().join("Cats");
    std::fs::create_dir_all(&book_dir).unwrap();
    let stale: String = (1..=50).map(|n| format!("{}\tCats: stale {}\n", n, n)).collect();
    std::fs::write(book_dir.join("prompts.csv"), format!("No.\tPrompt\n{}", stale)).unwrap();

    let generator = BookGenerator::new(
        &config,
        services(
            Arc::new(cat_categories()),
            Arc::new(cat_prompts()),
            Arc::new(PngImages::new()),
            Arc::new(PromptRenamer),
            Arc::new(FailingUpscaler),
        ),
        None,
    );
    generator.prompts(&topic).await.unwrap();

    let csv = std::fs::read_to_string(book_dir.join("prompts.csv")).unwrap();
    assert_eq!(csv.lines().count(), 5);
    assert!(!csv.contains("stale"));
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_stops_endless_retries() {
    let temp = TempDir::new().unwrap();
    let config = test_config(temp.path());
    let prompts = Arc::new(ScriptedPrompts::always_failing());
    let token = CancellationToken::new();
    let generator = BookGenerator::new(
        &config,
        services(
            Arc::new(cat_categories()),
            prompts.clone(),
            Arc::new(PngImages::new()),
            Arc::new(PromptRenamer),
            Arc::new(FailingUpscaler),
        ),
        Some(token.clone()),
    );

    let canceller = {
        let token = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(12)).await;
            token.cancel();
        })
    };

    let result = generator.generate(&Topic::parse("Cats").unwrap()).await;
    canceller.await.unwrap();

    assert!(matches!(result, Err(BookError::Cancelled)));
    // Two workers, attempts at 0s, 5s and 10s each.
    assert_eq!(prompts.calls.load(Ordering::SeqCst), 6);
    assert!(!temp.path().join("Cats").join("prompts.csv").exists());
}
