//! CLI route: run context and command dispatch. Builds the runtime and service handles.

use crate::book::BookGenerator;
use crate::cli::parse::Commands;
use crate::cli::presentation::format_run_report;
use crate::config::{BookConfig, ConfigLoader};
use crate::error::BookError;
use crate::provider::ServiceSet;
use crate::types::Topic;
use dialoguer::Input;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Runtime context for CLI execution: workspace and resolved configuration.
pub struct RunContext {
    workspace_root: PathBuf,
    config: BookConfig,
}

impl RunContext {
    /// Load configuration from the workspace, or from `config_path` when given.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, BookError> {
        let config = match config_path {
            Some(ref path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        Ok(Self {
            workspace_root,
            config,
        })
    }

    /// Apply CLI flags that override configuration.
    pub fn with_overrides(mut self, books_root: Option<PathBuf>, no_upscale: bool) -> Self {
        if let Some(root) = books_root {
            self.config.books_root = root;
        }
        if no_upscale {
            self.config.upscale.enabled = false;
        }
        self
    }

    pub fn config(&self) -> &BookConfig {
        &self.config
    }

    /// Books root resolved against the workspace when relative.
    fn resolved_config(&self) -> BookConfig {
        let mut config = self.config.clone();
        if config.books_root.is_relative() {
            config.books_root = self.workspace_root.join(&config.books_root);
        }
        config
    }

    /// Execute a command and return its presentation text.
    pub fn execute(&self, command: &Commands) -> Result<String, BookError> {
        let config = self.resolved_config().validated()?;
        let topic = resolve_topic(command.topic())?;
        let services = ServiceSet::from_config(&config.providers, &config.upscale)?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| BookError::ServiceSetup(format!("Failed to start runtime: {}", e)))?;

        let report = runtime.block_on(async {
            let cancel = CancellationToken::new();
            spawn_interrupt_listener(cancel.clone());
            let generator = BookGenerator::new(&config, services, Some(cancel.clone()));

            info!(topic = %topic, books_root = %config.books_root.display(), "Starting run");
            let run = async {
                match command {
                    Commands::Generate { .. } => generator.generate(&topic).await,
                    Commands::Prompts { .. } => generator.prompts(&topic).await,
                    Commands::Images { .. } => generator.images(&topic).await,
                }
            };
            tokio::select! {
                result = run => result,
                _ = cancel.cancelled() => Err(BookError::Cancelled),
            }
        })?;

        Ok(format_run_report(&report))
    }
}

/// Cancel `token` on the first Ctrl-C.
fn spawn_interrupt_listener(token: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("Interrupt received, stopping after the current step");
                token.cancel();
            }
            Err(e) => warn!(error = %e, "Unable to listen for interrupts"),
        }
    });
}

/// Use the argument, or ask the operator.
fn resolve_topic(argument: Option<&str>) -> Result<Topic, BookError> {
    match argument {
        Some(raw) => Topic::parse(raw),
        None => {
            let raw: String = Input::new()
                .with_prompt("Please enter the topic name")
                .interact_text()
                .map_err(|e| BookError::InvalidTopic(format!("failed to read topic: {}", e)))?;
            Topic::parse(&raw)
        }
    }
}
