//! Prompt generation: category fan-out and the shared accumulator it fills.

pub mod accumulator;
pub mod fanout;

pub use accumulator::PromptAccumulator;
pub use fanout::{GenerationConfig, PromptFanOutCoordinator};
