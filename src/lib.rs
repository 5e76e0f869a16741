//! Colorbook: coloring-book prompt and illustration generation
//!
//! A topic fans out into categories, each category into prompts, and every prompt
//! into a named line-art image. Prompts land in `<books_root>/<topic>/prompts.csv`
//! and images in `<books_root>/<topic>/images/`.

pub mod book;
pub mod cli;
pub mod config;
pub mod error;
pub mod generation;
pub mod layout;
pub mod logging;
pub mod persistence;
pub mod pipeline;
pub mod provider;
pub mod retry;
pub mod types;
