//! Integration tests for coloring-book generation

mod book_run;
pub mod support;
