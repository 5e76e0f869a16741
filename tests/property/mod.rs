//! Property-based tests for prompt numbering

mod numbering;
