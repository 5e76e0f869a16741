//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::BookError;

/// Map domain errors to a string for CLI output.
pub fn map_error(e: &BookError) -> String {
    match e {
        BookError::Cancelled => "Interrupted; artifacts written so far are kept.".to_string(),
        other => other.to_string(),
    }
}

/// Process exit code for an error. 130 mirrors the shell convention for SIGINT.
pub fn exit_code(e: &BookError) -> i32 {
    match e {
        BookError::Cancelled => 130,
        _ => 1,
    }
}
