//! CLI support for sift-lang
//!
//! Provides programmatic access to the `sift` CLI functionality for
//! embedding in other tools.

mod check;

pub use check::{execute_check, CheckOptions, CheckResult};

use std::io;
use thiserror::Error;

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    /// Compilation error from any pipeline stage
    #[error("Compile error: {0}")]
    Compile(#[from] crate::CompileError),

    /// Execution error
    #[error("Evaluation error: {0}")]
    Eval(#[from] crate::EvalError),

    /// JSON parsing error
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// No input provided
    #[error("No input provided. Use --input or pipe JSON to stdin.")]
    NoInput,

    /// Input records must be JSON objects
    #[error("Input must be a JSON object or an array of objects.")]
    InvalidInput,
}
