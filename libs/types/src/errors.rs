//! Error types for value parsing

use thiserror::Error;

/// Identifier parsing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("Invalid hex encoding: {0}")]
    InvalidHex(String),

    #[error("Invalid identifier length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}
