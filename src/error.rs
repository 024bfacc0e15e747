//! Error types for satforge

use thiserror::Error;
use std::io;

/// Top-level errors. Unification failure is deliberately absent: it is an
/// expected, rule-local condition (`unify::UnificationError`) and never
/// crosses a rule boundary.
#[derive(Error, Debug)]
pub enum ProverError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Type error: {0}")]
    Type(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported input construct: {0}")]
    Unsupported(String),

    #[error("Internal invariant violation: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, ProverError>;
