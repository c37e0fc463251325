//! Error types for the HelloGrain kind.

use thiserror::Error;

/// Errors a `HelloGrain` handler can report. Callers only see the `Display` text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HelloGrainError {
    /// The request carried no name to greet.
    #[error("HelloGrain validation error: name must not be empty")]
    EmptyName,

    /// The greeting counter can't go any higher.
    #[error("HelloGrain has greeted too many times")]
    Exhausted,
}
