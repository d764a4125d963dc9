//! Error types for the dispatcher.

use thiserror::Error;

/// Main error type for dispatcher operations.
///
/// Deliberately small: unmatched messages, double completions, and unknown
/// unsubscribes are silent no-ops, not errors. Only configuration mistakes
/// and pull-source failures surface here, and neither is fatal.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Pull source error: {0}")]
    Pull(String),
}

/// Result type for dispatcher operations.
pub type Result<T> = std::result::Result<T, DispatchError>;
