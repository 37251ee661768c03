//! Error types for the learning loop.

/// Top-level error type for autolearn.
#[derive(Debug, thiserror::Error)]
pub enum LearnError {
    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Result store or state file error.
    #[error("store error: {0}")]
    Store(String),

    /// Summarization backend error.
    #[error("summarize error: {0}")]
    Summarize(String),

    /// Scheduler lifecycle error.
    #[error("scheduler error: {0}")]
    Scheduler(String),

    /// HTTP gateway error.
    #[error("gateway error: {0}")]
    Gateway(String),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, LearnError>;
