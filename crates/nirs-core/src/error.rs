//! Error types shared across the NIRS workspace

use thiserror::Error;

/// The recoverable/fatal split follows the response-system's own error
/// taxonomy: `Configuration` is the only variant that should ever abort a
/// run, everything else collapses to "no rule added this step".
#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid rule: {0}")]
    InvalidRule(String),

    #[error("llm endpoint unavailable: {0}")]
    LlmUnavailable(String),

    #[error("evaluation failure: {0}")]
    EvaluationFailure(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
