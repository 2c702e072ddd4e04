use thiserror::Error;

#[derive(Debug, Error)]
pub enum XrefError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Browser session error: {0}")]
    Session(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Security error: {0}")]
    SecurityError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, XrefError>;
