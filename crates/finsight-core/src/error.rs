//! Error types for Finsight

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Prompt frontmatter error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// User input rejected before anything is persisted
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A collection was written by someone else since it was loaded
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Persisted blob could not be read back
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("AI service error: {0}")]
    Ai(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, Error>;
