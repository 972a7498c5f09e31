// ABOUTME: Error types for the fastslides core
// ABOUTME: Provides structured error handling for each stage of the preview pipeline

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeckError {
    #[error("Failed to read file: {0}")]
    FileReadError(#[from] std::io::Error),

    #[error("Path not found: {0}")]
    PathNotFoundError(PathBuf),

    #[error("Invalid project path: {0}")]
    InvalidProjectPath(String),

    #[error("Deck compile error: {0}")]
    CompileError(String),

    #[error("Input validation error: {0}")]
    ValidationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Agent hook error: {0}")]
    HookError(String),

    #[error("Unknown error: {0}")]
    UnknownError(String),
}

// Implement conversion from anyhow::Error to our DeckError
impl From<anyhow::Error> for DeckError {
    fn from(err: anyhow::Error) -> Self {
        DeckError::UnknownError(err.to_string())
    }
}

impl From<serde_json::Error> for DeckError {
    fn from(err: serde_json::Error) -> Self {
        DeckError::ConfigError(format!("JSON error: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, DeckError>;
