// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error ({status}): {detail}")]
    ApiError { status: u16, detail: String },

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Selector error: {0}")]
    SelectorError(#[from] SelectorError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Reasons a selector expression cannot be resolved.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectorError {
    #[error("selector is empty")]
    Empty,

    #[error("malformed selector: {0}")]
    Malformed(String),

    #[error("no node named '{0}'")]
    UnknownNode(String),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ConsoleError>;
