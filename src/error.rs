//! Error types for FormFit
//!
//! Frame analysis itself never fails; these cover loading configuration and
//! catalogs, and delivering speech.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FormError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid exercise catalog: {0}")]
    InvalidCatalog(String),

    #[error("Speech output failed: {0}")]
    Speech(String),

    #[error("Speech queue is closed")]
    QueueClosed,
}

pub type Result<T> = std::result::Result<T, FormError>;
