//! Error types for LinkPeek.
//!
//! Gesture handling never produces these: a gesture that cannot be resolved
//! is simply dropped. Errors only come out of configuration, settings, and
//! trace loading.

use std::io;

/// Errors produced by LinkPeek.
#[derive(Debug, thiserror::Error)]
pub enum PeekError {
    #[error("settings error: {0}")]
    Settings(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("DOM error: {0}")]
    Dom(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, PeekError>;
