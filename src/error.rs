//! Error types shared across the config loader, compiler, and engine.
//!
//! Library-level errors are `thiserror` enums, one per fallible boundary,
//! matching the teacher crate's convention; the binary wraps them in
//! `anyhow::Context` at the top level.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required key `{0}` in config file")]
    Missing(&'static str),
    #[error("invalid value for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("could not read `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed XML at byte {position}: {message}")]
    MalformedXml { message: String, position: usize },
}
