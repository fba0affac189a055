//! Loads the `key=value` run configuration.
//!
//! Grounded on `main`'s `strtok`-based option parsing in the original
//! reference implementation, which reads a small fixed set of keys off a
//! config file rather than flags: the file name, the XPath to evaluate,
//! a sequential/parallel mode switch, and a thread count. Lines starting
//! with `#`, and blank lines, are ignored; unknown keys are logged and
//! skipped rather than treated as errors, so a config written for a newer
//! version of this tool still loads.

use crate::error::ConfigError;
use anyhow::Context;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Sequential,
    Parallel { threads: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub file_name: PathBuf,
    pub xpath: String,
    pub mode: Mode,
}

pub fn parse(text: &str) -> Result<RunConfig, ConfigError> {
    let mut file_name: Option<PathBuf> = None;
    let mut xpath: Option<String> = None;
    let mut version: Option<u32> = None;
    let mut threads: Option<usize> = None;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            tracing::warn!(%line, "config line has no '=', ignoring");
            continue;
        };
        let key = key.trim();
        let value = value.trim();

        match key {
            "File_Name" => file_name = Some(PathBuf::from(value)),
            "XPath" => xpath = Some(value.to_string()),
            "version(0--sequential, 1--parallel)" => {
                version = Some(value.parse().map_err(|_| ConfigError::Invalid {
                    key: "version(0--sequential, 1--parallel)",
                    reason: format!("`{value}` is not 0 or 1"),
                })?);
            }
            "number-of-threads(no less than 1 and no more than 10)" => {
                threads = Some(value.parse().map_err(|_| ConfigError::Invalid {
                    key: "number-of-threads(no less than 1 and no more than 10)",
                    reason: format!("`{value}` is not an integer"),
                })?);
            }
            other => tracing::warn!(key = other, "unrecognized config key, ignoring"),
        }
    }

    let file_name = file_name.ok_or(ConfigError::Missing("File_Name"))?;
    let xpath = xpath.ok_or(ConfigError::Missing("XPath"))?;
    let version = version.ok_or(ConfigError::Missing("version(0--sequential, 1--parallel)"))?;

    let mode = match version {
        0 => Mode::Sequential,
        1 => {
            let threads = threads
                .ok_or(ConfigError::Missing("number-of-threads(no less than 1 and no more than 10)"))?;
            if !(1..=10).contains(&threads) {
                return Err(ConfigError::Invalid {
                    key: "number-of-threads(no less than 1 and no more than 10)",
                    reason: format!("{threads} is outside 1..=10"),
                });
            }
            Mode::Parallel { threads }
        }
        other => {
            return Err(ConfigError::Invalid {
                key: "version(0--sequential, 1--parallel)",
                reason: format!("{other} is not 0 or 1"),
            })
        }
    };

    Ok(RunConfig { file_name, xpath, mode })
}

/// Read and parse the config file at `path`. I/O failures are wrapped with
/// `anyhow::Context` rather than folded into `ConfigError`, which is
/// reserved for problems with the config's *content*.
pub fn load(path: &Path) -> anyhow::Result<RunConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    parse(&text).with_context(|| format!("parsing config file {}", path.display()))
}
