use http::header::{HeaderName, HeaderValue};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

/// Per-server settings, built once at startup and read-only afterwards.
pub struct ServerConfig {
    pub root: PathBuf,
    /// Served when a directory is requested; empty string disables the rewrite.
    pub default_document: String,
    pub listing: bool,
    /// Substitute target for misses; ignored if it doesn't exist on disk.
    pub not_found: Option<PathBuf>,
    /// Applied to non-404 responses only.
    pub headers: Vec<(HeaderName, HeaderValue)>,
}

pub type MimeOverrides = HashMap<String, String>;

#[derive(Debug, Error)]
pub enum OverrideError {
    #[error("failed to read override file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid override JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Inline JSON object, or `@path` to read the object from a file.
pub fn parse_mime_overrides(arg: &str) -> Result<MimeOverrides, OverrideError> {
    let text = match arg.strip_prefix('@') {
        Some(path) => fs::read_to_string(path)?,
        None => arg.to_string(),
    };
    Ok(serde_json::from_str(&text)?)
}
