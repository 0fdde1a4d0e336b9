//! Spec document loading from various sources.
//!
//! Accepts JSON or YAML text, raw bytes, files, and (with the `remote`
//! feature) HTTP URLs. Everything funnels into the same generic tree shape
//! so the rest of the engine never knows which syntax the input used.

use std::path::Path;

use serde_json::Value;

use crate::error::LoadError;

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Interpret an already-parsed value as a spec document.
///
/// A map is returned verbatim; anything else is not a document.
pub fn load_spec_value(value: Value) -> Option<Value> {
    if value.is_object() {
        Some(value)
    } else {
        None
    }
}

/// Parse text as a spec document.
///
/// Text whose first non-whitespace character is `{` or `[` is tried as
/// JSON first; if that fails it falls through to YAML, so JSON embedded in
/// YAML-ish surroundings still parses. Empty input, unparseable input, and
/// parsed non-map values all yield `Ok(None)`.
///
/// # Errors
///
/// Returns `LoadError::YamlUnavailable` when the input needs the YAML
/// parser and the `yaml` feature is disabled.
pub fn load_spec_str(text: &str) -> Result<Option<Value>, LoadError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
            return Ok(load_spec_value(value));
        }
        // Not valid JSON after all; let the YAML parser have a go.
    }

    parse_yaml(trimmed)
}

/// Parse raw bytes as a spec document.
///
/// Bytes are decoded as UTF-8; undecodable input is not a document.
pub fn load_spec_bytes(bytes: &[u8]) -> Result<Option<Value>, LoadError> {
    match std::str::from_utf8(bytes) {
        Ok(text) => load_spec_str(text),
        Err(_) => Ok(None),
    }
}

#[cfg(feature = "yaml")]
fn parse_yaml(text: &str) -> Result<Option<Value>, LoadError> {
    match serde_yaml::from_str::<Value>(text) {
        Ok(value) => Ok(load_spec_value(value)),
        Err(_) => Ok(None),
    }
}

#[cfg(not(feature = "yaml"))]
fn parse_yaml(_text: &str) -> Result<Option<Value>, LoadError> {
    Err(LoadError::YamlUnavailable)
}

/// Load a spec document from a file path.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if the file doesn't exist, or
/// `LoadError::ReadError` if it can't be read.
pub fn load_spec_file(path: &Path) -> Result<Option<Value>, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| LoadError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    load_spec_str(&content)
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Load a spec document from an HTTP/HTTPS URL.
///
/// Requires the `remote` feature.
///
/// # Errors
///
/// Returns `LoadError::NetworkError` if the request fails.
#[cfg(feature = "remote")]
pub fn load_spec_url(url: &str) -> Result<Option<Value>, LoadError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|source| LoadError::NetworkError {
            url: url.to_string(),
            source,
        })?;

    let response = client
        .get(url)
        .send()
        .and_then(reqwest::blocking::Response::error_for_status)
        .map_err(|source| LoadError::NetworkError {
            url: url.to_string(),
            source,
        })?;

    let text = response.text().map_err(|source| LoadError::NetworkError {
        url: url.to_string(),
        source,
    })?;

    load_spec_str(&text)
}

/// Load a spec document from a file path or URL.
///
/// Automatically detects whether the source is a URL or file path.
/// URL loading requires the `remote` feature.
pub fn load_spec_auto(source: &str) -> Result<Option<Value>, LoadError> {
    if is_url(source) {
        #[cfg(feature = "remote")]
        {
            load_spec_url(source)
        }
        #[cfg(not(feature = "remote"))]
        {
            Err(LoadError::FileNotFound {
                path: std::path::PathBuf::from(source),
            })
        }
    } else {
        load_spec_file(Path::new(source))
    }
}
