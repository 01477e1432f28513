// crates/identity-runtime-core/src/document.rs
// ============================================================================
// Module: Identity Runtime Document Store
// Description: Typed load/save of YAML, JSON, JSONL, and markdown documents.
// Purpose: Enforce structural preconditions at every document boundary.
// Dependencies: serde, serde_json, serde_yaml, thiserror
// ============================================================================

//! ## Overview
//! All persisted documents pass through this module. Mapping documents reject
//! non-object roots, JSON writes are pretty-printed with a trailing newline,
//! and append operations write exactly one record or line. Key order inside
//! reports is stable insertion order; no canonicalization is applied because
//! report hashes cover log files, not report documents.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised by document loads and saves.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Reading a document failed.
    #[error("failed to read {path}: {source}")]
    Read {
        /// Path that could not be read.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// Writing a document failed.
    #[error("failed to write {path}: {source}")]
    Write {
        /// Path that could not be written.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// A JSON document failed to parse or serialize.
    #[error("invalid json in {path}: {reason}")]
    Json {
        /// Offending document path.
        path: PathBuf,
        /// Parser or serializer failure description.
        reason: String,
    },
    /// A YAML document failed to parse or serialize.
    #[error("invalid yaml in {path}: {reason}")]
    Yaml {
        /// Offending document path.
        path: PathBuf,
        /// Parser or serializer failure description.
        reason: String,
    },
    /// A mapping document had a non-object root.
    #[error("{kind} root must be a mapping: {path}")]
    NonMappingRoot {
        /// Document kind label (`json` or `yaml`).
        kind: &'static str,
        /// Offending document path.
        path: PathBuf,
    },
}

// ============================================================================
// SECTION: JSON Documents
// ============================================================================

/// Loads a JSON document whose root must be an object.
///
/// # Errors
///
/// Returns [`DocumentError`] on read failure, parse failure, or a
/// non-object root.
pub fn load_json_mapping(path: &Path) -> Result<Map<String, Value>, DocumentError> {
    let text = read_text(path)?;
    let value: Value = serde_json::from_str(&text).map_err(|err| DocumentError::Json {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(DocumentError::NonMappingRoot {
            kind: "json",
            path: path.to_path_buf(),
        }),
    }
}

/// Loads and deserializes a typed JSON document.
///
/// # Errors
///
/// Returns [`DocumentError`] on read or parse failure.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, DocumentError> {
    let text = read_text(path)?;
    serde_json::from_str(&text).map_err(|err| DocumentError::Json {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })
}

/// Writes a JSON document pretty-printed with a trailing newline.
///
/// Parent directories are created as needed. The write lands at a fresh or
/// fully replaced path; partial writes are not a supported state.
///
/// # Errors
///
/// Returns [`DocumentError`] on serialization or write failure.
pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<(), DocumentError> {
    let mut text = serde_json::to_string_pretty(value).map_err(|err| DocumentError::Json {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    text.push('\n');
    write_text(path, &text)
}

// ============================================================================
// SECTION: YAML Documents
// ============================================================================

/// Loads a YAML document whose root must be a mapping, as JSON values.
///
/// # Errors
///
/// Returns [`DocumentError`] on read failure, parse failure, or a
/// non-mapping root.
pub fn load_yaml_mapping(path: &Path) -> Result<Map<String, Value>, DocumentError> {
    let value: Value = load_yaml(path)?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(DocumentError::NonMappingRoot {
            kind: "yaml",
            path: path.to_path_buf(),
        }),
    }
}

/// Loads and deserializes a typed YAML document.
///
/// # Errors
///
/// Returns [`DocumentError`] on read or parse failure.
pub fn load_yaml<T: DeserializeOwned>(path: &Path) -> Result<T, DocumentError> {
    let text = read_text(path)?;
    serde_yaml::from_str(&text).map_err(|err| DocumentError::Yaml {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })
}

/// Writes a YAML document preserving struct field order.
///
/// # Errors
///
/// Returns [`DocumentError`] on serialization or write failure.
pub fn write_yaml<T: Serialize>(path: &Path, value: &T) -> Result<(), DocumentError> {
    let text = serde_yaml::to_string(value).map_err(|err| DocumentError::Yaml {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    write_text(path, &text)
}

// ============================================================================
// SECTION: Append Operations
// ============================================================================

/// Appends one record to a JSON-Lines file (record plus newline).
///
/// The file and parent directories are created on first append. Existing
/// content is never rewritten.
///
/// # Errors
///
/// Returns [`DocumentError`] on serialization or write failure.
pub fn append_jsonl<T: Serialize>(path: &Path, record: &T) -> Result<(), DocumentError> {
    let mut line = serde_json::to_string(record).map_err(|err| DocumentError::Json {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    line.push('\n');
    append_text(path, &line)
}

/// Appends one line to a markdown file.
///
/// # Errors
///
/// Returns [`DocumentError`] on write failure.
pub fn append_markdown_line(path: &Path, line: &str) -> Result<(), DocumentError> {
    append_text(path, &format!("{line}\n"))
}

// ============================================================================
// SECTION: Text Helpers
// ============================================================================

/// Reads a UTF-8 text file.
///
/// # Errors
///
/// Returns [`DocumentError::Read`] on failure.
pub fn read_text(path: &Path) -> Result<String, DocumentError> {
    fs::read_to_string(path).map_err(|source| DocumentError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes a UTF-8 text file, creating parent directories.
///
/// # Errors
///
/// Returns [`DocumentError::Write`] on failure.
pub fn write_text(path: &Path, text: &str) -> Result<(), DocumentError> {
    ensure_parent(path)?;
    fs::write(path, text).map_err(|source| DocumentError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Opens a file in append mode and writes the given text.
fn append_text(path: &Path, text: &str) -> Result<(), DocumentError> {
    ensure_parent(path)?;
    let mut file =
        fs::OpenOptions::new().create(true).append(true).open(path).map_err(|source| {
            DocumentError::Write {
                path: path.to_path_buf(),
                source,
            }
        })?;
    file.write_all(text.as_bytes()).map_err(|source| DocumentError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Creates the parent directory chain for a path.
fn ensure_parent(path: &Path) -> Result<(), DocumentError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| DocumentError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}
