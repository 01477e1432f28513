// crates/identity-runtime-core/src/hashing.rs
// ============================================================================
// Module: Identity Runtime Hashing
// Description: SHA-256 content hashing for logs, pack files, and trees.
// Purpose: Provide deterministic digests for evidence integrity checks.
// Dependencies: sha2, walkdir, thiserror
// ============================================================================

//! ## Overview
//! All evidence integrity in the identity runtime rests on SHA-256 over raw
//! bytes: check log files are hashed into execution reports, and whole pack
//! trees are reduced to content signatures for install conflict
//! classification. Digests are bare lowercase hex.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while hashing files or directory trees.
#[derive(Debug, Error)]
pub enum HashError {
    /// Reading a file failed.
    #[error("failed to read {path} for hashing: {source}")]
    Read {
        /// Path that could not be read.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// Walking a directory tree failed.
    #[error("failed to walk {path} for signature: {source}")]
    Walk {
        /// Root that could not be walked.
        path: PathBuf,
        /// Underlying walk failure.
        source: walkdir::Error,
    },
}

// ============================================================================
// SECTION: Digest Type
// ============================================================================

/// Bare lowercase-hex SHA-256 digest.
///
/// # Invariants
/// - Always 64 lowercase hex characters when produced by this module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sha256Hex(String);

impl Sha256Hex {
    /// Wraps an externally declared digest string without validation.
    #[must_use]
    pub fn declared(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the digest as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sha256Hex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SECTION: Hashing Helpers
// ============================================================================

/// Hashes raw bytes.
#[must_use]
pub fn hash_bytes(bytes: &[u8]) -> Sha256Hex {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    Sha256Hex(hex_encode(&hasher.finalize()))
}

/// Hashes the full byte contents of a file.
///
/// # Errors
///
/// Returns [`HashError::Read`] when the file cannot be read.
pub fn hash_file(path: &Path) -> Result<Sha256Hex, HashError> {
    let bytes = fs::read(path).map_err(|source| HashError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(hash_bytes(&bytes))
}

// ============================================================================
// SECTION: Content Signatures
// ============================================================================

/// Computes the content signature of a directory tree.
///
/// The signature is `SHA256(sorted_lines)` where each line is
/// `"<relpath>:<sha256(file bytes)>"`, lines joined with `\n` and relative
/// paths rendered with forward slashes. Equal signatures imply byte-identical
/// trees. Returns `None` when `root` is not a directory.
///
/// # Errors
///
/// Returns [`HashError`] when the tree cannot be walked or a file read.
pub fn directory_signature(root: &Path) -> Result<Option<Sha256Hex>, HashError> {
    if !root.is_dir() {
        return Ok(None);
    }

    let mut rows: Vec<String> = Vec::new();
    for entry in walkdir::WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|source| HashError::Walk {
            path: root.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let digest = hash_file(entry.path())?;
        rows.push(format!("{}:{digest}", posix_path(rel)));
    }
    rows.sort();

    Ok(Some(hash_bytes(rows.join("\n").as_bytes())))
}

/// Renders a relative path with forward slashes.
fn posix_path(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

// ============================================================================
// SECTION: Hex Encoding
// ============================================================================

/// Encodes bytes as a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}
