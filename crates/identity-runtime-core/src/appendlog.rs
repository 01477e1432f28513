// crates/identity-runtime-core/src/appendlog.rs
// ============================================================================
// Module: Identity Runtime Append-Only Logs
// Description: File-backed append-only log primitives.
// Purpose: Make rulebook and history growth monotone by construction.
// Dependencies: crate::document, serde, thiserror
// ============================================================================

//! ## Overview
//! The rulebook and history ledger grow strictly monotonically: the only
//! operation these wrappers expose is `append`. No read-modify-write path
//! exists anywhere in the engine; consumers that need to read logs open them
//! through the document store directly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::document;
use crate::document::DocumentError;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised by append operations.
#[derive(Debug, Error)]
pub enum AppendLogError {
    /// The underlying document write failed.
    #[error(transparent)]
    Document(#[from] DocumentError),
}

// ============================================================================
// SECTION: JSONL Log
// ============================================================================

/// Append-only JSON-Lines log.
#[derive(Debug, Clone)]
pub struct JsonlLog {
    /// Log file path.
    path: PathBuf,
}

impl JsonlLog {
    /// Wraps a JSONL log path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
        }
    }

    /// Returns the log path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one record (record plus newline).
    ///
    /// # Errors
    ///
    /// Returns [`AppendLogError`] on serialization or write failure.
    pub fn append<T: Serialize>(&self, record: &T) -> Result<(), AppendLogError> {
        Ok(document::append_jsonl(&self.path, record)?)
    }
}

// ============================================================================
// SECTION: History Log
// ============================================================================

/// Append-only markdown history ledger.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    /// Ledger file path.
    path: PathBuf,
}

impl HistoryLog {
    /// Wraps a history ledger path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
        }
    }

    /// Returns the ledger path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one stamped bullet entry as a single trailing line.
    ///
    /// # Errors
    ///
    /// Returns [`AppendLogError`] on write failure.
    pub fn append_entry(&self, text: &str) -> Result<(), AppendLogError> {
        Ok(document::append_markdown_line(&self.path, &format!("- {text}"))?)
    }
}
