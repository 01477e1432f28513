// crates/identity-runtime-validate/src/verdict.rs
// ============================================================================
// Module: Validator Verdicts
// Description: Per-validator verdicts and hashed check results.
// Purpose: Carry validator outcomes into reports and CI evidence.
// Dependencies: identity-runtime-core, serde
// ============================================================================

//! ## Overview
//! A verdict is the in-process outcome of one validator run: ordered report
//! lines plus accumulated findings. A check result is the persisted shape the
//! orchestrator emits after capturing the verdict into a hashed log file.

// ============================================================================
// SECTION: Imports
// ============================================================================

use identity_runtime_core::Finding;
use identity_runtime_core::FindingLog;
use identity_runtime_core::Sha256Hex;
use identity_runtime_core::Timestamp;
use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Verdict
// ============================================================================

/// Outcome of one in-process validator run.
#[derive(Debug, Clone)]
pub struct Verdict {
    /// Validator name.
    pub name: String,
    /// `true` when no findings were accumulated.
    pub ok: bool,
    /// Report lines in emission order.
    pub lines: Vec<String>,
    /// Accumulated findings.
    pub findings: Vec<Finding>,
}

impl Verdict {
    /// Builds a verdict from a finding log.
    #[must_use]
    pub fn from_log(name: impl Into<String>, log: FindingLog) -> Self {
        let ok = log.is_ok();
        let (lines, findings) = log.into_parts();
        Self {
            name: name.into(),
            ok,
            lines,
            findings,
        }
    }

    /// Returns the validator exit code (`0` pass, `1` fail).
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        if self.ok { 0 } else { 1 }
    }
}

// ============================================================================
// SECTION: Check Result
// ============================================================================

/// Persisted record of one captured check.
///
/// # Invariants
/// - `log_sha256` is the digest of the full byte contents of `log_path`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    /// `true` when the check passed.
    pub ok: bool,
    /// Rendered command line for the check.
    pub command: String,
    /// Check start stamp.
    pub started_at: Timestamp,
    /// Check end stamp.
    pub ended_at: Timestamp,
    /// Validator exit code.
    pub exit_code: i32,
    /// Trailing portion of captured stdout.
    pub stdout_tail: String,
    /// Trailing portion of captured stderr.
    pub stderr_tail: String,
    /// Root-relative path of the captured log file.
    pub log_path: String,
    /// SHA-256 of the log file bytes.
    pub log_sha256: Sha256Hex,
}
