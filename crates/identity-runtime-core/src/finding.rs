// crates/identity-runtime-core/src/finding.rs
// ============================================================================
// Module: Identity Runtime Findings
// Description: Accumulated validation findings with a stable taxonomy.
// Purpose: Carry structural, policy, and evidence failures without panics.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Validators and the contract model report failures as findings, never as
//! exceptions: every component call returns the complete list of problems it
//! observed. Each finding carries a stable identifier (`<contract>.<field>`
//! or `<file>#<recordIndex>`) so CI output is diffable across runs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Taxonomy
// ============================================================================

/// Failure taxonomy shared by all engine components.
///
/// # Invariants
/// - Variants are stable for serialization and report diffing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// Structural violation of a document (missing keys, wrong types).
    Schema,
    /// A declared file or pattern does not resolve, or escapes its scope.
    Reference,
    /// A gate/contract pairing or allowlist/denylist rule is violated.
    Policy,
    /// Required evidence is missing, malformed, stale, or unsigned.
    Evidence,
    /// A metrics threshold was crossed.
    MetricsThreshold,
    /// A validator returned a non-zero exit code.
    Subprocess,
    /// Filesystem or git failure.
    Io,
}

// ============================================================================
// SECTION: Finding
// ============================================================================

/// One validation failure with a stable identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Failure taxonomy class.
    pub kind: FindingKind,
    /// Stable identifier, `<contract>.<field>` or `<file>#<recordIndex>`.
    pub id: String,
    /// Human-readable failure description.
    pub message: String,
}

impl Finding {
    /// Creates a new finding.
    #[must_use]
    pub fn new(kind: FindingKind, id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            message: message.into(),
        }
    }

    /// Creates a schema finding.
    #[must_use]
    pub fn schema(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(FindingKind::Schema, id, message)
    }

    /// Creates a reference finding.
    #[must_use]
    pub fn reference(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(FindingKind::Reference, id, message)
    }

    /// Creates a policy finding.
    #[must_use]
    pub fn policy(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(FindingKind::Policy, id, message)
    }

    /// Creates an evidence finding.
    #[must_use]
    pub fn evidence(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(FindingKind::Evidence, id, message)
    }

    /// Renders the `[FAIL]`-prefixed report line for this finding.
    #[must_use]
    pub fn fail_line(&self) -> String {
        format!("[FAIL] {}", self.message)
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.id, self.message)
    }
}

// ============================================================================
// SECTION: Finding Log
// ============================================================================

/// Accumulator pairing findings with line-oriented report output.
///
/// # Invariants
/// - Every failure line has a matching [`Finding`]; `[OK]`/`[INFO]`/`[WARN]`
///   lines are informational only.
/// - Accumulation never short-circuits; callers read the full list.
#[derive(Debug, Clone, Default)]
pub struct FindingLog {
    /// Report lines in emission order.
    lines: Vec<String>,
    /// Accumulated failures.
    findings: Vec<Finding>,
}

impl FindingLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a passing check line.
    pub fn ok(&mut self, message: impl Into<String>) {
        self.lines.push(format!("[OK] {}", message.into()));
    }

    /// Records an informational line.
    pub fn info(&mut self, message: impl Into<String>) {
        self.lines.push(format!("[INFO] {}", message.into()));
    }

    /// Records a warning line.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.lines.push(format!("[WARN] {}", message.into()));
    }

    /// Records a failure as both a line and a finding.
    pub fn fail(&mut self, kind: FindingKind, id: impl Into<String>, message: impl Into<String>) {
        let finding = Finding::new(kind, id, message);
        self.lines.push(finding.fail_line());
        self.findings.push(finding);
    }

    /// Records a bare line without classification.
    pub fn line(&mut self, message: impl Into<String>) {
        self.lines.push(message.into());
    }

    /// Absorbs another log, preserving order.
    pub fn merge(&mut self, other: Self) {
        self.lines.extend(other.lines);
        self.findings.extend(other.findings);
    }

    /// Returns `true` when no failures were recorded.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.findings.is_empty()
    }

    /// Returns the report lines.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Returns the accumulated findings.
    #[must_use]
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// Consumes the log into `(lines, findings)`.
    #[must_use]
    pub fn into_parts(self) -> (Vec<String>, Vec<Finding>) {
        (self.lines, self.findings)
    }
}
