// crates/identity-runtime-validate/src/orchestrator.rs
// ============================================================================
// Module: Validator Orchestrator
// Description: Ordered validator execution with hashed log capture.
// Purpose: Turn verdicts into durable, SHA-256-signed check evidence.
// Dependencies: crate::{context, registry, verdict}, identity-runtime-core
// ============================================================================

//! ## Overview
//! The orchestrator runs a configured validator set in declared order. Each
//! verdict is captured into a per-identity log file (header block, then
//! `[stdout]` and `[stderr]` sections), the log is hashed with SHA-256, and a
//! check result records both. Artifacts land on disk before the result that
//! references them is returned.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;

use identity_runtime_core::Timestamp;
use identity_runtime_core::document;
use identity_runtime_core::hashing;
use thiserror::Error;

use crate::context::ValidatorContext;
use crate::registry;
use crate::verdict::CheckResult;
use crate::verdict::Verdict;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum characters retained in stdout/stderr tails.
const TAIL_CHARS: usize = 4000;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while capturing check evidence.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// An unknown validator name was requested.
    #[error("unknown validator: {0}")]
    UnknownValidator(String),
    /// An unknown validator set label was requested.
    #[error("unknown validator set label: {0}")]
    UnknownSet(String),
    /// Writing a check log failed.
    #[error(transparent)]
    Document(#[from] identity_runtime_core::DocumentError),
    /// Hashing a check log failed.
    #[error(transparent)]
    Hash(#[from] identity_runtime_core::HashError),
}

// ============================================================================
// SECTION: Set Execution
// ============================================================================

/// Runs a validator set by label, capturing logs under `logs_dir`.
///
/// # Errors
///
/// Returns [`OrchestratorError`] on unknown labels or capture failures.
pub fn run_set(
    ctx: &ValidatorContext,
    label: &str,
    logs_dir: &Path,
    run_id: &str,
) -> Result<Vec<CheckResult>, OrchestratorError> {
    let names =
        registry::set_by_label(label).ok_or_else(|| OrchestratorError::UnknownSet(label.into()))?;
    run_checks(ctx, names, logs_dir, run_id)
}

/// Runs named validators in declared order, capturing logs under `logs_dir`.
///
/// Log files are named `<run_id>-check-NN.log` with a 1-based two-digit
/// index. Every log is written and hashed before its check result exists.
///
/// # Errors
///
/// Returns [`OrchestratorError`] on unknown names or capture failures.
pub fn run_checks(
    ctx: &ValidatorContext,
    names: &[&str],
    logs_dir: &Path,
    run_id: &str,
) -> Result<Vec<CheckResult>, OrchestratorError> {
    let mut results = Vec::with_capacity(names.len());
    for (index, name) in names.iter().enumerate() {
        let def = registry::validator_by_name(name)
            .ok_or_else(|| OrchestratorError::UnknownValidator((*name).to_string()))?;
        let command = registry::command_for(def, ctx);
        let log_name = format!("{run_id}-check-{:02}.log", index + 1);
        let log_path = logs_dir.join(&log_name);

        let started_at = Timestamp::now_utc();
        let verdict = (def.run)(ctx);
        let ended_at = Timestamp::now_utc();

        results.push(capture(ctx, &verdict, &command, started_at, ended_at, &log_path)?);
    }
    Ok(results)
}

/// Runs one named validator without log capture.
///
/// # Errors
///
/// Returns [`OrchestratorError::UnknownValidator`] on unknown names.
pub fn run_one(ctx: &ValidatorContext, name: &str) -> Result<Verdict, OrchestratorError> {
    let def = registry::validator_by_name(name)
        .ok_or_else(|| OrchestratorError::UnknownValidator(name.to_string()))?;
    Ok((def.run)(ctx))
}

// ============================================================================
// SECTION: Capture
// ============================================================================

/// Writes a verdict's log file and builds its check result.
fn capture(
    ctx: &ValidatorContext,
    verdict: &Verdict,
    command: &str,
    started_at: Timestamp,
    ended_at: Timestamp,
    log_path: &Path,
) -> Result<CheckResult, OrchestratorError> {
    let stdout = verdict.lines.join("\n");
    let mut content = String::new();
    content.push_str(&format!("$ {command}\n"));
    content.push_str(&format!("exit_code: {}\n", verdict.exit_code()));
    content.push_str(&format!("started_at: {started_at}\n"));
    content.push_str(&format!("ended_at: {ended_at}\n"));
    content.push_str("[stdout]\n");
    content.push_str(&stdout);
    if !stdout.is_empty() {
        content.push('\n');
    }
    content.push_str("[stderr]\n");

    document::write_text(log_path, &content)?;
    let log_sha256 = hashing::hash_file(log_path)?;

    Ok(CheckResult {
        ok: verdict.ok,
        command: command.to_string(),
        started_at,
        ended_at,
        exit_code: verdict.exit_code(),
        stdout_tail: tail(&stdout),
        stderr_tail: String::new(),
        log_path: relative_display(ctx.layout.root(), log_path),
        log_sha256,
    })
}

/// Returns the trailing characters of captured output.
fn tail(text: &str) -> String {
    if text.chars().count() <= TAIL_CHARS {
        return text.to_string();
    }
    text.chars().skip(text.chars().count().saturating_sub(TAIL_CHARS)).collect()
}

/// Renders a path relative to the runtime root with forward slashes.
fn relative_display(root: &Path, path: &Path) -> String {
    let rel: PathBuf = path.strip_prefix(root).map_or_else(|_| path.to_path_buf(), Path::to_path_buf);
    rel.components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
