// crates/identity-runtime-validate/src/git.rs
// ============================================================================
// Module: Git Range Helpers
// Description: Git range resolution and diff-name listing via subprocess.
// Purpose: Give range-scoped validators and the CI gate one git seam.
// Dependencies: std::process, thiserror
// ============================================================================

//! ## Overview
//! The changelog validator and the CI enforcement gate observe file changes
//! through `git diff --name-only`. This is the only place the engine spawns
//! git; everything else is in-process. Range resolution falls back to
//! `HEAD~1..HEAD` for local usage.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::process::Command;

use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised by git subprocess calls.
#[derive(Debug, Error)]
pub enum GitError {
    /// Spawning git failed.
    #[error("failed to spawn git: {0}")]
    Spawn(std::io::Error),
    /// Git returned a non-zero exit code.
    #[error("git {command} failed: {stderr}")]
    Command {
        /// Rendered git arguments.
        command: String,
        /// Captured stderr.
        stderr: String,
    },
}

// ============================================================================
// SECTION: Git Operations
// ============================================================================

/// Runs a git command under `root` and returns trimmed stdout.
///
/// # Errors
///
/// Returns [`GitError`] on spawn failure or non-zero exit.
pub fn run_git(root: &Path, args: &[&str]) -> Result<String, GitError> {
    let output =
        Command::new("git").args(args).current_dir(root).output().map_err(GitError::Spawn)?;
    if !output.status.success() {
        return Err(GitError::Command {
            command: args.join(" "),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Resolves a `(base, head)` range, falling back to `HEAD~1..HEAD`.
///
/// # Errors
///
/// Returns [`GitError`] when fallback resolution fails.
pub fn resolve_range(
    root: &Path,
    base: Option<&str>,
    head: Option<&str>,
) -> Result<(String, String), GitError> {
    let resolved_head = match head {
        Some(value) if !value.trim().is_empty() => value.trim().to_string(),
        _ => run_git(root, &["rev-parse", "HEAD"])?,
    };
    let resolved_base = match base {
        Some(value) if !value.trim().is_empty() => value.trim().to_string(),
        _ => run_git(root, &["rev-parse", "HEAD~1"])?,
    };
    Ok((resolved_base, resolved_head))
}

/// Returns the changed file paths in `base..head`.
///
/// # Errors
///
/// Returns [`GitError`] when the diff fails.
pub fn changed_files(root: &Path, base: &str, head: &str) -> Result<Vec<String>, GitError> {
    let range = format!("{base}..{head}");
    let output = run_git(root, &["diff", "--name-only", &range])?;
    Ok(output.lines().map(str::trim).filter(|line| !line.is_empty()).map(String::from).collect())
}
