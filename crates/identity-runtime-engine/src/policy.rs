// crates/identity-runtime-engine/src/policy.rs
// ============================================================================
// Module: Safe-Auto Patch Surface Policy
// Description: Glob allowlist/denylist over mutation paths.
// Purpose: Fail closed before safe-auto mutates anything.
// Dependencies: globset, serde
// ============================================================================

//! ## Overview
//! Safe-auto mode may only touch paths the arbitration contract allows.
//! Denylist hits win over allowlist hits; a path matching neither list is
//! denied. Paths are matched root-relative with forward slashes; `*` does
//! not cross separators, `**` recurses.

// ============================================================================
// SECTION: Imports
// ============================================================================

use globset::GlobBuilder;
use globset::GlobSet;
use globset::GlobSetBuilder;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while compiling patch surface globs.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// A glob pattern failed to compile.
    #[error("invalid patch surface pattern {pattern:?}: {reason}")]
    BadPattern {
        /// Offending pattern.
        pattern: String,
        /// Compiler failure description.
        reason: String,
    },
}

// ============================================================================
// SECTION: Violations
// ============================================================================

/// One denied mutation path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathPolicyViolation {
    /// Root-relative path that was denied.
    pub path: String,
    /// Denial reason (`denied by pattern: …` or `not matched by allowlist`).
    pub reason: String,
}

// ============================================================================
// SECTION: Policy
// ============================================================================

/// Compiled safe-auto patch surface policy.
///
/// # Invariants
/// - Every path is checked; a missing surface block compiles to an empty
///   allowlist, which denies everything.
#[derive(Debug)]
pub struct PatchSurfacePolicy {
    /// Denylist patterns in declared order, for violation messages.
    deny_patterns: Vec<String>,
    /// Compiled allowlist.
    allow: GlobSet,
    /// Compiled denylist.
    deny: GlobSet,
}

impl PatchSurfacePolicy {
    /// Compiles a policy from the `safe_auto_patch_surface` contract block.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] when a pattern fails to compile.
    pub fn from_contract(contract: &Map<String, Value>) -> Result<Self, PolicyError> {
        let surface = contract
            .get("safe_auto_patch_surface")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        let allow_patterns = pattern_list(&surface, "allowlist");
        let deny_patterns = pattern_list(&surface, "denylist");

        Ok(Self {
            allow: compile_set(&allow_patterns)?,
            deny: compile_set(&deny_patterns)?,
            deny_patterns,
        })
    }

    /// Checks one root-relative path, returning the violation when denied.
    ///
    /// Denylist wins; an allowlist miss denies.
    #[must_use]
    pub fn check(&self, path: &str) -> Option<PathPolicyViolation> {
        let deny_matches = self.deny.matches(path);
        if let Some(first) = deny_matches.first() {
            let pattern =
                self.deny_patterns.get(*first).cloned().unwrap_or_default();
            return Some(PathPolicyViolation {
                path: path.to_string(),
                reason: format!("denied by pattern: {pattern}"),
            });
        }

        if self.allow.is_match(path) {
            return None;
        }

        Some(PathPolicyViolation {
            path: path.to_string(),
            reason: "not matched by allowlist".to_string(),
        })
    }

    /// Checks many paths, accumulating every violation.
    #[must_use]
    pub fn check_all(&self, paths: &[String]) -> Vec<PathPolicyViolation> {
        paths.iter().filter_map(|path| self.check(path)).collect()
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads a string-list field from the surface block.
fn pattern_list(surface: &Map<String, Value>, key: &str) -> Vec<String> {
    surface
        .get(key)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).map(ToString::to_string).collect())
        .unwrap_or_default()
}

/// Compiles patterns into a glob set with non-separator-crossing `*`.
fn compile_set(patterns: &[String]) -> Result<GlobSet, PolicyError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|err| PolicyError::BadPattern {
                pattern: pattern.clone(),
                reason: err.to_string(),
            })?;
        builder.add(glob);
    }
    builder.build().map_err(|err| PolicyError::BadPattern {
        pattern: String::new(),
        reason: err.to_string(),
    })
}
