// crates/identity-runtime-core/src/evidence.rs
// ============================================================================
// Module: Identity Runtime Evidence Discovery
// Description: Deterministic glob-based evidence file discovery.
// Purpose: Consolidate glob semantics behind one selection rule.
// Dependencies: globset, walkdir, thiserror
// ============================================================================

//! ## Overview
//! Contracts reference evidence through path patterns such as
//! `identity/runtime/examples/protocol-baseline-review-*.json`. This module
//! is the single place those patterns are resolved. Selection rule: among all
//! matches (optionally narrowed to file names containing the identity id,
//! falling back to all matches when none are scoped), pick the latest by
//! modification time; when mtimes are equal or unavailable, the
//! lexicographically greatest relative path wins. `*` never crosses a path
//! separator; `**` recurses.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Component;
use std::path::Path;
use std::path::PathBuf;
use std::time::SystemTime;

use globset::GlobBuilder;
use globset::GlobMatcher;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised during evidence discovery.
#[derive(Debug, Error)]
pub enum EvidenceError {
    /// The pattern failed to compile.
    #[error("invalid evidence pattern {pattern:?}: {reason}")]
    BadPattern {
        /// Offending pattern.
        pattern: String,
        /// Compiler failure description.
        reason: String,
    },
}

// ============================================================================
// SECTION: Discovery
// ============================================================================

/// Returns all files under `root` matching `pattern`, sorted by relative
/// path.
///
/// Unreadable directory entries are skipped; discovery never fails on
/// partial trees.
///
/// # Errors
///
/// Returns [`EvidenceError::BadPattern`] when the pattern cannot compile.
pub fn matches(root: &Path, pattern: &str) -> Result<Vec<PathBuf>, EvidenceError> {
    let matcher = compile(pattern)?;
    let walk_root = root.join(static_prefix(pattern));
    if !walk_root.exists() {
        return Ok(Vec::new());
    }

    let mut found: Vec<PathBuf> = Vec::new();
    for entry in walkdir::WalkDir::new(&walk_root).into_iter().filter_map(Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(root) else {
            continue;
        };
        if matcher.is_match(rel) {
            found.push(entry.path().to_path_buf());
        }
    }
    found.sort();
    Ok(found)
}

/// Resolves the latest evidence file for a pattern.
///
/// When `scope` is given, matches whose file name contains the scope string
/// are preferred; the unscoped set is used only when no scoped match exists.
///
/// # Errors
///
/// Returns [`EvidenceError::BadPattern`] when the pattern cannot compile.
pub fn latest(
    root: &Path,
    pattern: &str,
    scope: Option<&str>,
) -> Result<Option<PathBuf>, EvidenceError> {
    let all = matches(root, pattern)?;
    let pool: Vec<PathBuf> = match scope {
        Some(scope_id) if !scope_id.is_empty() => {
            let scoped: Vec<PathBuf> = all
                .iter()
                .filter(|path| {
                    path.file_name()
                        .map(|name| name.to_string_lossy().contains(scope_id))
                        .unwrap_or(false)
                })
                .cloned()
                .collect();
            if scoped.is_empty() { all } else { scoped }
        }
        _ => all,
    };

    Ok(pick_latest(pool))
}

/// Picks the latest path by (mtime, lexicographic path).
fn pick_latest(pool: Vec<PathBuf>) -> Option<PathBuf> {
    pool.into_iter().max_by(|a, b| {
        let mtime_a = modified_or_epoch(a);
        let mtime_b = modified_or_epoch(b);
        mtime_a.cmp(&mtime_b).then_with(|| a.cmp(b))
    })
}

/// Returns a file's modification time, or the unix epoch when unavailable.
fn modified_or_epoch(path: &Path) -> SystemTime {
    path.metadata().and_then(|meta| meta.modified()).unwrap_or(SystemTime::UNIX_EPOCH)
}

// ============================================================================
// SECTION: Pattern Helpers
// ============================================================================

/// Compiles a pattern with non-separator-crossing `*`.
fn compile(pattern: &str) -> Result<GlobMatcher, EvidenceError> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map(|glob| glob.compile_matcher())
        .map_err(|err| EvidenceError::BadPattern {
            pattern: pattern.to_string(),
            reason: err.to_string(),
        })
}

/// Returns the wildcard-free leading directory components of a pattern.
fn static_prefix(pattern: &str) -> PathBuf {
    let mut prefix = PathBuf::new();
    let components: Vec<Component<'_>> = Path::new(pattern).components().collect();
    for (index, component) in components.iter().enumerate() {
        let text = component.as_os_str().to_string_lossy();
        let is_last = index == components.len().saturating_sub(1);
        if is_last || text.contains(['*', '?', '[']) {
            break;
        }
        prefix.push(component.as_os_str());
    }
    prefix
}
