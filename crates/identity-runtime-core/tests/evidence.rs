// crates/identity-runtime-core/tests/evidence.rs
// ============================================================================
// Module: Evidence Discovery Tests
// Description: Tests for deterministic glob-based evidence selection.
// ============================================================================
//! ## Overview
//! Validates pattern matching, identity scoping, and the latest-file
//! tie-break rule.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::fs;

use identity_runtime_core::evidence;

// ============================================================================
// SECTION: Matching
// ============================================================================

/// Tests single-star patterns do not cross directory separators.
#[test]
fn test_star_does_not_cross_separators() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("identity/runtime/examples/nested")).unwrap();
    fs::write(dir.path().join("identity/runtime/examples/review-a.json"), "{}").unwrap();
    fs::write(dir.path().join("identity/runtime/examples/nested/review-b.json"), "{}").unwrap();

    let found =
        evidence::matches(dir.path(), "identity/runtime/examples/review-*.json").unwrap();
    assert_eq!(found.len(), 1);
    assert!(found[0].ends_with("review-a.json"));
}

/// Tests a missing pattern prefix yields an empty match set.
#[test]
fn test_missing_prefix_yields_empty() {
    let dir = tempfile::tempdir().unwrap();
    let found = evidence::matches(dir.path(), "identity/runtime/examples/*.json").unwrap();
    assert!(found.is_empty());
}

// ============================================================================
// SECTION: Latest Selection
// ============================================================================

/// Tests identity-scoped matches are preferred over unscoped ones.
#[test]
fn test_latest_prefers_scoped_matches() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("identity/runtime/examples");
    fs::create_dir_all(&base).unwrap();
    fs::write(base.join("review-other.json"), "{}").unwrap();
    fs::write(base.join("review-demo.json"), "{}").unwrap();

    let latest = evidence::latest(dir.path(), "identity/runtime/examples/review-*.json", Some("demo"))
        .unwrap()
        .unwrap();
    assert!(latest.ends_with("review-demo.json"));
}

/// Tests equal mtimes fall back to the lexicographically greatest path.
#[test]
fn test_latest_lexicographic_tie_break() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("identity/runtime/examples");
    fs::create_dir_all(&base).unwrap();
    fs::write(base.join("review-001.json"), "{}").unwrap();
    fs::write(base.join("review-002.json"), "{}").unwrap();
    let stamp = fs::metadata(base.join("review-001.json")).unwrap().modified().unwrap();
    let file = fs::File::options().write(true).open(base.join("review-002.json")).unwrap();
    file.set_modified(stamp).unwrap();

    let latest = evidence::latest(dir.path(), "identity/runtime/examples/review-*.json", None)
        .unwrap()
        .unwrap();
    assert!(latest.ends_with("review-002.json"));
}

/// Tests scoping falls back to all matches when nothing is scoped.
#[test]
fn test_latest_falls_back_when_unscoped() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("identity/runtime/examples");
    fs::create_dir_all(&base).unwrap();
    fs::write(base.join("review-zeta.json"), "{}").unwrap();

    let latest = evidence::latest(dir.path(), "identity/runtime/examples/review-*.json", Some("demo"))
        .unwrap()
        .unwrap();
    assert!(latest.ends_with("review-zeta.json"));
}
