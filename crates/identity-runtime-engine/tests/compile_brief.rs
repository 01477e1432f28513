// crates/identity-runtime-engine/tests/compile_brief.rs
// ============================================================================
// Module: Runtime Brief Compiler Tests
// Description: Tests for brief rendering and check-mode idempotence.
// ============================================================================
//! ## Overview
//! Validates the rendered brief content and the compile→compile byte
//! idempotence law.

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

mod common;

use std::fs;

use identity_runtime_engine::CompileOutcome;
use identity_runtime_engine::compile::compile_brief;

// ============================================================================
// SECTION: Rendering
// ============================================================================

/// Tests the brief names the active identity, objective, and state.
#[test]
fn test_brief_contains_active_identity() {
    let dir = tempfile::tempdir().unwrap();
    let layout = common::seed_runtime(dir.path());

    let outcome = compile_brief(&layout, false).unwrap();
    let CompileOutcome::Written(path) = outcome else {
        unreachable!("compile always writes");
    };

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("# Identity Runtime Brief\n"));
    assert!(text.contains("Active identity: demo"));
    assert!(text.contains("- Demo identity"));
    assert!(text.contains("- intake"));
    assert!(text.contains("- identity/catalog/identities.yaml"));
    assert!(text.ends_with('\n'));
}

// ============================================================================
// SECTION: Idempotence
// ============================================================================

/// Tests a second compile produces identical bytes and check passes.
#[test]
fn test_compile_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let layout = common::seed_runtime(dir.path());

    compile_brief(&layout, false).unwrap();
    let first = fs::read(layout.compiled_brief_path()).unwrap();

    compile_brief(&layout, false).unwrap();
    let second = fs::read(layout.compiled_brief_path()).unwrap();
    assert_eq!(first, second);

    let check = compile_brief(&layout, true).unwrap();
    assert!(matches!(check, CompileOutcome::Written(_)));
}

/// Tests check mode flags a stale brief without rewriting it.
#[test]
fn test_check_mode_flags_stale_brief() {
    let dir = tempfile::tempdir().unwrap();
    let layout = common::seed_runtime(dir.path());
    compile_brief(&layout, false).unwrap();

    fs::write(layout.compiled_brief_path(), "stale\n").unwrap();
    let check = compile_brief(&layout, true).unwrap();
    assert!(matches!(check, CompileOutcome::Stale(_)));
    assert_eq!(fs::read_to_string(layout.compiled_brief_path()).unwrap(), "stale\n");
}
