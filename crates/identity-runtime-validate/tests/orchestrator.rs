// crates/identity-runtime-validate/tests/orchestrator.rs
// ============================================================================
// Module: Orchestrator Tests
// Description: Tests for set execution and hashed log capture.
// ============================================================================
//! ## Overview
//! Validates the required set passes on a scaffolded pack, the log file
//! header layout, SHA-256 integrity, and set/label resolution.

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

use identity_runtime_validate::V1_2_REQUIRED;
use identity_runtime_validate::run_checks;
use identity_runtime_validate::run_set;
use identity_runtime_validate::set_by_label;
use identity_runtime_validate::validator_by_name;

// ============================================================================
// SECTION: Set Execution
// ============================================================================

/// Tests the required set passes end-to-end on a scaffolded pack.
#[test]
fn test_required_set_passes_on_scaffold() {
    let dir = tempfile::tempdir().unwrap();
    let layout = common::seed_runtime(dir.path());
    let ctx = common::ctx(&layout);
    let logs_dir = dir.path().join("logs");

    let results = run_set(&ctx, "v1_2_required", &logs_dir, "test-run").unwrap();

    assert_eq!(results.len(), V1_2_REQUIRED.len());
    for result in &results {
        assert!(result.ok, "check failed: {} -> {}", result.command, result.stdout_tail);
    }
}

/// Tests unknown labels and validator names are rejected.
#[test]
fn test_unknown_labels_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let layout = common::seed_runtime(dir.path());
    let ctx = common::ctx(&layout);

    assert!(run_set(&ctx, "v9_misc", &dir.path().join("logs"), "r").is_err());
    assert!(run_checks(&ctx, &["no-such-validator"], &dir.path().join("logs"), "r").is_err());
    assert!(set_by_label("v1_2_required").is_some());
    assert!(validator_by_name("runtime-contract").is_some());
    assert!(validator_by_name("bogus").is_none());
}

// ============================================================================
// SECTION: Log Capture
// ============================================================================

/// Tests captured logs carry the header block and verify against their
/// declared digests.
#[test]
fn test_log_capture_and_sha256() {
    let dir = tempfile::tempdir().unwrap();
    let layout = common::seed_runtime(dir.path());
    let ctx = common::ctx(&layout);
    let logs_dir = layout.upgrade_logs_dir(&identity_runtime_core::IdentityId::from("demo"));

    let results =
        run_checks(&ctx, &["runtime-contract", "upgrade-prereq"], &logs_dir, "run-7").unwrap();

    assert_eq!(results.len(), 2);
    let first_log = layout.root().join(&results[0].log_path);
    assert!(first_log.ends_with("run-7-check-01.log"), "got {}", results[0].log_path);

    let content = fs::read_to_string(&first_log).unwrap();
    assert!(content.starts_with(&format!("$ {}\n", results[0].command)));
    assert!(content.contains("exit_code: 0"));
    assert!(content.contains("[stdout]"));
    assert!(content.contains("[stderr]"));

    for result in &results {
        let actual =
            identity_runtime_core::hashing::hash_file(&layout.root().join(&result.log_path))
                .unwrap();
        assert_eq!(actual, result.log_sha256);
    }
}

/// Tests commands render through the substitution table.
#[test]
fn test_command_substitution_table() {
    let dir = tempfile::tempdir().unwrap();
    let layout = common::seed_runtime(dir.path());
    let mut ctx = common::ctx(&layout);
    ctx.self_test = true;
    ctx.git_base = Some("abc".to_string());
    ctx.git_head = Some("def".to_string());

    let collab = validator_by_name("collab-trigger").unwrap();
    let command = identity_runtime_validate::command_for(collab, &ctx);
    assert_eq!(command, "identity validate --only collab-trigger --identity-id demo --self-test");

    let runtime = validator_by_name("runtime-contract").unwrap();
    let command = identity_runtime_validate::command_for(runtime, &ctx);
    assert_eq!(command, "identity validate --only runtime-contract --identity-id demo");

    let changelog = validator_by_name("changelog").unwrap();
    let command = identity_runtime_validate::command_for(changelog, &ctx);
    assert_eq!(command, "identity validate --only changelog --base abc --head def");
}
