// crates/identity-runtime-engine/tests/upgrade_executor.rs
// ============================================================================
// Module: Upgrade Executor Tests
// Description: End-to-end executor scenarios over scaffolded packs.
// ============================================================================
//! ## Overview
//! Covers the healthy no-op run, the triggered safe-auto run with append-only
//! mutations, the path-policy block, and review-required idempotence.

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

use identity_runtime_core::IdentityId;
use identity_runtime_core::RuntimeLayout;
use identity_runtime_core::Timestamp;
use identity_runtime_engine::UpgradeMode;
use identity_runtime_engine::UpgradeOptions;
use identity_runtime_engine::upgrade::ExecutionEnv;
use identity_runtime_engine::upgrade::execute_upgrade;
use serde_json::Value;

/// Builds executor options for `demo` at the fixed clock.
fn options(mode: UpgradeMode, now: Timestamp) -> UpgradeOptions {
    UpgradeOptions {
        identity_id: IdentityId::from("demo"),
        mode,
        metrics_path: None,
        out_dir: None,
        now,
        env: ExecutionEnv::default(),
    }
}

/// Counts non-empty lines of a pack file.
fn line_count(layout: &RuntimeLayout, file: &str) -> usize {
    let path = layout.pack_dir(&IdentityId::from("demo")).join(file);
    fs::read_to_string(path).unwrap().lines().filter(|line| !line.trim().is_empty()).count()
}

// ============================================================================
// SECTION: Healthy No-Op
// ============================================================================

/// Tests a healthy safe-auto run plans, validates, and mutates nothing.
#[test]
fn test_healthy_safe_auto_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let layout = common::seed_runtime(dir.path());
    common::write_metrics(&layout, 0.0, 100.0, 100.0);
    let rulebook_before = line_count(&layout, "RULEBOOK.jsonl");

    let outcome = execute_upgrade(&layout, &options(UpgradeMode::SafeAuto, common::now())).unwrap();

    assert_eq!(outcome.exit_code, 0, "report: {:?}", outcome.report);
    assert!(!outcome.report.upgrade_required);
    assert!(outcome.report.all_ok);
    assert_eq!(outcome.report.actions_taken.len(), 1);
    assert!(outcome.report.actions_taken[0].starts_with("patch_plan_written:"));
    assert_eq!(line_count(&layout, "RULEBOOK.jsonl"), rulebook_before);
    assert!(outcome.plan_path.exists());
    assert!(outcome.report_path.exists());
}

// ============================================================================
// SECTION: Triggered Safe-Auto
// ============================================================================

/// Tests a triggered safe-auto run appends exactly one rulebook row and one
/// history line, linked by the run id.
#[test]
fn test_triggered_safe_auto_appends_evidence() {
    let dir = tempfile::tempdir().unwrap();
    let layout = common::seed_runtime(dir.path());
    common::write_metrics(&layout, 15.0, 100.0, 100.0);
    let rulebook_before = line_count(&layout, "RULEBOOK.jsonl");
    let history_before = line_count(&layout, "TASK_HISTORY.md");

    let outcome = execute_upgrade(&layout, &options(UpgradeMode::SafeAuto, common::now())).unwrap();

    assert_eq!(outcome.exit_code, 0, "report: {:?}", outcome.report);
    assert!(outcome.report.upgrade_required);
    assert_eq!(
        outcome.report.trigger_reasons,
        vec!["misroute_rate 15 >= threshold 10".to_string()]
    );
    assert_eq!(line_count(&layout, "RULEBOOK.jsonl"), rulebook_before + 1);
    assert_eq!(line_count(&layout, "TASK_HISTORY.md"), history_before + 1);

    let rulebook = fs::read_to_string(
        layout.pack_dir(&IdentityId::from("demo")).join("RULEBOOK.jsonl"),
    )
    .unwrap();
    let last_row: Value = serde_json::from_str(rulebook.lines().last().unwrap()).unwrap();
    assert_eq!(last_row["evidence_run_id"], Value::from(outcome.report.run_id.as_str()));

    let decision_path = layout
        .arbitration_logs_dir()
        .join(format!("demo-{}.json", outcome.report.run_id));
    assert!(decision_path.exists());

    for check in &outcome.report.check_results {
        let log_path = layout.root().join(&check.log_path);
        assert!(log_path.exists());
        let actual = identity_runtime_core::hashing::hash_file(&log_path).unwrap();
        assert_eq!(actual, check.log_sha256);
    }
}

// ============================================================================
// SECTION: Path Policy Block
// ============================================================================

/// Tests a denylisted rulebook blocks safe-auto before any append.
#[test]
fn test_denylisted_rulebook_blocks_apply() {
    let dir = tempfile::tempdir().unwrap();
    let layout = common::seed_runtime(dir.path());
    common::write_metrics(&layout, 15.0, 100.0, 100.0);

    let task_path = layout.pack_dir(&IdentityId::from("demo")).join("CURRENT_TASK.json");
    let mut task: Value = serde_json::from_str(&fs::read_to_string(&task_path).unwrap()).unwrap();
    task["capability_arbitration_contract"]["safe_auto_patch_surface"]["denylist"] =
        serde_json::json!(["**/RULEBOOK.jsonl"]);
    fs::write(&task_path, serde_json::to_string_pretty(&task).unwrap() + "\n").unwrap();
    let rulebook_before = line_count(&layout, "RULEBOOK.jsonl");

    let outcome = execute_upgrade(&layout, &options(UpgradeMode::SafeAuto, common::now())).unwrap();

    assert_eq!(outcome.exit_code, 3);
    assert!(!outcome.report.all_ok);
    assert_eq!(outcome.report.path_policy_violations.len(), 1);
    assert!(outcome.report.path_policy_violations[0].path.ends_with("RULEBOOK.jsonl"));
    assert_eq!(
        outcome.report.path_policy_violations[0].reason,
        "denied by pattern: **/RULEBOOK.jsonl"
    );
    assert_eq!(line_count(&layout, "RULEBOOK.jsonl"), rulebook_before);
}

// ============================================================================
// SECTION: Review-Required Idempotence
// ============================================================================

/// Tests two review-required runs agree on everything but the run id.
#[test]
fn test_review_required_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let layout = common::seed_runtime(dir.path());
    common::write_metrics(&layout, 15.0, 100.0, 100.0);

    let first = execute_upgrade(
        &layout,
        &options(UpgradeMode::ReviewRequired, common::now()),
    )
    .unwrap();
    let later = Timestamp::parse("2026-02-22T09:41:00Z").unwrap();
    let second =
        execute_upgrade(&layout, &options(UpgradeMode::ReviewRequired, later)).unwrap();

    assert_ne!(first.report.run_id, second.report.run_id);
    assert_eq!(first.report.upgrade_required, second.report.upgrade_required);
    assert_eq!(first.report.trigger_reasons, second.report.trigger_reasons);

    let first_plan: Value =
        serde_json::from_str(&fs::read_to_string(&first.plan_path).unwrap()).unwrap();
    let second_plan: Value =
        serde_json::from_str(&fs::read_to_string(&second.plan_path).unwrap()).unwrap();
    assert_eq!(first_plan["patch_surface"], second_plan["patch_surface"]);

    // Review-required never mutates the pack, even when triggered.
    assert_eq!(line_count(&layout, "RULEBOOK.jsonl"), 1);
}

// ============================================================================
// SECTION: Preconditions
// ============================================================================

/// Tests a missing metrics artifact is a precondition failure.
#[test]
fn test_missing_metrics_is_precondition_failure() {
    let dir = tempfile::tempdir().unwrap();
    let layout = common::seed_runtime(dir.path());
    fs::remove_file(layout.metrics_path(&IdentityId::from("demo"))).unwrap();

    let result = execute_upgrade(&layout, &options(UpgradeMode::SafeAuto, common::now()));
    assert!(result.is_err());
}
