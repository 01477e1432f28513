// crates/identity-runtime-engine/tests/ci_gate.rs
// ============================================================================
// Module: CI Enforcement Gate Tests
// Description: Diff-scoped evidence enforcement over a real git repository.
// ============================================================================
//! ## Overview
//! Builds a git repository around a scaffolded runtime tree and drives the
//! gate through the failing and passing halves of the enforcement scenario.

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
use std::path::Path;
use std::process::Command;

use identity_runtime_core::IdentityId;
use identity_runtime_core::RuntimeLayout;
use identity_runtime_engine::CiGateOptions;
use identity_runtime_engine::UpgradeMode;
use identity_runtime_engine::UpgradeOptions;
use identity_runtime_engine::cigate::enforce;
use identity_runtime_engine::upgrade::ExecutionEnv;
use identity_runtime_engine::upgrade::execute_upgrade;

/// Runs a git command, panicking on failure.
fn git(root: &Path, args: &[&str]) {
    let status = Command::new("git").args(args).current_dir(root).status().unwrap();
    assert!(status.success(), "git {args:?} failed");
}

/// Initializes a repository with one commit holding the scaffolded tree.
fn init_repo(root: &Path) -> RuntimeLayout {
    let layout = common::seed_runtime(root);
    fs::write(root.join("CHANGELOG.md"), "# Changelog\n\n- scaffold identity demo\n").unwrap();
    git(root, &["init", "--quiet", "--initial-branch=main"]);
    git(root, &["config", "user.email", "ci@example.invalid"]);
    git(root, &["config", "user.name", "ci"]);
    git(root, &["add", "-A"]);
    git(root, &["commit", "--quiet", "-m", "scaffold"]);
    layout
}

/// Builds gate options for `demo` with default range resolution.
fn gate_options() -> CiGateOptions {
    CiGateOptions {
        identity_id: IdentityId::from("demo"),
        base: None,
        head: None,
        require_ci_binding: false,
        expected_run_id: None,
        expected_sha: None,
        now: common::now(),
    }
}

// ============================================================================
// SECTION: Enforcement
// ============================================================================

/// Tests a core change without an evidence report fails the gate, and the
/// same change alongside a real executor run passes it.
#[test]
fn test_core_change_requires_evidence_report() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let layout = init_repo(root);

    // Core change with a changelog entry but no evidence report.
    let rulebook = layout.pack_dir(&IdentityId::from("demo")).join("RULEBOOK.jsonl");
    let mut text = fs::read_to_string(&rulebook).unwrap();
    text.push_str("{\"rule_id\":\"demo-manual\",\"type\":\"positive\",\"trigger\":\"manual\",\"action\":\"noop\",\"evidence_run_id\":\"manual\",\"scope\":\"test\",\"confidence\":\"low\",\"updated_at\":\"2026-02-22T09:40:00Z\"}\n");
    fs::write(&rulebook, text).unwrap();
    fs::write(root.join("CHANGELOG.md"), "# Changelog\n\n- scaffold identity demo\n- manual rule\n")
        .unwrap();
    git(root, &["add", "-A"]);
    git(root, &["commit", "--quiet", "-m", "manual rulebook edit"]);

    let outcome = enforce(&layout, &gate_options()).unwrap();
    assert!(!outcome.pass);
    assert!(outcome.lines.iter().any(|line| {
        line.contains("identity-core files changed without self-upgrade evidence report change")
    }));

    // Same class of change produced by the executor, evidence included.
    common::write_metrics(&layout, 15.0, 100.0, 100.0);
    let upgraded = execute_upgrade(
        &layout,
        &UpgradeOptions {
            identity_id: IdentityId::from("demo"),
            mode: UpgradeMode::SafeAuto,
            metrics_path: None,
            out_dir: None,
            now: common::now(),
            env: ExecutionEnv::default(),
        },
    )
    .unwrap();
    assert_eq!(upgraded.exit_code, 0, "report: {:?}", upgraded.report);
    fs::write(
        root.join("CHANGELOG.md"),
        "# Changelog\n\n- scaffold identity demo\n- manual rule\n- safe-auto upgrade\n",
    )
    .unwrap();
    git(root, &["add", "-A"]);
    git(root, &["commit", "--quiet", "-m", "safe-auto upgrade with evidence"]);

    let outcome = enforce(&layout, &gate_options()).unwrap();
    assert!(outcome.pass, "gate lines: {:?}", outcome.lines);
}

/// Tests the gate never demands a report when no core file changed.
#[test]
fn test_no_core_change_never_demands_report() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let layout = init_repo(root);

    fs::write(root.join("docs-notes.txt"), "nothing significant\n").unwrap();
    git(root, &["add", "-A"]);
    git(root, &["commit", "--quiet", "-m", "notes"]);

    let outcome = enforce(&layout, &gate_options()).unwrap();
    assert!(outcome.pass, "gate lines: {:?}", outcome.lines);
}

/// Tests significant changes without a changelog update fail the gate.
#[test]
fn test_changelog_rule() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let layout = init_repo(root);

    fs::write(root.join("identity/protocol/IDENTITY_PROTOCOL.md"), "# Protocol v2\n").unwrap();
    git(root, &["add", "-A"]);
    git(root, &["commit", "--quiet", "-m", "protocol change without changelog"]);

    let outcome = enforce(&layout, &gate_options()).unwrap();
    assert!(!outcome.pass);
    assert!(outcome.lines.iter().any(|line| line.contains("CHANGELOG.md was not updated")));
}

/// Tests tampering with a referenced check log fails the sha verification.
#[test]
fn test_tampered_check_log_fails_gate() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let layout = init_repo(root);

    common::write_metrics(&layout, 15.0, 100.0, 100.0);
    let upgraded = execute_upgrade(
        &layout,
        &UpgradeOptions {
            identity_id: IdentityId::from("demo"),
            mode: UpgradeMode::SafeAuto,
            metrics_path: None,
            out_dir: None,
            now: common::now(),
            env: ExecutionEnv::default(),
        },
    )
    .unwrap();
    assert_eq!(upgraded.exit_code, 0, "report: {:?}", upgraded.report);

    let first_log = root.join(&upgraded.report.check_results[0].log_path);
    let mut tampered = fs::read_to_string(&first_log).unwrap();
    tampered.push_str("tampered\n");
    fs::write(&first_log, tampered).unwrap();

    fs::write(
        root.join("CHANGELOG.md"),
        "# Changelog\n\n- scaffold identity demo\n- safe-auto upgrade\n",
    )
    .unwrap();
    git(root, &["add", "-A"]);
    git(root, &["commit", "--quiet", "-m", "upgrade with tampered log"]);

    let outcome = enforce(&layout, &gate_options()).unwrap();
    assert!(!outcome.pass);
    assert!(outcome.lines.iter().any(|line| line.contains("sha256 mismatch")));
}
