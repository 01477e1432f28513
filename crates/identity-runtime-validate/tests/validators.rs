// crates/identity-runtime-validate/tests/validators.rs
// ============================================================================
// Module: Validator Behavior Tests
// Description: Per-validator acceptance and rejection cases.
// ============================================================================
//! ## Overview
//! Drives individual validators over the scaffolded fixture and over
//! deliberately broken variants: stale evidence, missing samples, conflict
//! inconsistencies, and self-test corpora.

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

use identity_runtime_validate::run_one;
use serde_json::Value;
use serde_json::json;

/// Rewrites the `demo` task record in place.
fn edit_task(layout: &identity_runtime_core::RuntimeLayout, edit: impl FnOnce(&mut Value)) {
    let path = layout
        .pack_dir(&identity_runtime_core::IdentityId::from("demo"))
        .join("CURRENT_TASK.json");
    let mut task: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    edit(&mut task);
    fs::write(&path, serde_json::to_string_pretty(&task).unwrap() + "\n").unwrap();
}

// ============================================================================
// SECTION: Manifest
// ============================================================================

/// Tests the manifest validator passes on the scaffolded catalog.
#[test]
fn test_manifest_passes_on_scaffold() {
    let dir = tempfile::tempdir().unwrap();
    let layout = common::seed_runtime(dir.path());
    let verdict = run_one(&common::ctx(&layout), "manifest").unwrap();
    assert!(verdict.ok, "findings: {:?}", verdict.findings);
}

/// Tests a duplicate id is rejected by the manifest validator.
#[test]
fn test_manifest_rejects_duplicate_ids() {
    let dir = tempfile::tempdir().unwrap();
    let layout = common::seed_runtime(dir.path());

    let catalog_path = layout.catalog_path();
    let mut catalog: Value =
        serde_yaml::from_str(&fs::read_to_string(&catalog_path).unwrap()).unwrap();
    let entry = catalog["identities"][0].clone();
    catalog["identities"].as_array_mut().unwrap().push(entry);
    fs::write(&catalog_path, serde_yaml::to_string(&catalog).unwrap()).unwrap();

    let verdict = run_one(&common::ctx(&layout), "manifest").unwrap();
    assert!(!verdict.ok);
    assert!(verdict.findings.iter().any(|finding| finding.message.contains("duplicate identity id")));
}

/// Tests a dangling pack path is rejected by the manifest validator.
#[test]
fn test_manifest_rejects_missing_pack_path() {
    let dir = tempfile::tempdir().unwrap();
    let layout = common::seed_runtime(dir.path());

    let catalog_path = layout.catalog_path();
    let text = fs::read_to_string(&catalog_path)
        .unwrap()
        .replace("identity/packs/demo", "identity/packs/ghost");
    fs::write(&catalog_path, text).unwrap();

    let verdict = run_one(&common::ctx(&layout), "manifest").unwrap();
    assert!(!verdict.ok);
    assert!(verdict.findings.iter().any(|finding| finding.message.contains("pack_path not found")));
}

// ============================================================================
// SECTION: Lifecycle and Regression
// ============================================================================

/// Tests the update lifecycle validator demands a passing replay.
#[test]
fn test_update_lifecycle_rejects_failed_replay() {
    let dir = tempfile::tempdir().unwrap();
    let layout = common::seed_runtime(dir.path());

    let replay_path = layout.examples_dir().join("demo-update-replay-sample.json");
    let mut replay: Value =
        serde_json::from_str(&fs::read_to_string(&replay_path).unwrap()).unwrap();
    replay["replay_status"] = json!("FAIL");
    fs::write(&replay_path, serde_json::to_string_pretty(&replay).unwrap() + "\n").unwrap();

    let verdict = run_one(&common::ctx(&layout), "update-lifecycle").unwrap();
    assert!(!verdict.ok);
    assert!(verdict.findings.iter().any(|finding| finding.message.contains("replay_status")));
}

/// Tests the regression validator rejects an unknown result value.
#[test]
fn test_trigger_regression_rejects_bad_result() {
    let dir = tempfile::tempdir().unwrap();
    let layout = common::seed_runtime(dir.path());

    let report_path = layout.examples_dir().join("demo-trigger-regression-sample.json");
    let mut report: Value =
        serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
    report["positive_cases"][0]["result"] = json!("MAYBE");
    fs::write(&report_path, serde_json::to_string_pretty(&report).unwrap() + "\n").unwrap();

    let verdict = run_one(&common::ctx(&layout), "trigger-regression").unwrap();
    assert!(!verdict.ok);
    assert!(verdict.findings.iter().any(|finding| finding.message.contains("PASS|FAIL")));
}

// ============================================================================
// SECTION: Collaboration and Feedback
// ============================================================================

/// Tests the collab validator self-test passes on the scaffolded corpus.
#[test]
fn test_collab_self_test_on_scaffold_corpus() {
    let dir = tempfile::tempdir().unwrap();
    let layout = common::seed_runtime(dir.path());
    let mut ctx = common::ctx(&layout);
    ctx.self_test = true;

    let verdict = run_one(&ctx, "collab-trigger").unwrap();
    assert!(verdict.ok, "findings: {:?}", verdict.findings);
    assert!(verdict.lines.iter().any(|line| line.contains("self-test passed")));
}

/// Tests a negative sample that passes validation fails the self-test.
#[test]
fn test_collab_self_test_flags_passing_negative() {
    let dir = tempfile::tempdir().unwrap();
    let layout = common::seed_runtime(dir.path());

    // Overwrite the negative sample with a fully valid log.
    let positive = layout
        .examples_dir()
        .join("collaboration-trigger/positive/sample-001.json");
    let negative = layout
        .examples_dir()
        .join("collaboration-trigger/negative/sample-001.json");
    fs::copy(&positive, &negative).unwrap();

    let mut ctx = common::ctx(&layout);
    ctx.self_test = true;
    let verdict = run_one(&ctx, "collab-trigger").unwrap();
    assert!(!verdict.ok);
    assert!(verdict.findings.iter().any(|finding| finding.message.contains("should fail")));
}

/// Tests stale feedback logs are rejected for freshness.
#[test]
fn test_feedback_rejects_stale_logs() {
    let dir = tempfile::tempdir().unwrap();
    let layout = common::seed_runtime(dir.path());

    let log_path = layout.feedback_logs_dir().join("demo-feedback-0001.json");
    let mut record: Value = serde_json::from_str(&fs::read_to_string(&log_path).unwrap()).unwrap();
    record["timestamp"] = json!("2026-01-01T00:00:00Z");
    fs::write(&log_path, serde_json::to_string_pretty(&record).unwrap() + "\n").unwrap();

    let verdict = run_one(&common::ctx(&layout), "experience-feedback").unwrap();
    assert!(!verdict.ok);
    assert!(verdict.findings.iter().any(|finding| finding.message.contains("too old")));
}

/// Tests denylisted top-level keys in feedback logs are rejected.
#[test]
fn test_feedback_rejects_denylisted_keys() {
    let dir = tempfile::tempdir().unwrap();
    let layout = common::seed_runtime(dir.path());

    let log_path = layout.feedback_logs_dir().join("demo-feedback-0001.json");
    let mut record: Value = serde_json::from_str(&fs::read_to_string(&log_path).unwrap()).unwrap();
    record["token"] = json!("hunter2");
    fs::write(&log_path, serde_json::to_string_pretty(&record).unwrap() + "\n").unwrap();

    let verdict = run_one(&common::ctx(&layout), "experience-feedback").unwrap();
    assert!(!verdict.ok);
    assert!(verdict.findings.iter().any(|finding| finding.message.contains("denylisted")));
}

// ============================================================================
// SECTION: Install Evidence
// ============================================================================

/// Tests the install safety validator rejects an inconsistent action.
#[test]
fn test_install_safety_rejects_inconsistent_action() {
    let dir = tempfile::tempdir().unwrap();
    let layout = common::seed_runtime(dir.path());

    let mirror = layout
        .install_examples_dir()
        .join(format!("install-report-{}-demo.json", common::now().date_stamp()));
    let mut report: Value = serde_json::from_str(&fs::read_to_string(&mirror).unwrap()).unwrap();
    report["conflict_type"] = json!("same_signature");
    report["action"] = json!("guarded_apply");
    fs::write(&mirror, serde_json::to_string_pretty(&report).unwrap() + "\n").unwrap();

    let verdict = run_one(&common::ctx(&layout), "install-safety").unwrap();
    assert!(!verdict.ok);
    assert!(verdict.findings.iter().any(|finding| {
        finding.message.contains("same_signature conflict must use action=no_op_with_report")
    }));
}

/// Tests the provenance validator requires the full operation chain.
#[test]
fn test_install_provenance_requires_chain() {
    let dir = tempfile::tempdir().unwrap();
    let layout = common::seed_runtime(dir.path());
    edit_task(&layout, |task| {
        task["gates"]["install_provenance_gate"] = json!("required");
    });

    // Only an install report exists; plan and dry-run are missing.
    identity_runtime_core::document::write_json_pretty(
        &layout.install_reports_dir().join("identity-install-demo-install-1000-000.json"),
        &json!({
            "report_id": "identity-install-demo-install-1000-000",
            "identity_id": "demo",
            "generated_at": common::NOW,
            "operation": "install",
            "conflict_type": "fresh_install",
            "action": "guarded_apply",
            "preserved_paths": [],
            "installer_invocation": {
                "tool": "identity-installer",
                "entrypoint": "identity install",
                "command": "identity install install --identity-id demo"
            }
        }),
    )
    .unwrap();

    let verdict = run_one(&common::ctx(&layout), "install-provenance").unwrap();
    assert!(!verdict.ok);
    assert!(verdict.findings.iter().any(|finding| {
        finding.message.contains("missing required operation chain entries")
    }));
}

// ============================================================================
// SECTION: Arbitration Linkage
// ============================================================================

/// Tests the metrics linkage rejects a report that disagrees with the math.
#[test]
fn test_arbitration_metrics_linkage_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let layout = common::seed_runtime(dir.path());

    // Healthy metrics, but the sample report claims a trigger.
    let sample = layout.examples_dir().join("demo-capability-arbitration-sample.json");
    let mut report: Value = serde_json::from_str(&fs::read_to_string(&sample).unwrap()).unwrap();
    report["upgrade_required"] = json!(true);
    fs::write(&sample, serde_json::to_string_pretty(&report).unwrap() + "\n").unwrap();

    let verdict = run_one(&common::ctx(&layout), "capability-arbitration").unwrap();
    assert!(!verdict.ok);
    assert!(verdict.findings.iter().any(|finding| finding.message.contains("linkage mismatch")));
}

// ============================================================================
// SECTION: CI Enforcement
// ============================================================================

/// Tests a missing workflow file fails CI enforcement.
#[test]
fn test_ci_enforcement_requires_workflow_file() {
    let dir = tempfile::tempdir().unwrap();
    let layout = common::seed_runtime(dir.path());
    fs::remove_file(dir.path().join(".github/workflows/identity-protocol-ci.yml")).unwrap();

    let verdict = run_one(&common::ctx(&layout), "ci-enforcement").unwrap();
    assert!(!verdict.ok);
    assert!(verdict.findings.iter().any(|finding| {
        finding.message.contains("required workflow file missing")
    }));
}

/// Tests overlap between required and candidate validators is rejected.
#[test]
fn test_ci_enforcement_rejects_set_overlap() {
    let dir = tempfile::tempdir().unwrap();
    let layout = common::seed_runtime(dir.path());
    edit_task(&layout, |task| {
        task["ci_enforcement_contract"]["candidate_validators_v1_2"]
            .as_array_mut()
            .unwrap()
            .push(json!("runtime-contract"));
    });

    let verdict = run_one(&common::ctx(&layout), "ci-enforcement").unwrap();
    assert!(!verdict.ok);
    assert!(verdict.findings.iter().any(|finding| finding.message.contains("overlaps")));
}

// ============================================================================
// SECTION: Learning Loop
// ============================================================================

/// Tests the learning loop validator passes on the scaffold linkage.
#[test]
fn test_learning_loop_passes_on_scaffold() {
    let dir = tempfile::tempdir().unwrap();
    let layout = common::seed_runtime(dir.path());
    let verdict = run_one(&common::ctx(&layout), "learning-loop").unwrap();
    assert!(verdict.ok, "findings: {:?}", verdict.findings);
}

/// Tests a broken rulebook linkage is rejected.
#[test]
fn test_learning_loop_rejects_broken_linkage() {
    let dir = tempfile::tempdir().unwrap();
    let layout = common::seed_runtime(dir.path());

    let sample = layout.examples_dir().join("demo-learning-sample.json");
    let mut report: Value = serde_json::from_str(&fs::read_to_string(&sample).unwrap()).unwrap();
    report["run_id"] = json!("unlinked-run");
    fs::write(&sample, serde_json::to_string_pretty(&report).unwrap() + "\n").unwrap();

    let verdict = run_one(&common::ctx(&layout), "learning-loop").unwrap();
    assert!(!verdict.ok);
    assert!(verdict.findings.iter().any(|finding| {
        finding.message.contains("no rulebook row links evidence_run_id=unlinked-run")
    }));
}
