// crates/identity-runtime-engine/tests/installer.rs
// ============================================================================
// Module: Installer Tests
// Description: Conflict classification, signatures, backup, and rollback.
// ============================================================================
//! ## Overview
//! Covers the classification table, the same-signature no-op, destructive
//! replace with rollback restoring the pre-install signature, verify, and
//! catalog registration.

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
use std::path::PathBuf;

use identity_runtime_core::Catalog;
use identity_runtime_core::IdentityId;
use identity_runtime_core::hashing::directory_signature;
use identity_runtime_engine::InstallOperation;
use identity_runtime_engine::InstallOptions;
use identity_runtime_engine::install;

/// Writes a small source pack outside the runtime tree.
fn seed_source(root: &Path, marker: &str) -> PathBuf {
    let source = root.join("incoming/fresh");
    fs::create_dir_all(source.join("agents")).unwrap();
    fs::write(source.join("CURRENT_TASK.json"), format!("{{\"marker\": \"{marker}\"}}\n")).unwrap();
    fs::write(source.join("IDENTITY_PROMPT.md"), "# Prompt\n").unwrap();
    fs::write(source.join("TASK_HISTORY.md"), "# Task History\n").unwrap();
    fs::write(source.join("RULEBOOK.jsonl"), "{\"rule_id\":\"r-1\"}\n").unwrap();
    fs::write(source.join("agents/identity.yaml"), "interface: {}\n").unwrap();
    source
}

/// Builds installer options for identity `fresh`.
fn options(source: &Path) -> InstallOptions {
    InstallOptions {
        identity_id: IdentityId::from("fresh"),
        source_pack: Some(source.to_path_buf()),
        target_root: None,
        pack_root: None,
        register: false,
        activate: false,
        destructive_replace: false,
        title: String::new(),
        description: String::new(),
        rollback_ref: None,
        catalog: None,
        now: common::now(),
    }
}

// ============================================================================
// SECTION: Classification Table
// ============================================================================

/// Tests the four classification rows.
#[test]
fn test_classification_table() {
    use identity_runtime_engine::install::ConflictType;
    use identity_runtime_engine::install::InstallAction;
    use identity_runtime_engine::install::classify_conflict;

    assert_eq!(
        classify_conflict("abc", None, false),
        (ConflictType::FreshInstall, InstallAction::GuardedApply)
    );
    assert_eq!(
        classify_conflict("abc", Some("abc"), false),
        (ConflictType::SameSignature, InstallAction::NoOpWithReport)
    );
    assert_eq!(
        classify_conflict("abc", Some("def"), true),
        (ConflictType::DestructiveReplace, InstallAction::GuardedApply)
    );
    assert_eq!(
        classify_conflict("abc", Some("def"), false),
        (ConflictType::CompatibleUpgrade, InstallAction::AbortAndExplain)
    );
}

// ============================================================================
// SECTION: Fresh Install and Same Signature
// ============================================================================

/// Tests a fresh install copies the tree and mirrors its report.
#[test]
fn test_fresh_install_copies_and_reports() {
    let dir = tempfile::tempdir().unwrap();
    let layout = common::seed_runtime(dir.path());
    let source = seed_source(dir.path(), "one");

    let outcome = install::install(&layout, &options(&source), false).unwrap();

    assert_eq!(outcome.exit_code, 0);
    assert_eq!(outcome.report.conflict_type, install::ConflictType::FreshInstall);
    assert_eq!(outcome.report.action, install::InstallAction::GuardedApply);
    assert!(!outcome.report.changed_files.is_empty());
    assert!(outcome.report_path.exists());
    assert!(outcome.mirror_path.unwrap().exists());

    let installed = layout.packs_root().join("fresh");
    assert_eq!(
        directory_signature(&installed).unwrap(),
        directory_signature(&source).unwrap()
    );
}

/// Tests an identical reinstall no-ops: zero bytes copied, mtimes untouched.
#[test]
fn test_same_signature_install_is_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let layout = common::seed_runtime(dir.path());
    let source = seed_source(dir.path(), "one");
    install::install(&layout, &options(&source), false).unwrap();

    let target_task = layout.packs_root().join("fresh/CURRENT_TASK.json");
    let mtime_before = fs::metadata(&target_task).unwrap().modified().unwrap();

    let outcome = install::install(&layout, &options(&source), false).unwrap();

    assert_eq!(outcome.exit_code, 0);
    assert_eq!(outcome.report.conflict_type, install::ConflictType::SameSignature);
    assert_eq!(outcome.report.action, install::InstallAction::NoOpWithReport);
    assert!(outcome.report.changed_files.is_empty());
    assert!(outcome.report.backup_ref.is_empty());
    assert_eq!(fs::metadata(&target_task).unwrap().modified().unwrap(), mtime_before);
}

/// Tests a divergent tree aborts without a destructive flag.
#[test]
fn test_compatible_upgrade_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let layout = common::seed_runtime(dir.path());
    let source = seed_source(dir.path(), "one");
    install::install(&layout, &options(&source), false).unwrap();

    fs::write(source.join("CURRENT_TASK.json"), "{\"marker\": \"two\"}\n").unwrap();
    let before = directory_signature(&layout.packs_root().join("fresh")).unwrap();

    let outcome = install::install(&layout, &options(&source), false).unwrap();

    assert_eq!(outcome.report.conflict_type, install::ConflictType::CompatibleUpgrade);
    assert_eq!(outcome.report.action, install::InstallAction::AbortAndExplain);
    assert_eq!(directory_signature(&layout.packs_root().join("fresh")).unwrap(), before);
}

// ============================================================================
// SECTION: Destructive Replace and Rollback
// ============================================================================

/// Tests replace backs up first and rollback restores the old signature.
#[test]
fn test_destructive_replace_round_trips_via_rollback() {
    let dir = tempfile::tempdir().unwrap();
    let layout = common::seed_runtime(dir.path());
    let source = seed_source(dir.path(), "one");
    install::install(&layout, &options(&source), false).unwrap();
    let pre_install = directory_signature(&layout.packs_root().join("fresh")).unwrap();

    fs::write(source.join("CURRENT_TASK.json"), "{\"marker\": \"two\"}\n").unwrap();
    let mut replace = options(&source);
    replace.destructive_replace = true;
    let outcome = install::install(&layout, &replace, false).unwrap();

    assert_eq!(outcome.report.conflict_type, install::ConflictType::DestructiveReplace);
    assert!(outcome.report.rollback_ref.starts_with("restore_from:"));
    assert!(Path::new(&outcome.report.backup_ref).exists());
    assert_eq!(
        directory_signature(&layout.packs_root().join("fresh")).unwrap(),
        directory_signature(&source).unwrap()
    );

    let mut rollback = options(&source);
    rollback.rollback_ref = Some(outcome.report.rollback_ref.clone());
    install::rollback(&layout, &rollback).unwrap();

    assert_eq!(directory_signature(&layout.packs_root().join("fresh")).unwrap(), pre_install);
}

/// Tests a malformed rollback reference is rejected.
#[test]
fn test_rollback_requires_restore_from_reference() {
    let dir = tempfile::tempdir().unwrap();
    let layout = common::seed_runtime(dir.path());
    let source = seed_source(dir.path(), "one");

    let mut bad = options(&source);
    bad.rollback_ref = Some("backup:/nope".to_string());
    assert!(install::rollback(&layout, &bad).is_err());
}

// ============================================================================
// SECTION: Verify and Registration
// ============================================================================

/// Tests verify accepts the latest report and records what it checked.
#[test]
fn test_install_then_verify_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let layout = common::seed_runtime(dir.path());
    let source = seed_source(dir.path(), "one");
    let installed = install::install(&layout, &options(&source), false).unwrap();

    let outcome = install::verify(&layout, &options(&source)).unwrap();

    assert_eq!(outcome.exit_code, 0);
    assert_eq!(outcome.report.operation, InstallOperation::Verify);
    assert_eq!(outcome.report.action, install::InstallAction::Verified);
    assert_eq!(
        outcome.report.verified_report_id,
        installed.report.report_id.as_str()
    );
}

/// Tests registration inserts an inactive entry and preserves the default.
#[test]
fn test_register_preserves_default_identity() {
    let dir = tempfile::tempdir().unwrap();
    let layout = common::seed_runtime(dir.path());
    let source = seed_source(dir.path(), "one");

    let mut register = options(&source);
    register.register = true;
    register.title = "Fresh".to_string();
    install::install(&layout, &register, false).unwrap();

    let catalog = Catalog::load(&layout.catalog_path()).unwrap();
    assert_eq!(catalog.default_identity.as_str(), "demo");
    let entry = catalog.entry(&IdentityId::from("fresh")).unwrap();
    assert_eq!(entry.status, "inactive");
    assert_eq!(entry.pack_path, "identity/packs/fresh");
}

/// Tests plan emits a report without touching the target.
#[test]
fn test_plan_is_pure() {
    let dir = tempfile::tempdir().unwrap();
    let layout = common::seed_runtime(dir.path());
    let source = seed_source(dir.path(), "one");

    let outcome = install::plan(&layout, &options(&source)).unwrap();

    assert!(outcome.report.dry_run);
    assert!(!layout.packs_root().join("fresh").exists());
    assert!(outcome.report_path.exists());
}
