// crates/identity-runtime-validate/src/validators/install_safety.rs
// ============================================================================
// Module: Install Safety Validator
// Description: Validates install safety invariants and the latest report.
// Purpose: Enforce conflict/action consistency on installer evidence.
// Dependencies: identity-runtime-contract, identity-runtime-core
// ============================================================================

//! ## Overview
//! After the structural invariants, the latest install report matched by the
//! contract pattern must carry the report schema, belong to the identity,
//! and pair its conflict type with the one permitted action:
//! `same_signature→no_op_with_report`, `destructive_replace→guarded_apply`
//! with backup and rollback refs, `compatible_upgrade→abort_and_explain`,
//! `fresh_install→guarded_apply`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use identity_runtime_contract::schemas;
use identity_runtime_contract::task::str_of;
use identity_runtime_core::FindingKind;
use identity_runtime_core::FindingLog;
use identity_runtime_core::document;
use identity_runtime_core::evidence;
use serde_json::Map;
use serde_json::Value;

use crate::context::ValidatorContext;
use crate::verdict::Verdict;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Fields every install report must carry.
pub const REQUIRED_REPORT_FIELDS: &[&str] = &[
    "report_id",
    "identity_id",
    "generated_at",
    "operation",
    "conflict_type",
    "action",
    "preserved_paths",
];

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// Runs the install safety validator.
#[must_use]
pub fn run(ctx: &ValidatorContext) -> Verdict {
    let mut log = FindingLog::new();
    log.info(format!("validate install safety for identity: {}", ctx.identity_id));

    let Some(task) = ctx.load_task(&mut log) else {
        return Verdict::from_log("install-safety", log);
    };

    if task.gate_required("install_safety_gate") {
        log.ok("gates.install_safety_gate=required");
    } else {
        log.fail(
            FindingKind::Policy,
            "gates.install_safety_gate",
            "gates.install_safety_gate must be required",
        );
        return Verdict::from_log("install-safety", log);
    }

    schemas::check_install_safety(&ctx.contract_ctx(), &task, &mut log);

    let pattern = task
        .contract("install_safety_contract")
        .and_then(|contract| str_of(contract, "install_report_path_pattern"))
        .unwrap_or_default()
        .to_string();
    if pattern.is_empty() {
        return Verdict::from_log("install-safety", log);
    }

    match evidence::latest(ctx.layout.root(), &pattern, Some(ctx.identity_id.as_str())) {
        Ok(Some(report_path)) => {
            let source = report_path.display().to_string();
            match document::load_json_mapping(&report_path) {
                Ok(report) => {
                    check_report(&report, ctx.identity_id.as_str(), &source, &mut log);
                    if log.is_ok() {
                        log.ok(format!("install report validated: {source}"));
                        log.line("Install safety contract validation PASSED");
                    }
                }
                Err(err) => log.fail(
                    FindingKind::Evidence,
                    source,
                    format!("install report invalid json: {err}"),
                ),
            }
        }
        _ => log.fail(
            FindingKind::Evidence,
            "install_safety_contract.install_report_path_pattern",
            format!("install report not found by pattern: {pattern}"),
        ),
    }

    Verdict::from_log("install-safety", log)
}

// ============================================================================
// SECTION: Report Checks
// ============================================================================

/// Validates one install report against the safety invariants.
pub fn check_report(
    report: &Map<String, Value>,
    identity_id: &str,
    source: &str,
    log: &mut FindingLog,
) {
    let missing: Vec<&str> = REQUIRED_REPORT_FIELDS
        .iter()
        .copied()
        .filter(|field| !report.contains_key(*field))
        .collect();
    if !missing.is_empty() {
        log.fail(
            FindingKind::Evidence,
            source,
            format!("install report missing fields: {missing:?}"),
        );
    }

    let report_identity = str_of(report, "identity_id").unwrap_or_default().trim();
    if report_identity != identity_id {
        log.fail(FindingKind::Evidence, source, "install report identity_id mismatch");
    }

    let conflict_type = str_of(report, "conflict_type").unwrap_or_default().trim();
    let action = str_of(report, "action").unwrap_or_default().trim();
    match conflict_type {
        "same_signature" => {
            if action != "no_op_with_report" && action != "verified" {
                log.fail(
                    FindingKind::Policy,
                    source,
                    "same_signature conflict must use action=no_op_with_report",
                );
            }
        }
        "destructive_replace" => {
            let has_backup = str_of(report, "backup_ref").unwrap_or_default().trim();
            let has_rollback = str_of(report, "rollback_ref").unwrap_or_default().trim();
            if has_backup.is_empty() || has_rollback.is_empty() {
                log.fail(
                    FindingKind::Policy,
                    source,
                    "destructive_replace requires backup_ref and rollback_ref",
                );
            }
            if action != "guarded_apply" && action != "verified" {
                log.fail(
                    FindingKind::Policy,
                    source,
                    "destructive_replace requires action=guarded_apply with backup/rollback",
                );
            }
        }
        "compatible_upgrade" => {
            if action != "abort_and_explain" && action != "verified" {
                log.fail(
                    FindingKind::Policy,
                    source,
                    "compatible_upgrade must use action=abort_and_explain per install_safety_contract",
                );
            }
        }
        "fresh_install" => {
            if action != "guarded_apply" && action != "verified" {
                log.fail(FindingKind::Policy, source, "fresh_install must use action=guarded_apply");
            }
        }
        other => {
            log.fail(
                FindingKind::Policy,
                source,
                format!("conflict_type not supported: {other}"),
            );
        }
    }
}
