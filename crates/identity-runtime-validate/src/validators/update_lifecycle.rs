// crates/identity-runtime-validate/src/validators/update_lifecycle.rs
// ============================================================================
// Module: Update Lifecycle Validator
// Description: Validates the update lifecycle contract and replay evidence.
// Purpose: Require a passing replay covering the full patch surface.
// Dependencies: identity-runtime-contract, identity-runtime-core
// ============================================================================

//! ## Overview
//! Beyond the structural lifecycle checks, this validator resolves the replay
//! evidence file and requires `replay_status=PASS`, full coverage of the four
//! patched core files, and every required validation check marked passed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use identity_runtime_contract::TaskRecord;
use identity_runtime_contract::schemas;
use identity_runtime_contract::task::missing_from;
use identity_runtime_contract::task::object_of;
use identity_runtime_contract::task::str_list;
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

/// The four pack surfaces every replay must have patched.
const EXPECTED_SURFACES: &[&str] =
    &["CURRENT_TASK.json", "IDENTITY_PROMPT.md", "RULEBOOK.jsonl", "TASK_HISTORY.md"];

/// Replay evidence fields required when the contract names none.
const DEFAULT_REPLAY_FIELDS: &[&str] =
    &["identity_id", "replay_status", "patched_files", "validation_checks_passed"];

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// Runs the update lifecycle validator.
#[must_use]
pub fn run(ctx: &ValidatorContext) -> Verdict {
    let mut log = FindingLog::new();
    log.info(format!("validate update lifecycle for identity: {}", ctx.identity_id));

    let Some(task) = ctx.load_task(&mut log) else {
        return Verdict::from_log("update-lifecycle", log);
    };

    if task.gate_required("identity_update_gate") {
        log.ok("gates.identity_update_gate=required");
    } else {
        log.fail(
            FindingKind::Policy,
            "gates.identity_update_gate",
            "gates.identity_update_gate must be required",
        );
        return Verdict::from_log("update-lifecycle", log);
    }

    schemas::check_update_lifecycle(&ctx.contract_ctx(), &task, &mut log);

    if task.contract("trigger_regression_contract").is_some() {
        log.ok("trigger_regression_contract present");
    } else {
        log.fail(
            FindingKind::Schema,
            "trigger_regression_contract",
            "missing trigger_regression_contract",
        );
    }

    check_replay_evidence(ctx, &task, &mut log);

    if log.is_ok() {
        log.line("Identity update lifecycle contract validation PASSED");
    }
    Verdict::from_log("update-lifecycle", log)
}

// ============================================================================
// SECTION: Replay Evidence
// ============================================================================

/// Resolves and validates the replay evidence file.
fn check_replay_evidence(ctx: &ValidatorContext, task: &TaskRecord, log: &mut FindingLog) {
    let Some(lifecycle) = task.contract("identity_update_lifecycle_contract") else {
        return;
    };
    let replay = object_of(lifecycle, "replay_contract").cloned().unwrap_or_default();
    let validation = object_of(lifecycle, "validation_contract").cloned().unwrap_or_default();

    let evidence_path = resolve_replay_path(ctx, &replay);
    let Some(evidence_path) = evidence_path else {
        log.fail(
            FindingKind::Evidence,
            "identity_update_lifecycle_contract.replay_contract",
            "replay evidence file not found",
        );
        return;
    };

    let record: Map<String, Value> = match document::load_json_mapping(&evidence_path) {
        Ok(record) => record,
        Err(err) => {
            log.fail(
                FindingKind::Evidence,
                format!("{}", evidence_path.display()),
                format!("replay evidence invalid json: {err}"),
            );
            return;
        }
    };
    log.ok(format!("replay evidence loaded: {}", evidence_path.display()));

    let mut required_fields = str_list(&replay, "required_fields");
    if required_fields.is_empty() {
        required_fields = DEFAULT_REPLAY_FIELDS.iter().map(ToString::to_string).collect();
    }
    let missing: Vec<&String> =
        required_fields.iter().filter(|field| !record.contains_key(field.as_str())).collect();
    if !missing.is_empty() {
        log.fail(
            FindingKind::Evidence,
            format!("{}", evidence_path.display()),
            format!("replay evidence missing fields: {missing:?}"),
        );
        return;
    }

    let identity = str_of(&record, "identity_id").unwrap_or_default();
    if identity != ctx.identity_id.as_str() {
        log.fail(
            FindingKind::Evidence,
            format!("{}", evidence_path.display()),
            format!(
                "replay evidence identity mismatch: expected={}, got={identity}",
                ctx.identity_id
            ),
        );
    }

    let status = str_of(&record, "replay_status").unwrap_or_default();
    if status == "PASS" {
        log.ok("replay evidence replay_status=PASS");
    } else {
        log.fail(
            FindingKind::Evidence,
            format!("{}", evidence_path.display()),
            format!("replay evidence replay_status must be PASS, got={status}"),
        );
    }

    let patched = str_list(&record, "patched_files");
    let missing_surfaces = missing_from(&patched, EXPECTED_SURFACES);
    if missing_surfaces.is_empty() {
        log.ok("replay evidence patched_files covers all mandatory surfaces");
    } else {
        log.fail(
            FindingKind::Evidence,
            format!("{}", evidence_path.display()),
            format!("replay evidence patched_files missing mandatory surfaces: {missing_surfaces:?}"),
        );
    }

    let required_checks = str_list(&validation, "required_checks");
    let passed = str_list(&record, "validation_checks_passed");
    let missing_checks: Vec<&String> =
        required_checks.iter().filter(|check| !passed.contains(check)).collect();
    if missing_checks.is_empty() {
        log.ok("replay evidence validation_checks_passed covers required checks");
    } else {
        log.fail(
            FindingKind::Evidence,
            format!("{}", evidence_path.display()),
            format!(
                "replay evidence validation_checks_passed missing required checks: {missing_checks:?}"
            ),
        );
    }
}

/// Resolves the replay evidence path: pattern match, else the sample default.
fn resolve_replay_path(
    ctx: &ValidatorContext,
    replay: &Map<String, Value>,
) -> Option<std::path::PathBuf> {
    let pattern = str_of(replay, "evidence_path_pattern").unwrap_or_default();
    if !pattern.is_empty() {
        if let Ok(Some(path)) =
            evidence::latest(ctx.layout.root(), pattern, Some(ctx.identity_id.as_str()))
        {
            return Some(path);
        }
    }

    let fallback = ctx
        .layout
        .examples_dir()
        .join(format!("{}-update-replay-sample.json", ctx.identity_id));
    fallback.exists().then_some(fallback)
}
