// crates/identity-runtime-validate/src/validators/install_provenance.rs
// ============================================================================
// Module: Install Provenance Validator
// Description: Validates installer provenance and the operation chain.
// Purpose: Require the declared operation chain within a trailing window.
// Dependencies: identity-runtime-contract, identity-runtime-core
// ============================================================================

//! ## Overview
//! Installer evidence must come from the declared installer tool, and the
//! contract's `operations_required` chain must be fully observed among the
//! identity's reports within the trailing 24-hour window ending at the most
//! recent report.

// ============================================================================
// SECTION: Imports
// ============================================================================

use identity_runtime_contract::schemas;
use identity_runtime_contract::task::object_of;
use identity_runtime_contract::task::str_list;
use identity_runtime_contract::task::str_of;
use identity_runtime_core::FindingKind;
use identity_runtime_core::FindingLog;
use identity_runtime_core::Timestamp;
use identity_runtime_core::document;
use identity_runtime_core::evidence;
use serde_json::Map;
use serde_json::Value;

use crate::context::ValidatorContext;
use crate::verdict::Verdict;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Trailing window for the operation chain, in hours.
const CHAIN_WINDOW_HOURS: i64 = 24;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// Runs the install provenance validator.
#[must_use]
pub fn run(ctx: &ValidatorContext) -> Verdict {
    let mut log = FindingLog::new();
    log.info(format!("validate install provenance for identity: {}", ctx.identity_id));

    let Some(task) = ctx.load_task(&mut log) else {
        return Verdict::from_log("install-provenance", log);
    };

    if task.gate_required("install_provenance_gate") {
        log.ok("gates.install_provenance_gate=required");
    } else {
        log.fail(
            FindingKind::Policy,
            "gates.install_provenance_gate",
            "gates.install_provenance_gate must be required",
        );
        return Verdict::from_log("install-provenance", log);
    }

    schemas::check_install_provenance(&ctx.contract_ctx(), &task, &mut log);

    let Some(contract) = task.contract("install_provenance_contract").cloned() else {
        return Verdict::from_log("install-provenance", log);
    };

    let pattern = str_of(&contract, "report_path_pattern").unwrap_or_default().to_string();
    let all_reports = evidence::matches(ctx.layout.root(), &pattern).unwrap_or_default();
    let latest =
        evidence::latest(ctx.layout.root(), &pattern, Some(ctx.identity_id.as_str())).ok().flatten();
    let Some(report_path) = latest else {
        log.fail(
            FindingKind::Evidence,
            "install_provenance_contract.report_path_pattern",
            format!("install provenance report not found: {pattern}"),
        );
        return Verdict::from_log("install-provenance", log);
    };

    let source = report_path.display().to_string();
    let report: Map<String, Value> = match document::load_json_mapping(&report_path) {
        Ok(report) => report,
        Err(err) => {
            log.fail(FindingKind::Evidence, source, format!("install report invalid json: {err}"));
            return Verdict::from_log("install-provenance", log);
        }
    };

    check_latest_report(&contract, &report, ctx.identity_id.as_str(), &source, &mut log);
    check_operation_chain(ctx, &contract, &all_reports, &mut log);

    if log.is_ok() {
        log.ok(format!("install provenance validated: {source}"));
        log.line("Install provenance contract validation PASSED");
    }
    Verdict::from_log("install-provenance", log)
}

// ============================================================================
// SECTION: Latest Report
// ============================================================================

/// Validates the latest report's fields, tool id, and operation.
fn check_latest_report(
    contract: &Map<String, Value>,
    report: &Map<String, Value>,
    identity_id: &str,
    source: &str,
    log: &mut FindingLog,
) {
    let required_fields = str_list(contract, "required_report_fields");
    let missing: Vec<&String> =
        required_fields.iter().filter(|field| !report.contains_key(field.as_str())).collect();
    if !missing.is_empty() {
        log.fail(
            FindingKind::Evidence,
            source,
            format!("install report missing required fields: {missing:?}"),
        );
        return;
    }

    if str_of(report, "identity_id").unwrap_or_default().trim() != identity_id {
        log.fail(FindingKind::Evidence, source, "install report identity_id mismatch");
    }

    let operation = str_of(report, "operation").unwrap_or_default().trim().to_string();
    let allowed = str_list(contract, "operations_required");
    if !allowed.iter().any(|item| item == &operation) {
        log.fail(
            FindingKind::Policy,
            source,
            format!("install report operation not in allowed set: {operation}"),
        );
    }

    let Some(invocation) = object_of(report, "installer_invocation") else {
        log.fail(FindingKind::Evidence, source, "install report installer_invocation must be object");
        return;
    };
    let required_invocation = str_list(contract, "required_invocation_fields");
    let missing_invocation: Vec<&String> = required_invocation
        .iter()
        .filter(|field| !invocation.contains_key(field.as_str()))
        .collect();
    if !missing_invocation.is_empty() {
        log.fail(
            FindingKind::Evidence,
            source,
            format!("installer_invocation missing fields: {missing_invocation:?}"),
        );
    }

    let expected_tool = str_of(contract, "installer_tool_required").unwrap_or_default().trim();
    if str_of(invocation, "tool").unwrap_or_default().trim() != expected_tool {
        log.fail(
            FindingKind::Policy,
            source,
            "installer_invocation.tool mismatch with contract",
        );
    }
}

// ============================================================================
// SECTION: Operation Chain
// ============================================================================

/// Requires the full operation chain within the trailing window.
fn check_operation_chain(
    ctx: &ValidatorContext,
    contract: &Map<String, Value>,
    all_reports: &[std::path::PathBuf],
    log: &mut FindingLog,
) {
    let required_ops = str_list(contract, "operations_required");
    if required_ops.is_empty() {
        return;
    }

    let mut chain: Vec<(Timestamp, String)> = Vec::new();
    for path in all_reports {
        let Ok(report) = document::load_json_mapping(path) else {
            continue;
        };
        if str_of(&report, "identity_id").unwrap_or_default().trim() != ctx.identity_id.as_str() {
            continue;
        }
        let Ok(stamp) = Timestamp::parse(str_of(&report, "generated_at").unwrap_or_default())
        else {
            continue;
        };
        chain.push((stamp, str_of(&report, "operation").unwrap_or_default().trim().to_string()));
    }

    if chain.is_empty() {
        log.fail(
            FindingKind::Evidence,
            "install_provenance_contract.operations_required",
            "no identity-scoped install reports available for operations_required chain validation",
        );
        return;
    }

    let latest = chain.iter().map(|(stamp, _)| *stamp).max().unwrap_or(ctx.now);
    let window_start = latest.minus_hours(CHAIN_WINDOW_HOURS);
    let observed: Vec<&String> = chain
        .iter()
        .filter(|(stamp, _)| *stamp >= window_start)
        .map(|(_, operation)| operation)
        .collect();
    let missing: Vec<&String> =
        required_ops.iter().filter(|op| !observed.iter().any(|seen| seen == op)).collect();
    if missing.is_empty() {
        log.ok(format!("operations_required chain observed within last {CHAIN_WINDOW_HOURS}h"));
    } else {
        log.fail(
            FindingKind::Evidence,
            "install_provenance_contract.operations_required",
            format!(
                "install provenance missing required operation chain entries within last \
                 {CHAIN_WINDOW_HOURS}h: {missing:?}"
            ),
        );
    }
}
