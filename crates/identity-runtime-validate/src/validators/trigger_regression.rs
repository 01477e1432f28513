// crates/identity-runtime-validate/src/validators/trigger_regression.rs
// ============================================================================
// Module: Trigger Regression Validator
// Description: Validates regression suites backing trigger behavior.
// Purpose: Require positive, boundary, and negative suites with clean cases.
// Dependencies: identity-runtime-contract, identity-runtime-core
// ============================================================================

//! ## Overview
//! The trigger regression contract demands a sample report carrying three
//! suites. Each case must carry the full case schema, a `PASS`/`FAIL`
//! result, and boolean expected/observed triggers.

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

/// Suites every regression report must carry.
const REQUIRED_SUITES: &[&str] = &["positive_cases", "boundary_cases", "negative_cases"];

/// Fields every regression case must carry.
const REQUIRED_CASE_FIELDS: &[&str] = &[
    "case_id",
    "input_summary",
    "expected_route",
    "expected_trigger",
    "observed_route",
    "observed_trigger",
    "result",
    "notes",
];

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// Runs the trigger regression validator.
#[must_use]
pub fn run(ctx: &ValidatorContext) -> Verdict {
    let mut log = FindingLog::new();
    log.info(format!("validate trigger regression for identity: {}", ctx.identity_id));

    let Some(task) = ctx.load_task(&mut log) else {
        return Verdict::from_log("trigger-regression", log);
    };

    schemas::check_trigger_regression(&ctx.contract_ctx(), &task, &mut log);

    let Some(contract) = task.contract("trigger_regression_contract") else {
        return Verdict::from_log("trigger-regression", log);
    };
    let pattern = str_of(contract, "sample_report_path_pattern").unwrap_or_default();
    let report_path = match evidence::latest(ctx.layout.root(), pattern, Some(ctx.identity_id.as_str()))
    {
        Ok(Some(path)) => path,
        _ => {
            log.fail(
                FindingKind::Evidence,
                "trigger_regression_contract.sample_report_path_pattern",
                format!("missing trigger regression sample report: {pattern}"),
            );
            return Verdict::from_log("trigger-regression", log);
        }
    };

    match document::load_json_mapping(&report_path) {
        Ok(report) => check_report(&report, &report_path.display().to_string(), &mut log),
        Err(err) => log.fail(
            FindingKind::Evidence,
            format!("{}", report_path.display()),
            format!("trigger regression report invalid json: {err}"),
        ),
    }

    if log.is_ok() {
        log.line("Trigger regression contract validation PASSED");
    }
    Verdict::from_log("trigger-regression", log)
}

// ============================================================================
// SECTION: Report Checks
// ============================================================================

/// Validates every suite and case in the regression report.
fn check_report(report: &Map<String, Value>, source: &str, log: &mut FindingLog) {
    for suite in REQUIRED_SUITES {
        let Some(cases) = report.get(*suite).and_then(Value::as_array) else {
            log.fail(
                FindingKind::Evidence,
                format!("{source}#{suite}"),
                format!("regression report suite {suite} must be a non-empty array"),
            );
            continue;
        };
        if cases.is_empty() {
            log.fail(
                FindingKind::Evidence,
                format!("{source}#{suite}"),
                format!("regression report suite {suite} must be a non-empty array"),
            );
            continue;
        }

        let mut clean = true;
        for (index, case) in cases.iter().enumerate() {
            let Some(case) = case.as_object() else {
                clean = false;
                log.fail(
                    FindingKind::Evidence,
                    format!("{source}#{suite}[{index}]"),
                    format!("{suite}[{index}] must be object"),
                );
                continue;
            };
            for issue in check_case(case, suite, index) {
                clean = false;
                log.fail(FindingKind::Evidence, format!("{source}#{suite}[{index}]"), issue);
            }
        }
        if clean {
            log.ok(format!("suite {suite}: {} case(s) validated", cases.len()));
        }
    }
}

/// Returns the issues of one regression case.
fn check_case(case: &Map<String, Value>, suite: &str, index: usize) -> Vec<String> {
    let mut issues = Vec::new();

    let missing: Vec<&str> = REQUIRED_CASE_FIELDS
        .iter()
        .copied()
        .filter(|field| !case.contains_key(*field))
        .collect();
    if !missing.is_empty() {
        issues.push(format!("{suite}[{index}] missing fields: {missing:?}"));
    }

    let result = case.get("result").and_then(Value::as_str).unwrap_or_default();
    if result != "PASS" && result != "FAIL" {
        issues.push(format!("{suite}[{index}].result must be PASS|FAIL"));
    }
    if !case.get("expected_trigger").map(Value::is_boolean).unwrap_or(false) {
        issues.push(format!("{suite}[{index}].expected_trigger must be bool"));
    }
    if !case.get("observed_trigger").map(Value::is_boolean).unwrap_or(false) {
        issues.push(format!("{suite}[{index}].observed_trigger must be bool"));
    }

    issues
}
