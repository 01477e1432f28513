// crates/identity-runtime-validate/src/validators/arbitration.rs
// ============================================================================
// Module: Capability Arbitration Validator
// Description: Validates arbitration contracts, records, and metrics linkage.
// Purpose: Keep decision records well-formed and thresholds honest.
// Dependencies: identity-runtime-contract, identity-runtime-core
// ============================================================================

//! ## Overview
//! Decision records must carry the full record schema with a known conflict
//! pair and non-empty inputs. When a route-quality metrics document exists,
//! the sample report's `upgrade_required` must agree with the threshold math
//! over the same metrics. Self-test demands at least two positive and one
//! negative sample.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;

use identity_runtime_contract::TaskRecord;
use identity_runtime_contract::schemas;
use identity_runtime_contract::schemas::REQUIRED_CONFLICT_PAIRS;
use identity_runtime_contract::schemas::REQUIRED_DECISION_FIELDS;
use identity_runtime_contract::task::number_of;
use identity_runtime_contract::task::object_of;
use identity_runtime_contract::task::str_of;
use identity_runtime_core::FindingKind;
use identity_runtime_core::FindingLog;
use identity_runtime_core::document;
use identity_runtime_core::evidence;
use serde_json::Map;
use serde_json::Value;

use crate::context::ValidatorContext;
use crate::selftest;
use crate::verdict::Verdict;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// Runs the capability arbitration validator.
#[must_use]
pub fn run(ctx: &ValidatorContext) -> Verdict {
    let mut log = FindingLog::new();
    log.info(format!("validate capability arbitration for identity: {}", ctx.identity_id));

    let Some(task) = ctx.load_task(&mut log) else {
        return Verdict::from_log("capability-arbitration", log);
    };

    schemas::check_capability_arbitration(&ctx.contract_ctx(), &task, &mut log);

    let Some(contract) = task.contract("capability_arbitration_contract").cloned() else {
        return Verdict::from_log("capability-arbitration", log);
    };

    if let Some((report, source)) = load_sample_report(ctx, &contract, &mut log) {
        check_records(&report, ctx.identity_id.as_str(), true, &source, &mut log);
        check_metrics_linkage(ctx, &task, &contract, &report, &mut log);
    }

    if ctx.self_test {
        run_self_test(ctx, &mut log);
    }

    if log.is_ok() {
        log.line("Capability arbitration contract validation PASSED");
    }
    Verdict::from_log("capability-arbitration", log)
}

// ============================================================================
// SECTION: Sample Report
// ============================================================================

/// Resolves and loads the arbitration sample report.
fn load_sample_report(
    ctx: &ValidatorContext,
    contract: &Map<String, Value>,
    log: &mut FindingLog,
) -> Option<(Map<String, Value>, String)> {
    let default_path = ctx
        .layout
        .examples_dir()
        .join(format!("{}-capability-arbitration-sample.json", ctx.identity_id));
    let report_path = if default_path.exists() {
        default_path
    } else {
        let pattern = str_of(contract, "sample_report_path_pattern").unwrap_or_default();
        match evidence::latest(ctx.layout.root(), pattern, Some(ctx.identity_id.as_str())) {
            Ok(Some(path)) => path,
            _ => {
                log.fail(
                    FindingKind::Evidence,
                    "capability_arbitration_contract.sample_report_path_pattern",
                    format!(
                        "missing capability arbitration sample report: {}",
                        default_path.display()
                    ),
                );
                return None;
            }
        }
    };

    let source = report_path.display().to_string();
    match document::load_json_mapping(&report_path) {
        Ok(report) => Some((report, source)),
        Err(err) => {
            log.fail(
                FindingKind::Evidence,
                source,
                format!("arbitration sample report invalid json: {err}"),
            );
            None
        }
    }
}

/// Validates every decision record in a report.
fn check_records(
    report: &Map<String, Value>,
    identity_id: &str,
    strict_identity: bool,
    source: &str,
    log: &mut FindingLog,
) {
    let Some(records) = report.get("records").and_then(Value::as_array) else {
        log.fail(
            FindingKind::Evidence,
            format!("{source}#records"),
            "report.records must be non-empty list",
        );
        return;
    };
    if records.is_empty() {
        log.fail(
            FindingKind::Evidence,
            format!("{source}#records"),
            "report.records must be non-empty list",
        );
        return;
    }

    let mut clean = true;
    for (index, record) in records.iter().enumerate() {
        let Some(record) = record.as_object() else {
            clean = false;
            log.fail(
                FindingKind::Evidence,
                format!("{source}#{index}"),
                format!("records[{index}] must be object"),
            );
            continue;
        };
        for issue in record_issues(record, identity_id, strict_identity) {
            clean = false;
            log.fail(
                FindingKind::Evidence,
                format!("{source}#{index}"),
                format!("records[{index}] {issue}"),
            );
        }
    }
    if clean {
        log.ok(format!("validated {} arbitration record(s)", records.len()));
    }
}

/// Returns the issues of one decision record.
fn record_issues(
    record: &Map<String, Value>,
    identity_id: &str,
    strict_identity: bool,
) -> Vec<String> {
    let missing: Vec<&str> = REQUIRED_DECISION_FIELDS
        .iter()
        .copied()
        .filter(|field| !record.contains_key(*field))
        .collect();
    if !missing.is_empty() {
        return vec![format!("missing fields: {missing:?}")];
    }

    let mut issues = Vec::new();
    if strict_identity && str_of(record, "identity_id").unwrap_or_default().trim() != identity_id {
        issues.push("identity_id mismatch".to_string());
    }
    let pair = str_of(record, "conflict_pair").unwrap_or_default();
    if !REQUIRED_CONFLICT_PAIRS.contains(&pair) {
        issues.push(format!("conflict_pair must be one of {REQUIRED_CONFLICT_PAIRS:?}"));
    }
    let inputs_ok = object_of(record, "inputs").map(|inputs| !inputs.is_empty()).unwrap_or(false);
    if !inputs_ok {
        issues.push("inputs must be non-empty object".to_string());
    }
    issues
}

// ============================================================================
// SECTION: Metrics Linkage
// ============================================================================

/// Compares the report's trigger claim with the threshold math.
fn check_metrics_linkage(
    ctx: &ValidatorContext,
    task: &TaskRecord,
    contract: &Map<String, Value>,
    report: &Map<String, Value>,
    log: &mut FindingLog,
) {
    let metrics_path = resolve_metrics_path(ctx, task);
    if !metrics_path.exists() {
        return;
    }

    let metrics: Map<String, Value> = match document::load_json_mapping(&metrics_path) {
        Ok(metrics) => metrics,
        Err(err) => {
            log.fail(
                FindingKind::Evidence,
                format!("{}", metrics_path.display()),
                format!("metrics artifact invalid json: {err}"),
            );
            return;
        }
    };

    let thresholds = object_of(contract, "trigger_thresholds").cloned().unwrap_or_default();
    let should_trigger = thresholds_crossed(&metrics, &thresholds);

    match report.get("upgrade_required").and_then(Value::as_bool) {
        Some(reported) => {
            if should_trigger == reported {
                log.ok(format!(
                    "metrics/threshold linkage aligned: should_trigger={should_trigger}, \
                     report.upgrade_required={reported}"
                ));
            } else {
                log.fail(
                    FindingKind::MetricsThreshold,
                    "capability_arbitration_contract.trigger_thresholds",
                    format!(
                        "metrics/threshold linkage mismatch: should_trigger={should_trigger}, \
                         report.upgrade_required={reported}"
                    ),
                );
            }
        }
        None => log.ok(format!(
            "metrics/threshold linkage check skipped: report has no 'upgrade_required' field \
             (computed should_trigger={should_trigger})"
        )),
    }
}

/// Resolves the route-quality metrics path for this identity.
fn resolve_metrics_path(ctx: &ValidatorContext, task: &TaskRecord) -> PathBuf {
    if let Some(path) = &ctx.metrics_path {
        return path.clone();
    }
    task.contract("route_quality_contract")
        .and_then(|contract| str_of(contract, "metrics_output_path"))
        .map_or_else(|| ctx.layout.metrics_path(&ctx.identity_id), |declared| {
            ctx.layout.root().join(declared)
        })
}

/// Mirrors the decider's disjunction over the three failure rates.
fn thresholds_crossed(metrics: &Map<String, Value>, thresholds: &Map<String, Value>) -> bool {
    let misroute = number_of(metrics, "misroute_rate").unwrap_or(0.0);
    let replay_fail = (100.0 - number_of(metrics, "replay_success_rate").unwrap_or(100.0)).max(0.0);
    let first_pass_drop =
        (100.0 - number_of(metrics, "first_pass_success_rate").unwrap_or(100.0)).max(0.0);

    misroute >= number_of(thresholds, "misroute_rate_percent").unwrap_or(f64::MAX)
        || replay_fail >= number_of(thresholds, "replay_failure_rate_percent").unwrap_or(f64::MAX)
        || first_pass_drop
            >= number_of(thresholds, "first_pass_success_drop_percent").unwrap_or(f64::MAX)
}

// ============================================================================
// SECTION: Self-Test
// ============================================================================

/// Runs the arbitration corpus: two positives and one negative minimum.
fn run_self_test(ctx: &ValidatorContext, log: &mut FindingLog) {
    let sample_root = ctx.layout.examples_dir().join("arbitration");
    selftest::run_corpus(log, &sample_root, "arbitration", 2, 1, |path| {
        document::load_json_mapping(path)
            .map(|report| {
                let mut scratch = FindingLog::new();
                check_records(&report, ctx.identity_id.as_str(), false, "sample", &mut scratch);
                scratch.is_ok()
            })
            .unwrap_or(false)
    });
}
