// crates/identity-runtime-validate/src/validators/feedback.rs
// ============================================================================
// Module: Experience Feedback Validator
// Description: Validates feedback governance controls and feedback logs.
// Purpose: Keep instance experience bounded, redacted, and replay-gated.
// Dependencies: identity-runtime-contract, identity-runtime-core
// ============================================================================

//! ## Overview
//! Governance first (retention, denylist, export scope, replay-gated
//! promotion), then the logs: minimum count, latest-log schema and
//! freshness, and no denylisted top-level keys. Sample-report promotion rows
//! must carry `replay_status=PASS`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use identity_runtime_contract::TaskRecord;
use identity_runtime_contract::schemas;
use identity_runtime_contract::task::int_of;
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
use crate::selftest;
use crate::verdict::Verdict;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Fields every feedback record must carry.
const REQUIRED_FEEDBACK_FIELDS: &[&str] = &[
    "feedback_id",
    "identity_id",
    "task_id",
    "run_id",
    "timestamp",
    "context_signature",
    "outcome",
    "failure_type",
    "decision_trace_ref",
    "artifacts",
    "rulebook_delta",
    "replay_status",
];

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// Runs the experience feedback validator.
#[must_use]
pub fn run(ctx: &ValidatorContext) -> Verdict {
    let mut log = FindingLog::new();
    log.info(format!("validate experience feedback governance for identity: {}", ctx.identity_id));

    let Some(task) = ctx.load_task(&mut log) else {
        return Verdict::from_log("experience-feedback", log);
    };

    schemas::check_experience_feedback(&ctx.contract_ctx(), &task, &mut log);
    check_logs(ctx, &task, &mut log);
    check_sample_report(ctx, &task, &mut log);

    if ctx.self_test {
        run_self_test(ctx, &task, &mut log);
    }

    if log.is_ok() {
        log.line("Experience feedback governance validation PASSED");
    }
    Verdict::from_log("experience-feedback", log)
}

// ============================================================================
// SECTION: Feedback Logs
// ============================================================================

/// Resolves and validates the feedback logs.
fn check_logs(ctx: &ValidatorContext, task: &TaskRecord, log: &mut FindingLog) {
    let Some(contract) = task.contract("experience_feedback_contract") else {
        return;
    };
    let pattern = str_of(contract, "feedback_log_path_pattern").unwrap_or_default();
    if pattern.is_empty() {
        return;
    }

    let logs = evidence::matches(ctx.layout.root(), pattern).unwrap_or_default();
    let minimum = int_of(contract, "minimum_logs_required").unwrap_or(1).max(0);
    let found = i64::try_from(logs.len()).unwrap_or(i64::MAX);
    if found < minimum {
        log.fail(
            FindingKind::Evidence,
            "experience_feedback_contract.feedback_log_path_pattern",
            format!("feedback logs count {found} < minimum_logs_required {minimum}"),
        );
        return;
    }

    let Some(latest) = evidence::latest(ctx.layout.root(), pattern, Some(ctx.identity_id.as_str()))
        .ok()
        .flatten()
    else {
        return;
    };
    let source = latest.display().to_string();
    let record: Map<String, Value> = match document::load_json_mapping(&latest) {
        Ok(record) => record,
        Err(err) => {
            log.fail(FindingKind::Evidence, source, format!("invalid feedback log: {err}"));
            return;
        }
    };

    let denylist = str_list(contract, "sensitive_fields_denylist");
    let max_age = int_of(contract, "max_log_age_days").unwrap_or(7);
    let issues = latest_log_issues(&record, ctx.identity_id.as_str(), &denylist, max_age, ctx.now);
    if issues.is_empty() {
        log.ok(format!("feedback logs validated: {found} file(s), latest={source}"));
    } else {
        for issue in issues {
            log.fail(FindingKind::Evidence, source.clone(), issue);
        }
    }
}

/// Returns the issues of the latest feedback record.
fn latest_log_issues(
    record: &Map<String, Value>,
    identity_id: &str,
    denylist: &[String],
    max_age: i64,
    now: Timestamp,
) -> Vec<String> {
    let mut issues = Vec::new();

    let missing: Vec<&str> = REQUIRED_FEEDBACK_FIELDS
        .iter()
        .copied()
        .filter(|field| !record.contains_key(*field))
        .collect();
    if !missing.is_empty() {
        issues.push(format!("latest feedback log missing fields: {missing:?}"));
    }

    let record_identity = str_of(record, "identity_id").unwrap_or_default().trim();
    if record_identity != identity_id {
        issues.push("latest feedback identity_id mismatch".to_string());
    }

    match Timestamp::parse(str_of(record, "timestamp").unwrap_or_default()) {
        Ok(stamp) => {
            let age = stamp.age_days(now);
            if age < 0 {
                issues.push("feedback timestamp is in the future".to_string());
            } else if max_age > 0 && age > max_age {
                issues.push(format!(
                    "latest feedback log too old: {age}d > max_log_age_days={max_age}"
                ));
            }
        }
        Err(err) => issues.push(format!("invalid feedback timestamp: {err}")),
    }

    let top_keys: Vec<String> = record.keys().map(|key| key.to_lowercase()).collect();
    let hits: Vec<&String> =
        denylist.iter().filter(|field| top_keys.contains(&field.to_lowercase())).collect();
    if !hits.is_empty() {
        issues.push(format!("feedback log contains denylisted top-level keys: {hits:?}"));
    }

    issues
}

// ============================================================================
// SECTION: Sample Report
// ============================================================================

/// Validates promotion rows in the feedback sample report, when present.
fn check_sample_report(ctx: &ValidatorContext, task: &TaskRecord, log: &mut FindingLog) {
    let Some(contract) = task.contract("experience_feedback_contract") else {
        return;
    };
    let pattern = str_of(contract, "sample_report_path_pattern").unwrap_or_default();
    if pattern.is_empty() {
        return;
    }
    let Some(report_path) =
        evidence::latest(ctx.layout.root(), pattern, Some(ctx.identity_id.as_str())).ok().flatten()
    else {
        return;
    };

    let source = report_path.display().to_string();
    let Ok(report) = document::load_json_mapping(&report_path) else {
        log.fail(FindingKind::Evidence, source, "feedback sample report invalid json");
        return;
    };

    if promotion_rows_pass(&report) {
        log.ok(format!("feedback sample report checked: {source}"));
    } else {
        log.fail(
            FindingKind::Evidence,
            source,
            "report promotion updates must carry replay_status=PASS",
        );
    }
}

/// Returns `true` when every promotion update carries `replay_status=PASS`.
fn promotion_rows_pass(report: &Map<String, Value>) -> bool {
    let empty = Vec::new();
    let positive = report.get("positive_updates").and_then(Value::as_array).unwrap_or(&empty);
    let negative = report.get("negative_updates").and_then(Value::as_array).unwrap_or(&empty);
    positive.iter().chain(negative.iter()).all(|update| {
        update
            .as_object()
            .map(|update| str_of(update, "replay_status").unwrap_or_default() == "PASS")
            .unwrap_or(false)
    })
}

// ============================================================================
// SECTION: Self-Test
// ============================================================================

/// Runs the positive/negative sample corpus.
fn run_self_test(ctx: &ValidatorContext, task: &TaskRecord, log: &mut FindingLog) {
    let contract = task.contract("experience_feedback_contract").cloned().unwrap_or_default();
    let denylist = str_list(&contract, "sensitive_fields_denylist");
    let sample_root = ctx.layout.examples_dir().join("experience-feedback");
    selftest::run_corpus(log, &sample_root, "experience feedback", 1, 1, |path| {
        document::load_json_mapping(path)
            .map(|record| {
                latest_log_issues(&record, ctx.identity_id.as_str(), &denylist, 0, ctx.now)
                    .is_empty()
            })
            .unwrap_or(false)
    });
}
