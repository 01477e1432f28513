// crates/identity-runtime-validate/src/validators/agent_handoff.rs
// ============================================================================
// Module: Agent Handoff Validator
// Description: Validates handoff production logs against the contract.
// Purpose: Keep the metrics exporter fed with well-formed, fresh records.
// Dependencies: identity-runtime-contract, identity-runtime-core
// ============================================================================

//! ## Overview
//! Handoff logs are the raw material of the route-quality metrics exporter.
//! Each record must carry the contract's required fields, belong to the
//! target identity, and be fresh. A self-test corpus exercises the record
//! check against positive and negative samples.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;

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
// SECTION: Entry Point
// ============================================================================

/// Runs the agent handoff validator.
#[must_use]
pub fn run(ctx: &ValidatorContext) -> Verdict {
    let mut log = FindingLog::new();
    log.info(format!("validate agent handoff contract for identity: {}", ctx.identity_id));

    let Some(task) = ctx.load_task(&mut log) else {
        return Verdict::from_log("agent-handoff", log);
    };

    schemas::check_agent_handoff(&ctx.contract_ctx(), &task, &mut log);
    check_logs(ctx, &task, &mut log);

    if ctx.self_test {
        run_self_test(ctx, &task, &mut log);
    }

    if log.is_ok() {
        log.line("Agent handoff contract validation PASSED");
    }
    Verdict::from_log("agent-handoff", log)
}

// ============================================================================
// SECTION: Log Checks
// ============================================================================

/// Resolves and validates the handoff log files.
fn check_logs(ctx: &ValidatorContext, task: &TaskRecord, log: &mut FindingLog) {
    let Some(contract) = task.contract("agent_handoff_contract") else {
        return;
    };
    let pattern = str_of(contract, "handoff_log_path_pattern").unwrap_or_default();
    if pattern.is_empty() {
        return;
    }

    let files = evidence::matches(ctx.layout.root(), pattern).unwrap_or_default();
    let minimum = int_of(contract, "minimum_logs_required").unwrap_or(1).max(0);
    let found = i64::try_from(files.len()).unwrap_or(i64::MAX);
    if found < minimum {
        log.fail(
            FindingKind::Evidence,
            "agent_handoff_contract.handoff_log_path_pattern",
            format!("no sufficient handoff logs: found={found}, required={minimum}"),
        );
        return;
    }

    let required_fields = str_list(contract, "required_fields");
    let max_age = int_of(contract, "max_log_age_days").unwrap_or(7);
    for file in &files {
        validate_log_file(file, ctx, &required_fields, max_age, log);
    }
}

/// Validates one handoff log file.
fn validate_log_file(
    path: &Path,
    ctx: &ValidatorContext,
    required_fields: &[String],
    max_age: i64,
    log: &mut FindingLog,
) {
    let source = path.display().to_string();
    match document::load_json_mapping(path) {
        Ok(record) => {
            let issues = record_issues(&record, ctx.identity_id.as_str(), required_fields, max_age, ctx.now);
            if issues.is_empty() {
                log.ok(format!("{source} handoff log passed"));
            } else {
                for issue in issues {
                    log.fail(FindingKind::Evidence, source.clone(), format!("{source} {issue}"));
                }
            }
        }
        Err(err) => {
            log.fail(FindingKind::Evidence, source, format!("invalid handoff log: {err}"));
        }
    }
}

/// Returns the issues of one handoff record.
fn record_issues(
    record: &Map<String, Value>,
    identity_id: &str,
    required_fields: &[String],
    max_age: i64,
    now: Timestamp,
) -> Vec<String> {
    let mut issues = Vec::new();

    let missing: Vec<&String> =
        required_fields.iter().filter(|field| !record.contains_key(field.as_str())).collect();
    if !missing.is_empty() {
        issues.push(format!("missing fields: {missing:?}"));
    }

    let record_identity = str_of(record, "identity_id").unwrap_or_default();
    if record_identity != identity_id {
        issues.push(format!("identity_id mismatch: expected={identity_id}, got={record_identity}"));
    }

    if record.get("route_decision").map(|value| !value.is_object()).unwrap_or(false) {
        issues.push("route_decision must be object".to_string());
    }

    if let Some(stamp) = str_of(record, "timestamp") {
        match Timestamp::parse(stamp) {
            Ok(parsed) => {
                let age = parsed.age_days(now);
                if age < 0 {
                    issues.push("timestamp is in the future".to_string());
                } else if max_age > 0 && age > max_age {
                    issues.push(format!("handoff log too old: age_days={age}, max={max_age}"));
                }
            }
            Err(err) => issues.push(format!("invalid timestamp: {err}")),
        }
    }

    issues
}

// ============================================================================
// SECTION: Self-Test
// ============================================================================

/// Runs the positive/negative sample corpus.
fn run_self_test(ctx: &ValidatorContext, task: &TaskRecord, log: &mut FindingLog) {
    let contract = task.contract("agent_handoff_contract").cloned().unwrap_or_default();
    let required_fields = str_list(&contract, "required_fields");
    let sample_root = ctx.layout.examples_dir().join("agent-handoff");
    selftest::run_corpus(log, &sample_root, "agent handoff", 1, 1, |path| {
        document::load_json_mapping(path)
            .map(|record| {
                record_issues(&record, ctx.identity_id.as_str(), &required_fields, 0, ctx.now)
                    .is_empty()
            })
            .unwrap_or(false)
    });
}
