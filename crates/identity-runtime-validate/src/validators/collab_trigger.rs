// crates/identity-runtime-validate/src/validators/collab_trigger.rs
// ============================================================================
// Module: Collaboration Trigger Validator
// Description: Validates collaboration trigger contracts and blocker logs.
// Purpose: Ensure blockers notify immediately with receipts and dedupe keys.
// Dependencies: identity-runtime-contract, identity-runtime-core
// ============================================================================

//! ## Overview
//! Structural checks ride on the contract model; this validator adds
//! per-log validation of collaboration evidence (identity/task scoping,
//! blocker taxonomy, timestamp ordering and freshness, dedupe keys, chat
//! receipts) and a positive/negative self-test corpus.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;

use identity_runtime_contract::TaskRecord;
use identity_runtime_contract::schemas;
use identity_runtime_contract::schemas::REQUIRED_BLOCKER_TYPES;
use identity_runtime_contract::schemas::REQUIRED_RECEIPT_FIELDS;
use identity_runtime_contract::task::bool_of;
use identity_runtime_contract::task::int_of;
use identity_runtime_contract::task::object_of;
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
// SECTION: Log Parameters
// ============================================================================

/// Expectations one collaboration log is validated against.
struct LogParams<'a> {
    /// Expected identity id.
    identity_id: &'a str,
    /// Expected task id.
    task_id: &'a str,
    /// Maximum notification age in days (`0` disables the check).
    max_log_age_days: i64,
    /// Expected notification channel.
    notify_channel: &'a str,
    /// Require a chat receipt block.
    require_receipt: bool,
    /// Validation clock.
    now: Timestamp,
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// Runs the collaboration trigger validator.
#[must_use]
pub fn run(ctx: &ValidatorContext) -> Verdict {
    let mut log = FindingLog::new();
    log.info(format!("validate collaboration trigger for identity: {}", ctx.identity_id));

    let Some(task) = ctx.load_task(&mut log) else {
        return Verdict::from_log("collab-trigger", log);
    };

    if task.gate_required("collaboration_trigger_gate") {
        log.ok("gates.collaboration_trigger_gate=required");
    } else {
        log.fail(
            FindingKind::Policy,
            "gates.collaboration_trigger_gate",
            "gates.collaboration_trigger_gate must be required",
        );
        return Verdict::from_log("collab-trigger", log);
    }

    let contract_ctx = ctx.contract_ctx();
    schemas::check_blocker_taxonomy(&contract_ctx, &task, &mut log);
    schemas::check_collaboration_trigger(&contract_ctx, &task, &mut log);

    check_evidence_logs(ctx, &task, &mut log);

    if ctx.self_test {
        run_self_test(ctx, &task, &mut log);
    }

    if log.is_ok() {
        log.line("Collaboration trigger validation PASSED");
    } else {
        log.line("Collaboration trigger validation FAILED");
    }
    Verdict::from_log("collab-trigger", log)
}

// ============================================================================
// SECTION: Evidence Logs
// ============================================================================

/// Resolves and validates the collaboration evidence logs.
fn check_evidence_logs(ctx: &ValidatorContext, task: &TaskRecord, log: &mut FindingLog) {
    let Some(contract) = task.contract("collaboration_trigger_contract") else {
        return;
    };
    let pattern = str_of(contract, "evidence_log_path_pattern").unwrap_or_default();
    if pattern.is_empty() {
        log.fail(
            FindingKind::Reference,
            "collaboration_trigger_contract.evidence_log_path_pattern",
            "collaboration_trigger_contract.evidence_log_path_pattern missing",
        );
        return;
    }

    let files = evidence::matches(ctx.layout.root(), pattern).unwrap_or_default();
    let minimum = int_of(contract, "minimum_evidence_logs_required").unwrap_or(1).max(0);
    let found = i64::try_from(files.len()).unwrap_or(i64::MAX);
    if found < minimum {
        log.fail(
            FindingKind::Evidence,
            "collaboration_trigger_contract.evidence_log_path_pattern",
            format!("collaboration evidence logs insufficient: found={found}, required={minimum}"),
        );
        return;
    }

    let task_id = task.task_id();
    let params = LogParams {
        identity_id: ctx.identity_id.as_str(),
        task_id: &task_id,
        max_log_age_days: int_of(contract, "max_log_age_days").unwrap_or(7),
        notify_channel: str_of(contract, "notify_channel").unwrap_or_default(),
        require_receipt: bool_of(contract, "must_emit_receipt_in_chat").unwrap_or(true),
        now: ctx.now,
    };
    for file in &files {
        validate_log_file(file, &params, log);
    }
}

/// Validates one collaboration log file.
fn validate_log_file(path: &Path, params: &LogParams<'_>, log: &mut FindingLog) {
    let source = path.display().to_string();
    let record: Map<String, Value> = match document::load_json_mapping(path) {
        Ok(record) => record,
        Err(err) => {
            log.fail(
                FindingKind::Evidence,
                source,
                format!("invalid collaboration log {}: {err}", path.display()),
            );
            return;
        }
    };
    let issues = log_issues(&record, params);
    if issues.is_empty() {
        log.ok(format!("{source} collaboration log passed"));
    } else {
        for issue in issues {
            log.fail(FindingKind::Evidence, source.clone(), format!("{source} {issue}"));
        }
    }
}

/// Returns the issues of one collaboration log record.
fn log_issues(record: &Map<String, Value>, params: &LogParams<'_>) -> Vec<String> {
    let mut issues = Vec::new();

    let identity = str_of(record, "identity_id").unwrap_or_default();
    if identity != params.identity_id {
        issues.push(format!(
            "identity_id mismatch: expected={}, got={identity}",
            params.identity_id
        ));
    }
    let task_id = str_of(record, "task_id").unwrap_or_default();
    if task_id != params.task_id {
        issues.push(format!("task_id mismatch: expected={}, got={task_id}", params.task_id));
    }

    let blocker = str_of(record, "blocker_type").unwrap_or_default();
    if !REQUIRED_BLOCKER_TYPES.contains(&blocker) {
        issues.push(format!("blocker_type must be one of {REQUIRED_BLOCKER_TYPES:?}"));
    }
    if bool_of(record, "requires_human_collab") != Some(true) {
        issues.push("requires_human_collab must be true".to_string());
    }

    let detected = str_of(record, "detected_at").unwrap_or_default();
    let notified = str_of(record, "notified_at").unwrap_or_default();
    match (Timestamp::parse(detected), Timestamp::parse(notified)) {
        (Ok(detected_at), Ok(notified_at)) => {
            if notified_at.seconds_since(detected_at) < 0 {
                issues.push("notified_at earlier than detected_at".to_string());
            }
            let age = notified_at.age_days(params.now);
            if params.max_log_age_days > 0 && age > params.max_log_age_days {
                issues.push(format!(
                    "notification log too old: age_days={age}, max={}",
                    params.max_log_age_days
                ));
            }
        }
        _ => issues.push("invalid detected/notified timestamp".to_string()),
    }

    let channel = str_of(record, "notify_channel").unwrap_or_default();
    if channel != params.notify_channel {
        issues.push(format!(
            "notify_channel mismatch: expected={}, got={channel}",
            params.notify_channel
        ));
    }

    if str_of(record, "dedupe_key").unwrap_or_default().trim().is_empty() {
        issues.push("dedupe_key missing".to_string());
    }
    if bool_of(record, "state_change_bypass_dedupe") != Some(true) {
        issues.push("state_change_bypass_dedupe must be true".to_string());
    }

    if params.require_receipt {
        match object_of(record, "chat_receipt") {
            Some(receipt) => {
                if bool_of(receipt, "emitted") != Some(true) {
                    issues.push("chat_receipt.emitted must be true".to_string());
                }
                let missing: Vec<&str> = REQUIRED_RECEIPT_FIELDS
                    .iter()
                    .copied()
                    .filter(|field| !receipt.contains_key(*field))
                    .collect();
                if !missing.is_empty() {
                    issues.push(format!("chat_receipt missing fields: {missing:?}"));
                }
            }
            None => issues.push("chat_receipt must be object".to_string()),
        }
    }

    issues
}

// ============================================================================
// SECTION: Self-Test
// ============================================================================

/// Runs the positive/negative sample corpus.
fn run_self_test(ctx: &ValidatorContext, task: &TaskRecord, log: &mut FindingLog) {
    let contract = task.contract("collaboration_trigger_contract").cloned().unwrap_or_default();
    let task_id = task.task_id();
    let params = LogParams {
        identity_id: ctx.identity_id.as_str(),
        task_id: &task_id,
        max_log_age_days: 0,
        notify_channel: str_of(&contract, "notify_channel").unwrap_or_default(),
        require_receipt: true,
        now: ctx.now,
    };
    let sample_root = ctx.layout.examples_dir().join("collaboration-trigger");
    selftest::run_corpus(log, &sample_root, "collaboration trigger", 1, 1, |path| {
        document::load_json_mapping(path)
            .map(|record| log_issues(&record, &params).is_empty())
            .unwrap_or(false)
    });
}
