// crates/identity-runtime-contract/src/schemas.rs
// ============================================================================
// Module: Contract Invariant Checks
// Description: Per-contract invariant checks over the task record.
// Purpose: Enforce the composite contract model one named contract at a time.
// Dependencies: crate::{task, validate}, identity-runtime-core
// ============================================================================

//! ## Overview
//! One check function per registered contract. Checks accumulate findings
//! with stable `<contract>.<field>` identifiers and never short-circuit.
//! Checks that reference evidence files resolve them through the core
//! evidence helper and enforce freshness against the context clock.

// ============================================================================
// SECTION: Imports
// ============================================================================

use identity_runtime_core::FindingKind;
use identity_runtime_core::FindingLog;
use identity_runtime_core::Timestamp;
use identity_runtime_core::evidence;
use serde_json::Map;
use serde_json::Value;

use crate::task::TaskRecord;
use crate::task::bool_of;
use crate::task::contains_all;
use crate::task::int_of;
use crate::task::list_of;
use crate::task::missing_from;
use crate::task::number_of;
use crate::task::object_of;
use crate::task::str_list;
use crate::task::str_of;
use crate::validate::ValidationContext;

// ============================================================================
// SECTION: Shared Constants
// ============================================================================

/// States every task state machine must include.
const REQUIRED_STATES: &[&str] = &["intake", "analyze", "execute", "verify", "done", "blocked"];

/// Mandatory per-attempt fields for the reasoning loop.
const REQUIRED_ATTEMPT_FIELDS: &[&str] =
    &["attempt", "hypothesis", "patch", "expected_effect", "result"];

/// Rulebook row schema every rulebook contract must cover.
const RULEBOOK_ROW_FIELDS: &[&str] =
    &["rule_id", "type", "trigger", "action", "evidence_run_id", "scope", "confidence", "updated_at"];

/// Blocker classes every taxonomy must carry.
pub const REQUIRED_BLOCKER_TYPES: &[&str] =
    &["login_required", "captcha_required", "session_expired", "manual_verification_required"];

/// Classification fields every blocker taxonomy must require.
pub const REQUIRED_TAXONOMY_FIELDS: &[&str] =
    &["blocker_type", "source", "detected_at", "requires_human_collab", "next_action"];

/// Receipt fields every collaboration trigger contract must require.
pub const REQUIRED_RECEIPT_FIELDS: &[&str] =
    &["event_id", "blocker_type", "notified_at", "channel", "dedupe_key", "status"];

/// Arbitration conflict pairs every contract must rule on.
pub const REQUIRED_CONFLICT_PAIRS: &[&str] = &[
    "judgement_vs_routing",
    "reasoning_vs_latency",
    "routing_vs_learning",
    "learning_vs_hotfix",
];

/// Arbitration priority order, verbatim.
pub const REQUIRED_PRIORITY_ORDER: &[&str] =
    &["accurate_judgement", "governance", "latency", "exploration"];

/// Decision record fields every arbitration contract must require.
pub const REQUIRED_DECISION_FIELDS: &[&str] = &[
    "arbitration_id",
    "task_id",
    "identity_id",
    "conflict_pair",
    "inputs",
    "decision",
    "impact",
    "rationale",
    "decided_at",
];

/// Knowledge evidence fields every acquisition contract must require.
pub const REQUIRED_KNOWLEDGE_FIELDS: &[&str] =
    &["claim", "source", "source_level", "confidence", "expiry", "applies_to"];

/// Failure classes every orchestration contract must classify.
const REQUIRED_FAIL_CLASSES: &[&str] =
    &["route_wrong", "skill_gap", "mcp_unavailable", "tool_auth", "data_issue"];

/// Export scopes permitted by the feedback governance contract.
const ALLOWED_EXPORT_SCOPES: &[&str] = &["instance-only", "aggregated-only"];

// ============================================================================
// SECTION: Shared Helpers
// ============================================================================

/// Fetches a contract mapping, recording a schema finding when absent.
fn require_contract<'a>(
    task: &'a TaskRecord,
    name: &str,
    log: &mut FindingLog,
) -> Option<&'a Map<String, Value>> {
    match task.contract(name) {
        Some(map) => Some(map),
        None => {
            log.fail(FindingKind::Schema, name, format!("missing {name}"));
            None
        }
    }
}

/// Records schema findings for keys absent from a contract mapping.
fn require_keys(map: &Map<String, Value>, name: &str, keys: &[&str], log: &mut FindingLog) -> bool {
    let missing: Vec<&str> = keys.iter().copied().filter(|key| !map.contains_key(*key)).collect();
    if missing.is_empty() {
        return true;
    }
    for key in missing {
        log.fail(FindingKind::Schema, format!("{name}.{key}"), format!("{name} missing field: {key}"));
    }
    false
}

/// Checks a flag field equals `true`.
fn require_true(map: &Map<String, Value>, name: &str, key: &str, log: &mut FindingLog) {
    if bool_of(map, key) == Some(true) {
        log.ok(format!("{name}.{key}=true"));
    } else {
        log.fail(FindingKind::Schema, format!("{name}.{key}"), format!("{name}.{key} must be true"));
    }
}

/// Checks a string field equals an expected literal.
fn require_str_eq(
    map: &Map<String, Value>,
    name: &str,
    key: &str,
    expected: &str,
    log: &mut FindingLog,
) {
    let got = str_of(map, key).unwrap_or_default().trim().to_string();
    if got == expected {
        log.ok(format!("{name}.{key}={expected}"));
    } else {
        log.fail(
            FindingKind::Schema,
            format!("{name}.{key}"),
            format!("{name}.{key} must be {expected:?}, got {got:?}"),
        );
    }
}

/// Checks an integer field is strictly positive.
fn require_positive_int(map: &Map<String, Value>, name: &str, key: &str, log: &mut FindingLog) {
    match int_of(map, key) {
        Some(value) if value > 0 => log.ok(format!("{name}.{key}={value}")),
        _ => log.fail(
            FindingKind::Schema,
            format!("{name}.{key}"),
            format!("{name}.{key} must be a positive integer"),
        ),
    }
}

/// Checks a list field is present and non-empty.
fn require_non_empty_list(map: &Map<String, Value>, name: &str, key: &str, log: &mut FindingLog) {
    match list_of(map, key) {
        Some(items) if !items.is_empty() => log.ok(format!("{name}.{key} is non-empty")),
        _ => log.fail(
            FindingKind::Schema,
            format!("{name}.{key}"),
            format!("{name}.{key} must be a non-empty array"),
        ),
    }
}

/// Renders a protocol source signature (`repo::path` or bare URL).
fn source_signature(item: &Map<String, Value>) -> Option<String> {
    match (str_of(item, "repo"), str_of(item, "path")) {
        (Some(repo), Some(path)) => Some(format!("{repo}::{path}")),
        _ => str_of(item, "url").map(ToString::to_string),
    }
}

/// Checks an evidence timestamp is not in the future and within age bounds.
fn check_freshness(
    stamp: &str,
    max_age_days: i64,
    now: Timestamp,
    id: &str,
    log: &mut FindingLog,
) {
    match Timestamp::parse(stamp) {
        Ok(parsed) => {
            let age = parsed.age_days(now);
            if age < 0 {
                log.fail(FindingKind::Evidence, id, format!("{id} timestamp is in the future"));
            } else if max_age_days > 0 && age > max_age_days {
                log.fail(
                    FindingKind::Evidence,
                    id,
                    format!("{id} too old: age_days={age}, max={max_age_days}"),
                );
            } else {
                log.ok(format!("{id} freshness: {age}d <= {max_age_days}d"));
            }
        }
        Err(err) => {
            log.fail(FindingKind::Evidence, id, format!("{id} invalid timestamp: {err}"));
        }
    }
}

// ============================================================================
// SECTION: Skeleton Contracts
// ============================================================================

/// Checks the `objective` block.
pub fn check_objective(_ctx: &ValidationContext, task: &TaskRecord, log: &mut FindingLog) {
    let Some(objective) = require_contract(task, "objective", log) else {
        return;
    };
    require_keys(objective, "objective", &["title", "priority", "status"], log);
}

/// Checks the `state_machine` block.
pub fn check_state_machine(_ctx: &ValidationContext, task: &TaskRecord, log: &mut FindingLog) {
    let Some(machine) = require_contract(task, "state_machine", log) else {
        return;
    };

    let states = str_list(machine, "allowed_states");
    let missing = missing_from(&states, REQUIRED_STATES);
    if missing.is_empty() {
        log.ok("state_machine.allowed_states covers the mandatory state set");
    } else {
        log.fail(
            FindingKind::Schema,
            "state_machine.allowed_states",
            format!("state_machine.allowed_states missing states: {missing:?}"),
        );
    }

    let current = str_of(machine, "current_state").unwrap_or_default();
    if states.iter().any(|state| state == current) {
        log.ok(format!("state_machine.current_state={current}"));
    } else {
        log.fail(
            FindingKind::Schema,
            "state_machine.current_state",
            format!("state_machine.current_state {current:?} not in allowed_states"),
        );
    }

    for (index, rule) in str_list(machine, "transition_rules").iter().enumerate() {
        let Some((from, to)) = rule.split_once("->") else {
            log.fail(
                FindingKind::Schema,
                format!("state_machine.transition_rules[{index}]"),
                format!("transition rule must be an arrow between states: {rule:?}"),
            );
            continue;
        };
        let from = from.trim();
        let to = to.trim();
        if !states.iter().any(|state| state == from) || !states.iter().any(|state| state == to) {
            log.fail(
                FindingKind::Schema,
                format!("state_machine.transition_rules[{index}]"),
                format!("transition rule references unknown state: {rule:?}"),
            );
        }
    }
}

/// Checks the `source_of_truth` block.
pub fn check_source_of_truth(_ctx: &ValidationContext, task: &TaskRecord, log: &mut FindingLog) {
    let Some(source) = require_contract(task, "source_of_truth", log) else {
        return;
    };
    for key in ["local_docs_roots", "local_project_evidence_roots"] {
        if list_of(source, key).is_none() {
            log.fail(
                FindingKind::Schema,
                format!("source_of_truth.{key}"),
                format!("source_of_truth.{key} must be an array"),
            );
        }
    }
}

/// Checks the `escalation_policy` block.
pub fn check_escalation_policy(_ctx: &ValidationContext, task: &TaskRecord, log: &mut FindingLog) {
    let Some(policy) = require_contract(task, "escalation_policy", log) else {
        return;
    };
    if bool_of(policy, "email_for_offline_only").is_none() {
        log.fail(
            FindingKind::Schema,
            "escalation_policy.email_for_offline_only",
            "escalation_policy.email_for_offline_only must be a boolean",
        );
    }
    if list_of(policy, "do_not_email_for").is_none() {
        log.fail(
            FindingKind::Schema,
            "escalation_policy.do_not_email_for",
            "escalation_policy.do_not_email_for must be an array",
        );
    }
}

/// Checks the `evaluation_contract` block.
pub fn check_evaluation(_ctx: &ValidationContext, task: &TaskRecord, log: &mut FindingLog) {
    let Some(contract) = require_contract(task, "evaluation_contract", log) else {
        return;
    };

    let mut triplet = str_list(contract, "required_evidence_triplet");
    triplet.sort();
    if triplet == ["api_evidence", "event_evidence", "ui_evidence"] {
        log.ok("evaluation_contract.required_evidence_triplet contains api/event/ui");
    } else {
        log.fail(
            FindingKind::Schema,
            "evaluation_contract.required_evidence_triplet",
            "evaluation_contract.required_evidence_triplet must include api/event/ui evidence",
        );
    }

    require_true(contract, "evaluation_contract", "consistency_required", log);
    require_str_eq(
        contract,
        "evaluation_contract",
        "consistency_fail_action",
        "block_done_and_trigger_recheck",
        log,
    );
}

/// Checks the `reasoning_loop_contract` block.
pub fn check_reasoning_loop(_ctx: &ValidationContext, task: &TaskRecord, log: &mut FindingLog) {
    let Some(contract) = require_contract(task, "reasoning_loop_contract", log) else {
        return;
    };

    match int_of(contract, "max_attempts_before_escalation") {
        Some(value) if value >= 1 => {
            log.ok(format!("reasoning_loop_contract.max_attempts_before_escalation={value}"));
        }
        _ => log.fail(
            FindingKind::Schema,
            "reasoning_loop_contract.max_attempts_before_escalation",
            "reasoning_loop_contract.max_attempts_before_escalation must be >= 1",
        ),
    }

    let fields = str_list(contract, "mandatory_fields_per_attempt");
    if contains_all(&fields, REQUIRED_ATTEMPT_FIELDS) {
        log.ok("reasoning_loop_contract mandatory attempt fields complete");
    } else {
        log.fail(
            FindingKind::Schema,
            "reasoning_loop_contract.mandatory_fields_per_attempt",
            "reasoning_loop_contract.mandatory_fields_per_attempt missing required fields",
        );
    }
}

/// Checks the `routing_contract` block.
pub fn check_routing(_ctx: &ValidationContext, task: &TaskRecord, log: &mut FindingLog) {
    let Some(contract) = require_contract(task, "routing_contract", log) else {
        return;
    };

    require_true(contract, "routing_contract", "auto_route_enabled", log);

    let routes = object_of(contract, "problem_type_routes");
    match routes {
        Some(map) if !map.is_empty() => {
            log.ok("routing_contract.problem_type_routes is non-empty");
            let gap = map.get("capability_gap").and_then(Value::as_array);
            let has_creator = gap
                .map(|items| items.iter().filter_map(Value::as_str).any(|item| item == "identity-creator"))
                .unwrap_or(false);
            if has_creator {
                log.ok("capability_gap route includes identity-creator");
            } else {
                log.fail(
                    FindingKind::Schema,
                    "routing_contract.problem_type_routes.capability_gap",
                    "routing_contract.problem_type_routes.capability_gap must include identity-creator",
                );
            }
        }
        _ => log.fail(
            FindingKind::Schema,
            "routing_contract.problem_type_routes",
            "routing_contract.problem_type_routes must be non-empty object",
        ),
    }
}

/// Checks the `rulebook_contract` block and the rulebook rows it governs.
pub fn check_rulebook(ctx: &ValidationContext, task: &TaskRecord, log: &mut FindingLog) {
    let Some(contract) = require_contract(task, "rulebook_contract", log) else {
        return;
    };

    require_true(contract, "rulebook_contract", "append_only", log);

    let required_fields = str_list(contract, "required_fields");
    if contains_all(&required_fields, RULEBOOK_ROW_FIELDS) {
        log.ok("rulebook_contract.required_fields covers the rulebook row schema");
    } else {
        log.fail(
            FindingKind::Schema,
            "rulebook_contract.required_fields",
            "rulebook_contract.required_fields must cover the rulebook row schema",
        );
    }

    let declared = str_of(contract, "rulebook_path").unwrap_or_default().trim().to_string();
    if declared.is_empty() {
        log.fail(
            FindingKind::Reference,
            "rulebook_contract.rulebook_path",
            "rulebook_contract.rulebook_path missing",
        );
        return;
    }
    let rulebook_path = ctx.root.join(&declared);
    if !rulebook_path.exists() {
        log.fail(
            FindingKind::Reference,
            "rulebook_contract.rulebook_path",
            format!("rulebook_contract.rulebook_path not found: {declared}"),
        );
        return;
    }
    log.ok(format!("rulebook exists: {declared}"));

    let Ok(text) = std::fs::read_to_string(&rulebook_path) else {
        log.fail(
            FindingKind::Io,
            "rulebook_contract.rulebook_path",
            format!("failed to read rulebook: {declared}"),
        );
        return;
    };
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|line| !line.is_empty()).collect();
    if lines.is_empty() {
        log.fail(FindingKind::Evidence, &declared, "rulebook file is empty");
        return;
    }

    let mut ok_rows = 0usize;
    for (index, line) in lines.iter().take(50).enumerate() {
        let row: Result<Map<String, Value>, _> = serde_json::from_str(line);
        match row {
            Ok(row) => {
                let missing: Vec<&String> = required_fields
                    .iter()
                    .filter(|field| !row.contains_key(field.as_str()))
                    .collect();
                if missing.is_empty() {
                    ok_rows += 1;
                } else {
                    log.fail(
                        FindingKind::Evidence,
                        format!("{declared}#{index}"),
                        format!("rulebook line {} missing fields: {missing:?}", index + 1),
                    );
                }
            }
            Err(err) => log.fail(
                FindingKind::Evidence,
                format!("{declared}#{index}"),
                format!("rulebook line {} invalid json: {err}", index + 1),
            ),
        }
    }
    if ok_rows > 0 {
        log.ok(format!("validated {ok_rows} rulebook rows against required_fields"));
    }
}

// ============================================================================
// SECTION: Lifecycle Contracts
// ============================================================================

/// Checks the `protocol_review_contract` block and its evidence file.
pub fn check_protocol_review(ctx: &ValidationContext, task: &TaskRecord, log: &mut FindingLog) {
    let Some(contract) = require_contract(task, "protocol_review_contract", log) else {
        return;
    };

    let before = str_list(contract, "required_before");
    if contains_all(&before, &["identity_capability_upgrade", "identity_architecture_decision"]) {
        log.ok("protocol_review_contract.required_before contains upgrade + architecture scope");
    } else {
        log.fail(
            FindingKind::Schema,
            "protocol_review_contract.required_before",
            "protocol_review_contract.required_before must include identity_capability_upgrade \
             and identity_architecture_decision",
        );
    }

    require_non_empty_list(contract, "protocol_review_contract", "must_review_sources", log);
    require_non_empty_list(contract, "protocol_review_contract", "required_evidence_fields", log);
    require_positive_int(contract, "protocol_review_contract", "max_review_age_days", log);

    let pattern = str_of(contract, "evidence_report_path_pattern").unwrap_or_default().to_string();
    if pattern.is_empty() {
        log.fail(
            FindingKind::Reference,
            "protocol_review_contract.evidence_report_path_pattern",
            "protocol_review_contract.evidence_report_path_pattern missing",
        );
        return;
    }

    let latest = evidence::latest(&ctx.root, &pattern, Some(ctx.identity_id.as_str()));
    let Ok(Some(evidence_path)) = latest else {
        log.fail(
            FindingKind::Evidence,
            "protocol_review_contract.evidence_report_path_pattern",
            format!("no protocol review evidence file matched: {pattern}"),
        );
        return;
    };
    log.ok(format!("found protocol review evidence: {}", evidence_path.display()));

    let Ok(record) = identity_runtime_core::document::load_json_mapping(&evidence_path) else {
        log.fail(
            FindingKind::Evidence,
            format!("{}", evidence_path.display()),
            "protocol review evidence invalid json",
        );
        return;
    };

    let required_fields = str_list(contract, "required_evidence_fields");
    let missing: Vec<&String> =
        required_fields.iter().filter(|field| !record.contains_key(field.as_str())).collect();
    if missing.is_empty() {
        log.ok("protocol review evidence required fields present");
    } else {
        log.fail(
            FindingKind::Evidence,
            format!("{}", evidence_path.display()),
            format!("protocol review evidence missing fields: {missing:?}"),
        );
    }

    let reviewer = str_of(&record, "reviewer_identity").unwrap_or_default().trim().to_string();
    if !reviewer.is_empty() && reviewer != ctx.identity_id.as_str() {
        log.fail(
            FindingKind::Evidence,
            format!("{}", evidence_path.display()),
            format!(
                "protocol review evidence reviewer_identity mismatch: expected={}, got={reviewer}",
                ctx.identity_id
            ),
        );
    }

    let reviewed: Vec<String> = list_of(&record, "sources_reviewed")
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_object)
                .filter_map(source_signature)
                .collect()
        })
        .unwrap_or_default();
    let expected: Vec<String> = list_of(contract, "must_review_sources")
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_object)
                .filter_map(source_signature)
                .collect()
        })
        .unwrap_or_default();
    let uncovered: Vec<&String> =
        expected.iter().filter(|signature| !reviewed.contains(signature)).collect();
    if uncovered.is_empty() {
        log.ok("protocol review evidence covers mandatory sources");
    } else {
        log.fail(
            FindingKind::Evidence,
            format!("{}", evidence_path.display()),
            format!("protocol review evidence missing mandatory source(s): {uncovered:?}"),
        );
    }

    if let Some(reviewed_at) = str_of(&record, "reviewed_at") {
        let max_age = int_of(contract, "max_review_age_days").unwrap_or(0);
        check_freshness(reviewed_at, max_age, ctx.now, "protocol review evidence", log);
    }
}

/// Checks the `identity_update_lifecycle_contract` block.
pub fn check_update_lifecycle(_ctx: &ValidationContext, task: &TaskRecord, log: &mut FindingLog) {
    let Some(contract) = require_contract(task, "identity_update_lifecycle_contract", log) else {
        return;
    };

    let complete = require_keys(
        contract,
        "identity_update_lifecycle_contract",
        &["trigger_contract", "patch_surface_contract", "validation_contract", "replay_contract"],
        log,
    );
    if !complete {
        return;
    }

    let trigger = object_of(contract, "trigger_contract").cloned().unwrap_or_default();
    require_keys(
        &trigger,
        "identity_update_lifecycle_contract.trigger_contract",
        &["mandatory_conditions", "max_attempts_before_update"],
        log,
    );

    let patch = object_of(contract, "patch_surface_contract").cloned().unwrap_or_default();
    require_keys(
        &patch,
        "identity_update_lifecycle_contract.patch_surface_contract",
        &["required_files", "required_rulebook_update"],
        log,
    );
    let required_files = str_list(&patch, "required_files");
    let expected_files =
        ["CURRENT_TASK.json", "IDENTITY_PROMPT.md", "RULEBOOK.jsonl", "TASK_HISTORY.md"];
    let missing_files = missing_from(&required_files, &expected_files);
    if missing_files.is_empty() {
        log.ok("patch_surface_contract.required_files contains all mandatory surfaces");
    } else {
        log.fail(
            FindingKind::Schema,
            "identity_update_lifecycle_contract.patch_surface_contract.required_files",
            format!("patch_surface_contract.required_files missing expected files: {missing_files:?}"),
        );
    }

    let validation = object_of(contract, "validation_contract").cloned().unwrap_or_default();
    require_keys(
        &validation,
        "identity_update_lifecycle_contract.validation_contract",
        &["required_checks", "must_pass_all"],
        log,
    );
    let required_checks = str_list(&validation, "required_checks");
    let missing_checks = missing_from(&required_checks, crate::model::UPGRADE_QUORUM_CHECKS);
    if missing_checks.is_empty() {
        log.ok("validation_contract.required_checks contains mandatory validators");
    } else {
        log.fail(
            FindingKind::Policy,
            "identity_update_lifecycle_contract.validation_contract.required_checks",
            format!("validation_contract.required_checks missing expected checks: {missing_checks:?}"),
        );
    }

    let replay = object_of(contract, "replay_contract").cloned().unwrap_or_default();
    require_keys(
        &replay,
        "identity_update_lifecycle_contract.replay_contract",
        &["replay_required", "replay_same_case_required", "replay_fail_action"],
        log,
    );
}

/// Checks the `trigger_regression_contract` block.
pub fn check_trigger_regression(_ctx: &ValidationContext, task: &TaskRecord, log: &mut FindingLog) {
    let Some(contract) = require_contract(task, "trigger_regression_contract", log) else {
        return;
    };

    let complete = require_keys(
        contract,
        "trigger_regression_contract",
        &["required", "required_suites", "result_enum", "sample_report_path_pattern", "fail_action"],
        log,
    );
    if !complete {
        return;
    }

    require_true(contract, "trigger_regression_contract", "required", log);

    let suites = str_list(contract, "required_suites");
    let missing =
        missing_from(&suites, &["positive_cases", "boundary_cases", "negative_cases"]);
    if missing.is_empty() {
        log.ok("trigger_regression_contract.required_suites covers positive/boundary/negative");
    } else {
        log.fail(
            FindingKind::Schema,
            "trigger_regression_contract.required_suites",
            format!("trigger_regression_contract.required_suites missing: {missing:?}"),
        );
    }

    let result_enum = str_list(contract, "result_enum");
    if contains_all(&result_enum, &["PASS", "FAIL"]) {
        log.ok("trigger_regression_contract.result_enum covers PASS|FAIL");
    } else {
        log.fail(
            FindingKind::Schema,
            "trigger_regression_contract.result_enum",
            "trigger_regression_contract.result_enum must cover PASS and FAIL",
        );
    }
}

// ============================================================================
// SECTION: Collaboration Contracts
// ============================================================================

/// Checks the `blocker_taxonomy_contract` block.
pub fn check_blocker_taxonomy(_ctx: &ValidationContext, task: &TaskRecord, log: &mut FindingLog) {
    let Some(contract) = require_contract(task, "blocker_taxonomy_contract", log) else {
        return;
    };

    require_true(contract, "blocker_taxonomy_contract", "required", log);

    let blockers = str_list(contract, "required_blocker_types");
    let missing = missing_from(&blockers, REQUIRED_BLOCKER_TYPES);
    if missing.is_empty() {
        log.ok("blocker taxonomy includes required blocker classes");
    } else {
        log.fail(
            FindingKind::Schema,
            "blocker_taxonomy_contract.required_blocker_types",
            format!("blocker_taxonomy_contract.required_blocker_types missing: {missing:?}"),
        );
    }

    let fields = str_list(contract, "blocker_classification_required_fields");
    let missing_fields = missing_from(&fields, REQUIRED_TAXONOMY_FIELDS);
    if missing_fields.is_empty() {
        log.ok("blocker taxonomy required classification fields complete");
    } else {
        log.fail(
            FindingKind::Schema,
            "blocker_taxonomy_contract.blocker_classification_required_fields",
            format!(
                "blocker_taxonomy_contract.blocker_classification_required_fields missing: \
                 {missing_fields:?}"
            ),
        );
    }
}

/// Checks the `collaboration_trigger_contract` block.
pub fn check_collaboration_trigger(
    _ctx: &ValidationContext,
    task: &TaskRecord,
    log: &mut FindingLog,
) {
    let Some(contract) = require_contract(task, "collaboration_trigger_contract", log) else {
        return;
    };

    let complete = require_keys(
        contract,
        "collaboration_trigger_contract",
        &[
            "hard_rule",
            "trigger_conditions",
            "notify_policy",
            "notify_timing",
            "notify_channel",
            "dedupe_window_hours",
            "state_change_bypass_dedupe",
            "must_emit_receipt_in_chat",
        ],
        log,
    );
    if !complete {
        return;
    }

    let conditions = str_list(contract, "trigger_conditions");
    let missing = missing_from(&conditions, REQUIRED_BLOCKER_TYPES);
    if missing.is_empty() {
        log.ok("collaboration_trigger_contract.trigger_conditions covers blocker classes");
    } else {
        log.fail(
            FindingKind::Schema,
            "collaboration_trigger_contract.trigger_conditions",
            format!("collaboration_trigger_contract.trigger_conditions missing: {missing:?}"),
        );
    }

    let policy = str_of(contract, "notify_policy").unwrap_or_default().trim().to_string();
    if policy.is_empty() {
        log.fail(
            FindingKind::Schema,
            "collaboration_trigger_contract.notify_policy",
            "collaboration_trigger_contract.notify_policy must be non-empty string",
        );
    } else {
        log.ok(format!("collaboration_trigger_contract.notify_policy={policy}"));
    }

    let timing = str_of(contract, "notify_timing").unwrap_or_default().trim().to_lowercase();
    if timing == "immediate" {
        log.ok("collaboration_trigger_contract.notify_timing=immediate");
    } else {
        log.fail(
            FindingKind::Schema,
            "collaboration_trigger_contract.notify_timing",
            format!("collaboration_trigger_contract.notify_timing must be immediate, got={timing}"),
        );
    }

    require_str_eq(
        contract,
        "collaboration_trigger_contract",
        "notify_channel",
        "ops-notification-router",
        log,
    );
    require_positive_int(contract, "collaboration_trigger_contract", "dedupe_window_hours", log);
    require_true(contract, "collaboration_trigger_contract", "state_change_bypass_dedupe", log);
    require_true(contract, "collaboration_trigger_contract", "must_emit_receipt_in_chat", log);

    let receipt_fields = str_list(contract, "receipt_required_fields");
    let missing_receipt = missing_from(&receipt_fields, REQUIRED_RECEIPT_FIELDS);
    if missing_receipt.is_empty() {
        log.ok("collaboration_trigger_contract.receipt_required_fields complete");
    } else {
        log.fail(
            FindingKind::Schema,
            "collaboration_trigger_contract.receipt_required_fields",
            format!(
                "collaboration_trigger_contract.receipt_required_fields missing: {missing_receipt:?}"
            ),
        );
    }
}

// ============================================================================
// SECTION: Governance Contracts
// ============================================================================

/// Checks the `capability_orchestration_contract` block.
pub fn check_orchestration(_ctx: &ValidationContext, task: &TaskRecord, log: &mut FindingLog) {
    let Some(contract) = require_contract(task, "capability_orchestration_contract", log) else {
        return;
    };

    let complete = require_keys(
        contract,
        "capability_orchestration_contract",
        &[
            "required",
            "task_type_routes",
            "preflight_requirements",
            "fail_classification",
            "evidence_schema_fields",
        ],
        log,
    );
    if !complete {
        return;
    }

    require_true(contract, "capability_orchestration_contract", "required", log);

    match object_of(contract, "task_type_routes") {
        Some(routes) if !routes.is_empty() => {
            for (task_type, route) in routes {
                let Some(route) = route.as_object() else {
                    log.fail(
                        FindingKind::Schema,
                        format!("capability_orchestration_contract.task_type_routes.{task_type}"),
                        format!("task_type_routes.{task_type} must be object"),
                    );
                    continue;
                };
                let route_name = format!("task_type_routes.{task_type}");
                require_keys(
                    route,
                    &route_name,
                    &[
                        "pipeline",
                        "primary_skills",
                        "fallback_skills",
                        "required_mcp",
                        "max_tool_calls",
                        "max_runtime_minutes",
                    ],
                    log,
                );
                for key in ["pipeline", "primary_skills", "required_mcp"] {
                    if str_list(route, key).is_empty() {
                        log.fail(
                            FindingKind::Schema,
                            format!("capability_orchestration_contract.{route_name}.{key}"),
                            format!("{route_name}.{key} must be non-empty list"),
                        );
                    }
                }
            }
        }
        _ => log.fail(
            FindingKind::Schema,
            "capability_orchestration_contract.task_type_routes",
            "task_type_routes must be non-empty object",
        ),
    }

    require_non_empty_list(
        contract,
        "capability_orchestration_contract",
        "preflight_requirements",
        log,
    );

    let fail_classes = str_list(contract, "fail_classification");
    let missing = missing_from(&fail_classes, REQUIRED_FAIL_CLASSES);
    if missing.is_empty() {
        log.ok("capability_orchestration_contract.fail_classification complete");
    } else {
        log.fail(
            FindingKind::Schema,
            "capability_orchestration_contract.fail_classification",
            format!("fail_classification missing: {missing:?}"),
        );
    }

    if str_list(contract, "evidence_schema_fields").len() < 5 {
        log.fail(
            FindingKind::Schema,
            "capability_orchestration_contract.evidence_schema_fields",
            "evidence_schema_fields must be a sufficiently complete list",
        );
    }
}

/// Checks the `knowledge_acquisition_contract` block.
pub fn check_knowledge_acquisition(
    _ctx: &ValidationContext,
    task: &TaskRecord,
    log: &mut FindingLog,
) {
    let Some(contract) = require_contract(task, "knowledge_acquisition_contract", log) else {
        return;
    };

    let complete = require_keys(
        contract,
        "knowledge_acquisition_contract",
        &[
            "required",
            "must_research_when",
            "source_priority",
            "evidence_fields",
            "sample_report_path_pattern",
            "high_frequency_domains",
        ],
        log,
    );
    if !complete {
        return;
    }

    require_true(contract, "knowledge_acquisition_contract", "required", log);

    let priority = str_list(contract, "source_priority");
    if priority.len() >= 2 && priority[0] == "official_spec" && priority[1] == "repo_contract" {
        log.ok("knowledge_acquisition_contract.source_priority prioritizes official_spec/repo_contract");
    } else {
        log.fail(
            FindingKind::Schema,
            "knowledge_acquisition_contract.source_priority",
            "source_priority must prioritize official_spec and repo_contract",
        );
    }

    let fields = str_list(contract, "evidence_fields");
    if contains_all(&fields, REQUIRED_KNOWLEDGE_FIELDS) {
        log.ok("knowledge_acquisition_contract.evidence_fields complete");
    } else {
        log.fail(
            FindingKind::Schema,
            "knowledge_acquisition_contract.evidence_fields",
            "evidence_fields missing required knowledge evidence fields",
        );
    }

    match object_of(contract, "high_frequency_domains") {
        Some(domains) if !domains.is_empty() => {
            log.ok("knowledge_acquisition_contract.high_frequency_domains is non-empty");
        }
        _ => log.fail(
            FindingKind::Schema,
            "knowledge_acquisition_contract.high_frequency_domains",
            "high_frequency_domains must be non-empty object",
        ),
    }
}

/// Checks the `experience_feedback_contract` block.
pub fn check_experience_feedback(
    _ctx: &ValidationContext,
    task: &TaskRecord,
    log: &mut FindingLog,
) {
    let Some(contract) = require_contract(task, "experience_feedback_contract", log) else {
        return;
    };

    let complete = require_keys(
        contract,
        "experience_feedback_contract",
        &[
            "required",
            "redaction_policy_required",
            "retention_days",
            "sensitive_fields_denylist",
            "export_scope",
            "max_log_age_days",
            "minimum_logs_required",
            "feedback_log_path_pattern",
            "promotion_requires_replay_pass",
        ],
        log,
    );
    if !complete {
        return;
    }

    require_true(contract, "experience_feedback_contract", "required", log);
    require_true(contract, "experience_feedback_contract", "redaction_policy_required", log);
    require_positive_int(contract, "experience_feedback_contract", "retention_days", log);
    require_non_empty_list(
        contract,
        "experience_feedback_contract",
        "sensitive_fields_denylist",
        log,
    );

    let scope = str_of(contract, "export_scope").unwrap_or_default().trim().to_string();
    if ALLOWED_EXPORT_SCOPES.contains(&scope.as_str()) {
        log.ok(format!("experience_feedback_contract.export_scope={scope}"));
    } else {
        log.fail(
            FindingKind::Schema,
            "experience_feedback_contract.export_scope",
            format!("export_scope must be one of {ALLOWED_EXPORT_SCOPES:?}"),
        );
    }

    require_positive_int(contract, "experience_feedback_contract", "max_log_age_days", log);
    require_positive_int(contract, "experience_feedback_contract", "minimum_logs_required", log);
    require_true(contract, "experience_feedback_contract", "promotion_requires_replay_pass", log);

    if str_of(contract, "feedback_log_path_pattern").unwrap_or_default().trim().is_empty() {
        log.fail(
            FindingKind::Reference,
            "experience_feedback_contract.feedback_log_path_pattern",
            "feedback_log_path_pattern missing",
        );
    }
}

// ============================================================================
// SECTION: Install Contracts
// ============================================================================

/// Checks the `install_safety_contract` block.
pub fn check_install_safety(_ctx: &ValidationContext, task: &TaskRecord, log: &mut FindingLog) {
    let Some(contract) = require_contract(task, "install_safety_contract", log) else {
        return;
    };

    let complete = require_keys(
        contract,
        "install_safety_contract",
        &[
            "required",
            "preserve_existing_default",
            "on_conflict",
            "idempotent_reinstall_allowed",
            "same_signature_action",
            "allow_replace_only_with_backup",
            "rollback_reference_required",
            "install_report_required",
            "dry_run_required",
            "install_report_path_pattern",
        ],
        log,
    );
    if !complete {
        return;
    }

    require_true(contract, "install_safety_contract", "required", log);
    require_true(contract, "install_safety_contract", "preserve_existing_default", log);
    require_str_eq(contract, "install_safety_contract", "on_conflict", "abort_and_explain", log);
    require_true(contract, "install_safety_contract", "idempotent_reinstall_allowed", log);
    require_str_eq(
        contract,
        "install_safety_contract",
        "same_signature_action",
        "no_op_with_report",
        log,
    );
    require_true(contract, "install_safety_contract", "allow_replace_only_with_backup", log);
    require_true(contract, "install_safety_contract", "rollback_reference_required", log);
    require_true(contract, "install_safety_contract", "install_report_required", log);
    require_true(contract, "install_safety_contract", "dry_run_required", log);
}

/// Checks the `install_provenance_contract` block.
pub fn check_install_provenance(_ctx: &ValidationContext, task: &TaskRecord, log: &mut FindingLog) {
    let Some(contract) = require_contract(task, "install_provenance_contract", log) else {
        return;
    };

    let complete = require_keys(
        contract,
        "install_provenance_contract",
        &[
            "required",
            "installer_tool_required",
            "operations_required",
            "report_path_pattern",
            "required_report_fields",
            "required_invocation_fields",
            "enforcement_validator",
        ],
        log,
    );
    if !complete {
        return;
    }

    require_true(contract, "install_provenance_contract", "required", log);
    require_non_empty_list(contract, "install_provenance_contract", "operations_required", log);
    if str_of(contract, "installer_tool_required").unwrap_or_default().trim().is_empty() {
        log.fail(
            FindingKind::Schema,
            "install_provenance_contract.installer_tool_required",
            "installer_tool_required must be non-empty",
        );
    }
}

// ============================================================================
// SECTION: CI and Arbitration Contracts
// ============================================================================

/// Checks the `ci_enforcement_contract` block.
pub fn check_ci_enforcement(_ctx: &ValidationContext, task: &TaskRecord, log: &mut FindingLog) {
    let Some(contract) = require_contract(task, "ci_enforcement_contract", log) else {
        return;
    };

    let complete = require_keys(
        contract,
        "ci_enforcement_contract",
        &[
            "required",
            "required_workflows",
            "required_job",
            "required_validator_set_label",
            "required_validators",
            "candidate_validators_v1_2",
            "required_checks",
            "freshness_gate",
        ],
        log,
    );
    if !complete {
        return;
    }

    require_true(contract, "ci_enforcement_contract", "required", log);

    if str_of(contract, "required_validator_set_label").unwrap_or_default().trim().is_empty() {
        log.fail(
            FindingKind::Schema,
            "ci_enforcement_contract.required_validator_set_label",
            "required_validator_set_label must be non-empty",
        );
    }

    let freshness = object_of(contract, "freshness_gate").cloned().unwrap_or_default();
    for key in ["handoff_logs_max_age_days", "route_metrics_max_age_days"] {
        if int_of(&freshness, key).unwrap_or(0) <= 0 {
            log.fail(
                FindingKind::Schema,
                format!("ci_enforcement_contract.freshness_gate.{key}"),
                format!("freshness_gate.{key} must be >0"),
            );
        }
    }

    let checks = str_list(contract, "required_checks");
    for check in ["protocol-ci / required-gates", "identity-protocol-ci / required-gates"] {
        if checks.iter().any(|item| item == check) {
            log.ok(format!("required_checks includes {check}"));
        } else {
            log.fail(
                FindingKind::Policy,
                "ci_enforcement_contract.required_checks",
                format!("required_checks must include {check}"),
            );
        }
    }

    let required = str_list(contract, "required_validators");
    let candidates = str_list(contract, "candidate_validators_v1_2");
    let overlap: Vec<&String> =
        required.iter().filter(|validator| candidates.contains(validator)).collect();
    if overlap.is_empty() {
        log.ok("required_validators and candidate_validators_v1_2 are disjoint");
    } else {
        log.fail(
            FindingKind::Policy,
            "ci_enforcement_contract.required_validators",
            format!("required_validators overlaps candidate_validators_v1_2: {overlap:?}"),
        );
    }
}

/// Checks the `capability_arbitration_contract` block.
pub fn check_capability_arbitration(
    _ctx: &ValidationContext,
    task: &TaskRecord,
    log: &mut FindingLog,
) {
    let Some(contract) = require_contract(task, "capability_arbitration_contract", log) else {
        return;
    };

    let complete = require_keys(
        contract,
        "capability_arbitration_contract",
        &[
            "required",
            "priority_order",
            "conflict_rules",
            "trigger_thresholds",
            "decision_record_required_fields",
            "sample_report_path_pattern",
            "fail_action",
        ],
        log,
    );
    if !complete {
        return;
    }

    require_true(contract, "capability_arbitration_contract", "required", log);

    let priority = str_list(contract, "priority_order");
    if priority == REQUIRED_PRIORITY_ORDER {
        log.ok("capability_arbitration_contract.priority_order is canonical");
    } else {
        log.fail(
            FindingKind::Schema,
            "capability_arbitration_contract.priority_order",
            format!("priority_order must equal: {REQUIRED_PRIORITY_ORDER:?}"),
        );
    }

    match object_of(contract, "conflict_rules") {
        Some(rules) => {
            for pair in REQUIRED_CONFLICT_PAIRS {
                let Some(rule) = rules.get(*pair).and_then(Value::as_object) else {
                    log.fail(
                        FindingKind::Schema,
                        format!("capability_arbitration_contract.conflict_rules.{pair}"),
                        format!("conflict_rules.{pair} must be object"),
                    );
                    continue;
                };
                if str_list(rule, "when").is_empty() {
                    log.fail(
                        FindingKind::Schema,
                        format!("capability_arbitration_contract.conflict_rules.{pair}.when"),
                        format!("conflict_rules.{pair}.when must be non-empty list"),
                    );
                }
                if str_of(rule, "decision").unwrap_or_default().trim().is_empty() {
                    log.fail(
                        FindingKind::Schema,
                        format!("capability_arbitration_contract.conflict_rules.{pair}.decision"),
                        format!("conflict_rules.{pair}.decision must be non-empty string"),
                    );
                }
            }
        }
        None => log.fail(
            FindingKind::Schema,
            "capability_arbitration_contract.conflict_rules",
            "conflict_rules must be object",
        ),
    }

    let thresholds = object_of(contract, "trigger_thresholds").cloned().unwrap_or_default();
    for key in
        ["misroute_rate_percent", "replay_failure_rate_percent", "first_pass_success_drop_percent"]
    {
        match number_of(&thresholds, key) {
            Some(value) if value > 0.0 => {}
            _ => log.fail(
                FindingKind::Schema,
                format!("capability_arbitration_contract.trigger_thresholds.{key}"),
                format!("trigger_thresholds.{key} must be > 0"),
            ),
        }
    }

    let decision_fields = str_list(contract, "decision_record_required_fields");
    if contains_all(&decision_fields, REQUIRED_DECISION_FIELDS) {
        log.ok("capability_arbitration_contract.decision_record_required_fields complete");
    } else {
        log.fail(
            FindingKind::Schema,
            "capability_arbitration_contract.decision_record_required_fields",
            format!("decision_record_required_fields missing required fields: {REQUIRED_DECISION_FIELDS:?}"),
        );
    }

    if let Some(surface) = object_of(contract, "safe_auto_patch_surface") {
        for key in ["allowlist", "denylist"] {
            if list_of(surface, key).is_none() {
                log.fail(
                    FindingKind::Policy,
                    format!("capability_arbitration_contract.safe_auto_patch_surface.{key}"),
                    format!("safe_auto_patch_surface.{key} must be a list"),
                );
            }
        }
    }
}

// ============================================================================
// SECTION: Supplemental Contracts
// ============================================================================

/// Checks the `agent_handoff_contract` block.
pub fn check_agent_handoff(_ctx: &ValidationContext, task: &TaskRecord, log: &mut FindingLog) {
    let Some(contract) = require_contract(task, "agent_handoff_contract", log) else {
        return;
    };

    if str_of(contract, "handoff_log_path_pattern").unwrap_or_default().trim().is_empty() {
        log.fail(
            FindingKind::Reference,
            "agent_handoff_contract.handoff_log_path_pattern",
            "agent_handoff_contract.handoff_log_path_pattern missing",
        );
    }
    require_non_empty_list(contract, "agent_handoff_contract", "required_fields", log);
    require_positive_int(contract, "agent_handoff_contract", "minimum_logs_required", log);
    require_positive_int(contract, "agent_handoff_contract", "max_log_age_days", log);
}

/// Checks the `learning_verification_contract` block.
pub fn check_learning_verification(
    _ctx: &ValidationContext,
    task: &TaskRecord,
    log: &mut FindingLog,
) {
    let Some(contract) = require_contract(task, "learning_verification_contract", log) else {
        return;
    };

    for key in ["run_id_required", "reasoning_trace_required", "rulebook_linkage_required"] {
        if bool_of(contract, key).is_none() {
            log.fail(
                FindingKind::Schema,
                format!("learning_verification_contract.{key}"),
                format!("learning_verification_contract.{key} must be a boolean"),
            );
        }
    }
}
