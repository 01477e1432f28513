// crates/identity-runtime-validate/src/validators/learning_loop.rs
// ============================================================================
// Module: Learning Loop Validator
// Description: Validates reasoning traces and rulebook linkage evidence.
// Purpose: Tie every learned rule to a run with a complete reasoning trace.
// Dependencies: identity-runtime-contract, identity-runtime-core
// ============================================================================

//! ## Overview
//! The learning verification contract demands a run report with a run id, a
//! non-empty reasoning trace whose attempts carry the reasoning-loop
//! mandatory fields, and a rulebook row linking back to the run via
//! `evidence_run_id`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use identity_runtime_contract::TaskRecord;
use identity_runtime_contract::schemas;
use identity_runtime_contract::task::bool_of;
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
// SECTION: Entry Point
// ============================================================================

/// Runs the learning loop validator.
#[must_use]
pub fn run(ctx: &ValidatorContext) -> Verdict {
    let mut log = FindingLog::new();
    log.info(format!("validate learning loop evidence for identity: {}", ctx.identity_id));

    let Some(task) = ctx.load_task(&mut log) else {
        return Verdict::from_log("learning-loop", log);
    };

    schemas::check_learning_verification(&ctx.contract_ctx(), &task, &mut log);

    let Some(contract) = task.contract("learning_verification_contract").cloned() else {
        return Verdict::from_log("learning-loop", log);
    };

    let Some((run, source)) = load_run_report(ctx, &contract, &mut log) else {
        return Verdict::from_log("learning-loop", log);
    };

    let run_id = str_of(&run, "run_id").unwrap_or_default().trim().to_string();
    if bool_of(&contract, "run_id_required").unwrap_or(false) && run_id.is_empty() {
        log.fail(
            FindingKind::Evidence,
            source.clone(),
            "run_id is required by learning_verification_contract",
        );
    } else if !run_id.is_empty() {
        log.ok(format!("run_id={run_id}"));
    }

    check_attempts(&task, &contract, &run, &source, &mut log);
    check_rulebook_linkage(ctx, &task, &contract, &run_id, &mut log);

    if log.is_ok() {
        log.line("Learning loop evidence validation PASSED");
    }
    Verdict::from_log("learning-loop", log)
}

// ============================================================================
// SECTION: Run Report
// ============================================================================

/// Resolves and loads the learning run report.
fn load_run_report(
    ctx: &ValidatorContext,
    contract: &Map<String, Value>,
    log: &mut FindingLog,
) -> Option<(Map<String, Value>, String)> {
    let pattern = str_of(contract, "run_report_path_pattern").unwrap_or_default();
    let default_path =
        ctx.layout.examples_dir().join(format!("{}-learning-sample.json", ctx.identity_id));
    let report_path = if !pattern.is_empty() {
        evidence::latest(ctx.layout.root(), pattern, Some(ctx.identity_id.as_str()))
            .ok()
            .flatten()
            .or_else(|| default_path.exists().then_some(default_path))
    } else {
        default_path.exists().then_some(default_path)
    };

    let Some(report_path) = report_path else {
        log.fail(
            FindingKind::Evidence,
            "learning_verification_contract.run_report_path_pattern",
            "missing learning run report",
        );
        return None;
    };

    let source = report_path.display().to_string();
    match document::load_json_mapping(&report_path) {
        Ok(report) => Some((report, source)),
        Err(err) => {
            log.fail(FindingKind::Evidence, source, format!("run report invalid json: {err}"));
            None
        }
    }
}

// ============================================================================
// SECTION: Reasoning Trace
// ============================================================================

/// Validates the reasoning attempts against the reasoning-loop field set.
fn check_attempts(
    task: &TaskRecord,
    contract: &Map<String, Value>,
    run: &Map<String, Value>,
    source: &str,
    log: &mut FindingLog,
) {
    let empty = Vec::new();
    let attempts = run.get("reasoning_attempts").and_then(Value::as_array).unwrap_or(&empty);

    if bool_of(contract, "reasoning_trace_required").unwrap_or(false) {
        if attempts.is_empty() {
            log.fail(
                FindingKind::Evidence,
                source,
                "reasoning_trace_required=true but reasoning_attempts is empty",
            );
            return;
        }
        log.ok(format!("reasoning_attempts count={}", attempts.len()));
    }

    let required_fields = task
        .contract("reasoning_loop_contract")
        .map(|loop_contract| str_list(loop_contract, "mandatory_fields_per_attempt"))
        .unwrap_or_default();
    for (index, attempt) in attempts.iter().enumerate() {
        let Some(attempt) = attempt.as_object() else {
            log.fail(
                FindingKind::Evidence,
                format!("{source}#{index}"),
                format!("attempt[{}] must be object", index + 1),
            );
            continue;
        };
        let missing: Vec<&String> =
            required_fields.iter().filter(|field| !attempt.contains_key(field.as_str())).collect();
        if !missing.is_empty() {
            log.fail(
                FindingKind::Evidence,
                format!("{source}#{index}"),
                format!("attempt[{}] missing fields: {missing:?}", index + 1),
            );
        }
    }
}

// ============================================================================
// SECTION: Rulebook Linkage
// ============================================================================

/// Requires a rulebook row whose `evidence_run_id` matches the run.
fn check_rulebook_linkage(
    ctx: &ValidatorContext,
    task: &TaskRecord,
    contract: &Map<String, Value>,
    run_id: &str,
    log: &mut FindingLog,
) {
    if bool_of(contract, "rulebook_linkage_required") != Some(true) || run_id.is_empty() {
        return;
    }

    let declared = task
        .contract("rulebook_contract")
        .and_then(|rulebook| str_of(rulebook, "rulebook_path"))
        .unwrap_or_default()
        .to_string();
    let rulebook_path = ctx.layout.root().join(&declared);
    let Ok(text) = std::fs::read_to_string(&rulebook_path) else {
        log.fail(
            FindingKind::Reference,
            "rulebook_contract.rulebook_path",
            format!("rulebook not readable for linkage check: {declared}"),
        );
        return;
    };

    let linked = text.lines().filter(|line| !line.trim().is_empty()).any(|line| {
        serde_json::from_str::<Map<String, Value>>(line)
            .map(|row| str_of(&row, "evidence_run_id").unwrap_or_default() == run_id)
            .unwrap_or(false)
    });
    if linked {
        log.ok(format!("rulebook linkage found for run_id={run_id}"));
    } else {
        log.fail(
            FindingKind::Evidence,
            format!("{declared}#evidence_run_id"),
            format!("no rulebook row links evidence_run_id={run_id}"),
        );
    }
}
