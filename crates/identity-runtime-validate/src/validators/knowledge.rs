// crates/identity-runtime-validate/src/validators/knowledge.rs
// ============================================================================
// Module: Knowledge Acquisition Validator
// Description: Validates knowledge acquisition contracts and sample reports.
// Purpose: Require source-backed claims with graded source levels.
// Dependencies: identity-runtime-contract, identity-runtime-core
// ============================================================================

//! ## Overview
//! Knowledge claims must cite a source at a level drawn from the contract's
//! priority ladder. The validator resolves the sample report, checks every
//! record, and optionally exercises a self-test corpus.

// ============================================================================
// SECTION: Imports
// ============================================================================

use identity_runtime_contract::TaskRecord;
use identity_runtime_contract::schemas;
use identity_runtime_contract::schemas::REQUIRED_KNOWLEDGE_FIELDS;
use identity_runtime_contract::task::str_list;
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

/// Runs the knowledge acquisition validator.
#[must_use]
pub fn run(ctx: &ValidatorContext) -> Verdict {
    let mut log = FindingLog::new();
    log.info(format!("validate knowledge acquisition for identity: {}", ctx.identity_id));

    let Some(task) = ctx.load_task(&mut log) else {
        return Verdict::from_log("knowledge-acquisition", log);
    };

    schemas::check_knowledge_acquisition(&ctx.contract_ctx(), &task, &mut log);
    check_sample_report(ctx, &task, &mut log);

    if ctx.self_test {
        run_self_test(ctx, &task, &mut log);
    }

    if log.is_ok() {
        log.line("Knowledge acquisition contract validation PASSED");
    }
    Verdict::from_log("knowledge-acquisition", log)
}

// ============================================================================
// SECTION: Sample Report
// ============================================================================

/// Resolves and validates the knowledge sample report.
fn check_sample_report(ctx: &ValidatorContext, task: &TaskRecord, log: &mut FindingLog) {
    let Some(contract) = task.contract("knowledge_acquisition_contract") else {
        return;
    };
    let allowed_levels = str_list(contract, "source_priority");
    let pattern = str_of(contract, "sample_report_path_pattern").unwrap_or_default();

    let default_path = ctx
        .layout
        .examples_dir()
        .join(format!("{}-knowledge-acquisition-sample.json", ctx.identity_id));
    let report_path = if default_path.exists() {
        default_path
    } else {
        match evidence::latest(ctx.layout.root(), pattern, Some(ctx.identity_id.as_str())) {
            Ok(Some(path)) => path,
            _ => {
                log.fail(
                    FindingKind::Evidence,
                    "knowledge_acquisition_contract.sample_report_path_pattern",
                    format!("missing knowledge acquisition sample report: {pattern}"),
                );
                return;
            }
        }
    };

    let report: Map<String, Value> = match document::load_json_mapping(&report_path) {
        Ok(report) => report,
        Err(err) => {
            log.fail(
                FindingKind::Evidence,
                format!("{}", report_path.display()),
                format!("knowledge sample report invalid json: {err}"),
            );
            return;
        }
    };

    let source = report_path.display().to_string();
    if !report_records_pass(&report, &allowed_levels, &source, log) {
        log.fail(
            FindingKind::Evidence,
            source,
            "knowledge sample report records failed validation",
        );
    }
}

/// Validates report records; returns `true` when all records are clean.
fn report_records_pass(
    report: &Map<String, Value>,
    allowed_levels: &[String],
    source: &str,
    log: &mut FindingLog,
) -> bool {
    let Some(records) = report.get("records").and_then(Value::as_array) else {
        log.fail(
            FindingKind::Evidence,
            format!("{source}#records"),
            "report.records must be a non-empty array",
        );
        return false;
    };
    if records.is_empty() {
        log.fail(
            FindingKind::Evidence,
            format!("{source}#records"),
            "report.records must be a non-empty array",
        );
        return false;
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
        for issue in record_issues(record, allowed_levels, index) {
            clean = false;
            log.fail(FindingKind::Evidence, format!("{source}#{index}"), issue);
        }
    }
    if clean {
        log.ok(format!("validated {} knowledge record(s)", records.len()));
    }
    clean
}

/// Returns the issues of one knowledge record.
fn record_issues(
    record: &Map<String, Value>,
    allowed_levels: &[String],
    index: usize,
) -> Vec<String> {
    let mut issues = Vec::new();

    let missing: Vec<&str> = REQUIRED_KNOWLEDGE_FIELDS
        .iter()
        .copied()
        .filter(|field| !record.contains_key(*field))
        .collect();
    if !missing.is_empty() {
        issues.push(format!("records[{index}] missing fields: {missing:?}"));
    }

    let level = str_of(record, "source_level").unwrap_or_default();
    if !allowed_levels.iter().any(|allowed| allowed == level) {
        issues.push(format!("records[{index}].source_level must be in {allowed_levels:?}"));
    }

    issues
}

// ============================================================================
// SECTION: Self-Test
// ============================================================================

/// Runs the positive/negative sample corpus.
fn run_self_test(ctx: &ValidatorContext, task: &TaskRecord, log: &mut FindingLog) {
    let contract = task.contract("knowledge_acquisition_contract").cloned().unwrap_or_default();
    let allowed_levels = str_list(&contract, "source_priority");
    let sample_root = ctx.layout.examples_dir().join("knowledge-acquisition");
    selftest::run_corpus(log, &sample_root, "knowledge acquisition", 1, 1, |path| {
        document::load_json_mapping(path)
            .map(|report| {
                let mut scratch = FindingLog::new();
                report_records_pass(&report, &allowed_levels, "sample", &mut scratch)
            })
            .unwrap_or(false)
    });
}
