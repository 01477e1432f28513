// crates/identity-runtime-engine/src/upgrade.rs
// ============================================================================
// Module: Upgrade Executor
// Description: Decide, plan, apply, validate, and emit one upgrade cycle.
// Purpose: Mutate allowlisted surfaces only, under validator quorum evidence.
// Dependencies: crate::{metrics, policy}, identity-runtime-{core,validate}
// ============================================================================

//! ## Overview
//! One invocation walks `LOAD → DECIDE → PLAN → [safe-auto & upgrade]
//! POLICY-CHECK → APPLY → VALIDATE → EMIT`. Review-required mode stops at the
//! plan; safe-auto appends an arbitration decision record, a rulebook row,
//! and a history line, then runs the validator quorum. Artifacts land in
//! order: patch plan, apply-step files, per-check logs, execution report. A
//! consumer observing the report may assume everything it references is
//! durable.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::path::PathBuf;

use identity_runtime_contract::TaskRecord;
use identity_runtime_contract::task::object_of;
use identity_runtime_contract::task::str_list;
use identity_runtime_contract::task::str_of;
use identity_runtime_core::AppendLogError;
use identity_runtime_core::Catalog;
use identity_runtime_core::CatalogError;
use identity_runtime_core::DocumentError;
use identity_runtime_core::HistoryLog;
use identity_runtime_core::IdentityId;
use identity_runtime_core::JsonlLog;
use identity_runtime_core::RuleId;
use identity_runtime_core::RunId;
use identity_runtime_core::RuntimeLayout;
use identity_runtime_core::Timestamp;
use identity_runtime_core::document;
use identity_runtime_core::pack;
use identity_runtime_core::pack::RuleType;
use identity_runtime_core::pack::RulebookRecord;
use identity_runtime_validate::CheckResult;
use identity_runtime_validate::OrchestratorError;
use identity_runtime_validate::ValidatorContext;
use identity_runtime_validate::run_checks;
use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::metrics::RouteQualityMetrics;
use crate::metrics::TriggerThresholds;
use crate::metrics::UpgradeDecision;
use crate::metrics::decide_upgrade;
use crate::policy::PatchSurfacePolicy;
use crate::policy::PathPolicyViolation;
use crate::policy::PolicyError;

// ============================================================================
// SECTION: Modes
// ============================================================================

/// Upgrade executor modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpgradeMode {
    /// Plan only; the patch surface is applied by human PR review.
    #[serde(rename = "review-required")]
    ReviewRequired,
    /// Apply append-only mutations within the allowlisted patch surface.
    #[serde(rename = "safe-auto")]
    SafeAuto,
}

impl fmt::Display for UpgradeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReviewRequired => f.write_str("review-required"),
            Self::SafeAuto => f.write_str("safe-auto"),
        }
    }
}

// ============================================================================
// SECTION: Execution Context
// ============================================================================

/// CI binding captured from the caller's environment.
#[derive(Debug, Clone, Default)]
pub struct ExecutionEnv {
    /// `true` when the `CI` variable is truthy.
    pub ci: bool,
    /// `GITHUB_RUN_ID`, verbatim.
    pub github_run_id: Option<String>,
    /// `GITHUB_SHA`, verbatim.
    pub github_sha: Option<String>,
}

impl ExecutionEnv {
    /// Captures the process environment. Call only at the CLI boundary.
    #[must_use]
    pub fn from_env() -> Self {
        let truthy = |value: String| {
            let value = value.trim().to_lowercase();
            !value.is_empty() && value != "0" && value != "false"
        };
        Self {
            ci: std::env::var("CI").map(truthy).unwrap_or(false),
            github_run_id: std::env::var("GITHUB_RUN_ID").ok().filter(|v| !v.is_empty()),
            github_sha: std::env::var("GITHUB_SHA").ok().filter(|v| !v.is_empty()),
        }
    }
}

/// Execution context stamped into every report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionContext {
    /// `ci` or `local`.
    pub generated_by: String,
    /// Recorded `GITHUB_RUN_ID`, empty when absent.
    #[serde(default)]
    pub github_run_id: String,
    /// Recorded `GITHUB_SHA`, empty when absent.
    #[serde(default)]
    pub github_sha: String,
}

impl From<&ExecutionEnv> for ExecutionContext {
    fn from(env: &ExecutionEnv) -> Self {
        Self {
            generated_by: if env.ci { "ci" } else { "local" }.to_string(),
            github_run_id: env.github_run_id.clone().unwrap_or_default(),
            github_sha: env.github_sha.clone().unwrap_or_default(),
        }
    }
}

/// Creator invocation block binding a report to its producing tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatorInvocation {
    /// Producing tool id.
    pub tool: String,
    /// Invocation mode.
    pub mode: String,
    /// Run id equal to the report's run id.
    pub run_id: RunId,
}

// ============================================================================
// SECTION: Plan and Report Documents
// ============================================================================

/// Patch plan written for every invocation, triggered or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchPlan {
    /// Run identifier.
    pub run_id: RunId,
    /// Target identity.
    pub identity_id: IdentityId,
    /// Plan generation stamp.
    pub generated_at: Timestamp,
    /// Executor mode.
    pub mode: UpgradeMode,
    /// Decider outcome.
    pub upgrade_required: bool,
    /// Decider reasons in declared order.
    pub trigger_reasons: Vec<String>,
    /// Paths the mode may touch.
    pub patch_surface: Vec<String>,
    /// Planned apply/validate actions.
    pub planned_actions: Vec<String>,
}

/// Execution report emitted at the end of every invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// Run identifier.
    pub run_id: RunId,
    /// Target identity.
    pub identity_id: IdentityId,
    /// Executor mode.
    pub mode: UpgradeMode,
    /// CI binding for this run.
    pub execution_context: ExecutionContext,
    /// Decider outcome.
    pub upgrade_required: bool,
    /// Decider reasons in declared order.
    pub trigger_reasons: Vec<String>,
    /// Actions taken, in execution order.
    pub actions_taken: Vec<String>,
    /// Rendered commands of the validator quorum.
    pub checks: Vec<String>,
    /// Captured check results with hashed logs.
    pub check_results: Vec<CheckResult>,
    /// Artifact paths this run produced or consumed.
    pub artifacts: Vec<String>,
    /// Producing-tool binding.
    pub creator_invocation: CreatorInvocation,
    /// `true` when every quorum check passed.
    pub all_ok: bool,
    /// Path policy violations, present only when safe-auto was blocked.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path_policy_violations: Vec<PathPolicyViolation>,
}

/// Outcome of one executor invocation.
#[derive(Debug, Clone)]
pub struct UpgradeOutcome {
    /// Emitted execution report.
    pub report: ExecutionReport,
    /// Report path on disk.
    pub report_path: PathBuf,
    /// Patch plan path on disk.
    pub plan_path: PathBuf,
    /// Process exit code (`0` ok, `2` quorum failed, `3` policy blocked).
    pub exit_code: u8,
}

// ============================================================================
// SECTION: Options and Errors
// ============================================================================

/// Inputs to one executor invocation.
#[derive(Debug, Clone)]
pub struct UpgradeOptions {
    /// Target identity.
    pub identity_id: IdentityId,
    /// Executor mode.
    pub mode: UpgradeMode,
    /// Metrics document override.
    pub metrics_path: Option<PathBuf>,
    /// Report output directory override.
    pub out_dir: Option<PathBuf>,
    /// Invocation clock.
    pub now: Timestamp,
    /// CI binding environment.
    pub env: ExecutionEnv,
}

/// Errors raised before a report could be emitted.
#[derive(Debug, Error)]
pub enum UpgradeError {
    /// Catalog or pack resolution failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    /// A document read or write failed.
    #[error(transparent)]
    Document(#[from] DocumentError),
    /// An append-only log write failed.
    #[error(transparent)]
    AppendLog(#[from] AppendLogError),
    /// The metrics artifact was not found.
    #[error("metrics artifact not found: {0}")]
    MetricsNotFound(PathBuf),
    /// The patch surface policy failed to compile.
    #[error(transparent)]
    Policy(#[from] PolicyError),
    /// The validator quorum could not run.
    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),
    /// The lifecycle contract declares no validator quorum.
    #[error("identity_update_lifecycle_contract declares no required_checks")]
    MissingQuorum,
}

// ============================================================================
// SECTION: Executor
// ============================================================================

/// Executes one upgrade cycle.
///
/// # Errors
///
/// Returns [`UpgradeError`] on precondition failures (missing catalog, pack,
/// metrics, or quorum). Policy blocks and quorum failures are reported
/// through the outcome's exit code, not as errors.
pub fn execute_upgrade(
    layout: &RuntimeLayout,
    options: &UpgradeOptions,
) -> Result<UpgradeOutcome, UpgradeError> {
    // LOAD
    let catalog = Catalog::load(&layout.catalog_path())?;
    let pack_dir = catalog.resolve_pack(layout.root(), &options.identity_id)?;
    let task_path = catalog.resolve_task(layout.root(), &options.identity_id)?;
    let task = TaskRecord::load(&task_path)?;

    // DECIDE
    let arbitration =
        task.contract("capability_arbitration_contract").cloned().unwrap_or_default();
    let thresholds = TriggerThresholds::from_contract(&arbitration);
    let metrics_path = resolve_metrics_path(layout, &task, options);
    if !metrics_path.exists() {
        return Err(UpgradeError::MetricsNotFound(metrics_path));
    }
    let metrics: RouteQualityMetrics = document::load_json(&metrics_path)?;
    let decision = decide_upgrade(&metrics, &thresholds);

    // PLAN
    let run_id = RunId::new(format!(
        "identity-upgrade-exec-{}-{}",
        options.identity_id,
        options.now.unix_seconds()
    ));
    let pack_rel = relative_display(layout, &pack_dir);
    let decision_rel = format!(
        "identity/runtime/logs/arbitration/{}-{run_id}.json",
        options.identity_id
    );
    let touched_paths = vec![
        format!("{pack_rel}/{}", pack::RULEBOOK_FILE),
        format!("{pack_rel}/{}", pack::TASK_HISTORY_FILE),
        decision_rel.clone(),
    ];
    let patch_surface = match options.mode {
        UpgradeMode::SafeAuto => touched_paths.clone(),
        UpgradeMode::ReviewRequired => vec![
            format!("{pack_rel}/{}", pack::CURRENT_TASK_FILE),
            format!("{pack_rel}/{}", pack::IDENTITY_PROMPT_FILE),
            format!("{pack_rel}/{}", pack::RULEBOOK_FILE),
            format!("{pack_rel}/{}", pack::TASK_HISTORY_FILE),
        ],
    };

    let out_dir = options.out_dir.clone().unwrap_or_else(|| layout.reports_dir());
    let plan = PatchPlan {
        run_id: run_id.clone(),
        identity_id: options.identity_id.clone(),
        generated_at: options.now,
        mode: options.mode,
        upgrade_required: decision.upgrade_required,
        trigger_reasons: decision.reasons.clone(),
        patch_surface,
        planned_actions: vec![
            "append arbitration decision record".to_string(),
            "append rulebook learning row".to_string(),
            "append TASK_HISTORY upgrade note".to_string(),
            "run required validators and replay checks".to_string(),
        ],
    };
    let plan_path = out_dir.join(format!("{run_id}-patch-plan.json"));
    document::write_json_pretty(&plan_path, &plan)?;

    let mut actions_taken = vec![format!("patch_plan_written:{}", plan_path.display())];
    let mut artifacts =
        vec![plan_path.display().to_string(), metrics_path.display().to_string()];

    let apply = options.mode == UpgradeMode::SafeAuto && decision.upgrade_required;

    // POLICY-CHECK
    if apply {
        let policy = PatchSurfacePolicy::from_contract(&arbitration)?;
        let violations = policy.check_all(&touched_paths);
        if !violations.is_empty() {
            let report = ExecutionReport {
                run_id: run_id.clone(),
                identity_id: options.identity_id.clone(),
                mode: options.mode,
                execution_context: ExecutionContext::from(&options.env),
                upgrade_required: decision.upgrade_required,
                trigger_reasons: decision.reasons,
                actions_taken,
                checks: Vec::new(),
                check_results: Vec::new(),
                artifacts,
                creator_invocation: creator_invocation(&run_id),
                all_ok: false,
                path_policy_violations: violations,
            };
            let report_path = out_dir.join(format!("{run_id}.json"));
            document::write_json_pretty(&report_path, &report)?;
            return Ok(UpgradeOutcome {
                report,
                report_path,
                plan_path,
                exit_code: 3,
            });
        }
    }

    // APPLY
    if apply {
        let decision_path = layout.root().join(&decision_rel);
        let record = decision_record(&options.identity_id, &task, &run_id, &metrics, &thresholds, &decision, options.now);
        document::write_json_pretty(&decision_path, &json!({ "records": [record] }))?;
        actions_taken.push("arbitration_record_written".to_string());
        artifacts.push(decision_path.display().to_string());

        let rulebook = JsonlLog::new(pack_dir.join(pack::RULEBOOK_FILE));
        rulebook.append(&RulebookRecord {
            rule_id: RuleId::new(format!("{run_id}-auto-upgrade")),
            rule_type: RuleType::Negative,
            trigger: "arbitration_threshold_hit".to_string(),
            action: "execute_identity_upgrade_safe_auto".to_string(),
            evidence_run_id: run_id.as_str().to_string(),
            scope: "identity_update_cycle".to_string(),
            confidence: json!(0.75),
            updated_at: options.now,
        })?;
        actions_taken.push("rulebook_row_appended".to_string());

        let history = HistoryLog::new(pack_dir.join(pack::TASK_HISTORY_FILE));
        history.append_entry(&format!(
            "{} | auto-upgrade trigger | run_id={run_id} | reasons={}",
            options.now,
            decision.reasons.join("; ")
        ))?;
        actions_taken.push("task_history_appended".to_string());
    }

    // VALIDATE
    let quorum = quorum_checks(&task);
    if quorum.is_empty() {
        return Err(UpgradeError::MissingQuorum);
    }
    let names: Vec<&str> = quorum.iter().map(String::as_str).collect();
    let validator_ctx =
        ValidatorContext::new(layout.clone(), options.identity_id.clone(), options.now);
    let logs_dir = layout.upgrade_logs_dir(&options.identity_id);
    let check_results = run_checks(&validator_ctx, &names, &logs_dir, run_id.as_str())?;
    let checks: Vec<String> = check_results.iter().map(|check| check.command.clone()).collect();
    let all_ok = check_results.iter().all(|check| check.ok);

    // EMIT
    let report = ExecutionReport {
        run_id: run_id.clone(),
        identity_id: options.identity_id.clone(),
        mode: options.mode,
        execution_context: ExecutionContext::from(&options.env),
        upgrade_required: decision.upgrade_required,
        trigger_reasons: decision.reasons,
        actions_taken,
        checks,
        check_results,
        artifacts,
        creator_invocation: creator_invocation(&run_id),
        all_ok,
        path_policy_violations: Vec::new(),
    };
    let report_path = out_dir.join(format!("{run_id}.json"));
    document::write_json_pretty(&report_path, &report)?;

    Ok(UpgradeOutcome {
        report,
        report_path,
        plan_path,
        exit_code: if all_ok { 0 } else { 2 },
    })
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds the creator invocation block for a run.
fn creator_invocation(run_id: &RunId) -> CreatorInvocation {
    CreatorInvocation {
        tool: "identity-creator".to_string(),
        mode: "update".to_string(),
        run_id: run_id.clone(),
    }
}

/// Resolves the metrics document path for this invocation.
fn resolve_metrics_path(
    layout: &RuntimeLayout,
    task: &TaskRecord,
    options: &UpgradeOptions,
) -> PathBuf {
    if let Some(path) = &options.metrics_path {
        return path.clone();
    }
    task.contract("route_quality_contract")
        .and_then(|contract| str_of(contract, "metrics_output_path"))
        .map_or_else(
            || layout.metrics_path(&options.identity_id),
            |declared| layout.root().join(declared),
        )
}

/// Reads the validator quorum from the lifecycle contract.
fn quorum_checks(task: &TaskRecord) -> Vec<String> {
    task.contract("identity_update_lifecycle_contract")
        .and_then(|lifecycle| object_of(lifecycle, "validation_contract").cloned())
        .map(|validation| str_list(&validation, "required_checks"))
        .unwrap_or_default()
}

/// Builds the arbitration decision record for a triggered run.
fn decision_record(
    identity_id: &IdentityId,
    task: &TaskRecord,
    run_id: &RunId,
    metrics: &RouteQualityMetrics,
    thresholds: &TriggerThresholds,
    decision: &UpgradeDecision,
    now: Timestamp,
) -> serde_json::Value {
    json!({
        "arbitration_id": format!("{run_id}-arb"),
        "task_id": task.task_id(),
        "identity_id": identity_id.as_str(),
        "conflict_pair": "routing_vs_learning",
        "inputs": {
            "metrics": {
                "misroute_rate": metrics.misroute_rate,
                "replay_success_rate": metrics.replay_success_rate,
                "first_pass_success_rate": metrics.first_pass_success_rate,
            },
            "thresholds": thresholds,
        },
        "decision": "trigger_identity_update_cycle",
        "impact": "force patch/validate/replay cycle",
        "rationale": if decision.reasons.is_empty() {
            "threshold trigger".to_string()
        } else {
            decision.reasons.join("; ")
        },
        "decided_at": now,
    })
}

/// Renders a path relative to the runtime root with forward slashes.
fn relative_display(layout: &RuntimeLayout, path: &std::path::Path) -> String {
    let rel = path.strip_prefix(layout.root()).unwrap_or(path);
    rel.components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
