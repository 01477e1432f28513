// crates/identity-runtime-validate/src/validators/ci_enforcement.rs
// ============================================================================
// Module: CI Enforcement Validator
// Description: Validates CI enforcement contracts and workflow wiring.
// Purpose: Ensure required workflows carry the gate job and validator refs.
// Dependencies: identity-runtime-contract, identity-runtime-core
// ============================================================================

//! ## Overview
//! Workflow topology is configuration, not code: each required workflow file
//! must exist and carry the required job, and every required validator must
//! be referenced either inline in the workflow or via the reusable
//! `_identity-required-gates.yml` workflow it delegates to.

// ============================================================================
// SECTION: Imports
// ============================================================================

use identity_runtime_contract::schemas;
use identity_runtime_contract::task::str_list;
use identity_runtime_contract::task::str_of;
use identity_runtime_core::FindingKind;
use identity_runtime_core::FindingLog;

use crate::context::ValidatorContext;
use crate::verdict::Verdict;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// File name of the reusable required-gates workflow.
const REUSABLE_WORKFLOW: &str = "_identity-required-gates.yml";

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// Runs the CI enforcement validator.
#[must_use]
pub fn run(ctx: &ValidatorContext) -> Verdict {
    let mut log = FindingLog::new();
    log.info(format!("validate ci enforcement for identity: {}", ctx.identity_id));

    let Some(task) = ctx.load_task(&mut log) else {
        return Verdict::from_log("ci-enforcement", log);
    };

    schemas::check_ci_enforcement(&ctx.contract_ctx(), &task, &mut log);

    if let Some(contract) = task.contract("ci_enforcement_contract") {
        let workflows = str_list(contract, "required_workflows");
        let required_job = str_of(contract, "required_job").unwrap_or_default().to_string();
        let validators = str_list(contract, "required_validators");
        check_workflows(ctx, &workflows, &required_job, &validators, &mut log);
    }

    if log.is_ok() {
        log.line("CI enforcement contract validation PASSED");
    }
    Verdict::from_log("ci-enforcement", log)
}

// ============================================================================
// SECTION: Workflow Scan
// ============================================================================

/// Scans workflow files for the required job and validator references.
fn check_workflows(
    ctx: &ValidatorContext,
    workflows: &[String],
    required_job: &str,
    validators: &[String],
    log: &mut FindingLog,
) {
    let workflow_dir = ctx.layout.root().join(".github/workflows");
    let reusable_path = workflow_dir.join(REUSABLE_WORKFLOW);
    let reusable_text = std::fs::read_to_string(&reusable_path).unwrap_or_default();

    for workflow in workflows {
        let workflow_path = workflow_dir.join(format!("{workflow}.yml"));
        let Ok(text) = std::fs::read_to_string(&workflow_path) else {
            log.fail(
                FindingKind::Reference,
                format!("ci_enforcement_contract.required_workflows.{workflow}"),
                format!("required workflow file missing: {}", workflow_path.display()),
            );
            continue;
        };

        if !text.contains(&format!("{required_job}:")) {
            log.fail(
                FindingKind::Policy,
                format!("ci_enforcement_contract.required_workflows.{workflow}"),
                format!("workflow {} missing job: {required_job}", workflow_path.display()),
            );
        }

        let uses_reusable =
            text.contains(&format!("uses: ./.github/workflows/{REUSABLE_WORKFLOW}"));
        if uses_reusable && reusable_text.is_empty() {
            log.fail(
                FindingKind::Reference,
                format!("ci_enforcement_contract.required_workflows.{workflow}"),
                format!(
                    "workflow {} references reusable required-gates workflow but {} is missing",
                    workflow_path.display(),
                    reusable_path.display()
                ),
            );
        }

        let mut clean = true;
        for validator in validators {
            if text.contains(validator.as_str()) {
                continue;
            }
            if uses_reusable && reusable_text.contains(validator.as_str()) {
                continue;
            }
            clean = false;
            log.fail(
                FindingKind::Policy,
                format!("ci_enforcement_contract.required_workflows.{workflow}"),
                format!(
                    "workflow {} missing validator call reference: {validator}",
                    workflow_path.display()
                ),
            );
        }
        if clean {
            log.ok(format!("workflow {workflow} carries the gate job and validator references"));
        }
    }
}
