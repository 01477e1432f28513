// crates/identity-runtime-validate/src/validators/orchestration.rs
// ============================================================================
// Module: Capability Orchestration Validator
// Description: Validates the capability orchestration contract.
// Purpose: Require complete per-task-type routes and failure classes.
// Dependencies: identity-runtime-contract, identity-runtime-core
// ============================================================================

//! ## Overview
//! Purely structural: the orchestration contract's route table, preflight
//! requirements, failure classification, and evidence schema are all
//! enforced by the shared contract check.

// ============================================================================
// SECTION: Imports
// ============================================================================

use identity_runtime_contract::schemas;
use identity_runtime_core::FindingLog;

use crate::context::ValidatorContext;
use crate::verdict::Verdict;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// Runs the orchestration validator.
#[must_use]
pub fn run(ctx: &ValidatorContext) -> Verdict {
    let mut log = FindingLog::new();
    log.info(format!("validate orchestration contract for identity: {}", ctx.identity_id));

    if let Some(task) = ctx.load_task(&mut log) {
        schemas::check_orchestration(&ctx.contract_ctx(), &task, &mut log);
    }

    if log.is_ok() {
        log.line("Capability orchestration contract validation PASSED");
    }
    Verdict::from_log("orchestration", log)
}
