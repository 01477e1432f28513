// crates/identity-runtime-validate/src/validators/runtime_contract.rs
// ============================================================================
// Module: Runtime Contract Validator
// Description: Validates the whole task record against the contract model.
// Purpose: Enforce the composite skeleton, gates, pairings, and invariants.
// Dependencies: identity-runtime-contract, identity-runtime-core
// ============================================================================

//! ## Overview
//! Thin validator over [`identity_runtime_contract::validate_task_record`]:
//! resolve the target task record, run the full contract model, and wrap the
//! accumulated findings into a verdict with the standard summary line.

// ============================================================================
// SECTION: Imports
// ============================================================================

use identity_runtime_contract::validate_task_record;
use identity_runtime_core::FindingLog;

use crate::context::ValidatorContext;
use crate::verdict::Verdict;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// Runs the runtime contract validator.
#[must_use]
pub fn run(ctx: &ValidatorContext) -> Verdict {
    let mut log = FindingLog::new();
    log.info(format!("validating CURRENT_TASK for identity={}", ctx.identity_id));

    if let Some(task) = ctx.load_task(&mut log) {
        log.merge(validate_task_record(&ctx.contract_ctx(), &task));
    }

    if log.is_ok() {
        log.line(format!(
            "Identity runtime contract validation PASSED for identity={}",
            ctx.identity_id
        ));
    } else {
        log.line(format!(
            "Identity runtime contract validation FAILED for identity={}",
            ctx.identity_id
        ));
    }
    Verdict::from_log("runtime-contract", log)
}
