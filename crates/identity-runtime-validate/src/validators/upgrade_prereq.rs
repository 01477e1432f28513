// crates/identity-runtime-validate/src/validators/upgrade_prereq.rs
// ============================================================================
// Module: Upgrade Prerequisite Validator
// Description: Validates protocol baseline review before identity updates.
// Purpose: Block upgrade cycles that lack fresh, source-covering review.
// Dependencies: identity-runtime-contract, identity-runtime-core
// ============================================================================

//! ## Overview
//! An identity may only enter an upgrade cycle when its protocol baseline
//! review gate is required and a review evidence report exists that covers
//! every mandatory source. The structural and evidence checks are shared with
//! the contract model's protocol review check.

// ============================================================================
// SECTION: Imports
// ============================================================================

use identity_runtime_contract::schemas;
use identity_runtime_core::FindingKind;
use identity_runtime_core::FindingLog;

use crate::context::ValidatorContext;
use crate::verdict::Verdict;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// Runs the upgrade prerequisite validator.
#[must_use]
pub fn run(ctx: &ValidatorContext) -> Verdict {
    let mut log = FindingLog::new();
    log.info(format!("validating identity update prereq for: {}", ctx.identity_id));

    let Some(task) = ctx.load_task(&mut log) else {
        return Verdict::from_log("upgrade-prereq", log);
    };

    if task.gate_required("protocol_baseline_review_gate") {
        log.ok("gates.protocol_baseline_review_gate=required");
    } else {
        log.fail(
            FindingKind::Policy,
            "gates.protocol_baseline_review_gate",
            "gates.protocol_baseline_review_gate must be required for identity update safety",
        );
        return Verdict::from_log("upgrade-prereq", log);
    }

    schemas::check_protocol_review(&ctx.contract_ctx(), &task, &mut log);

    if log.is_ok() {
        log.line("Identity update prerequisite validation PASSED");
    }
    Verdict::from_log("upgrade-prereq", log)
}
