// crates/identity-runtime-contract/src/model.rs
// ============================================================================
// Module: Contract Registry Model
// Description: Named contract registry and gate-to-contract pairing map.
// Purpose: Declare which contracts exist and which gates demand them.
// Dependencies: crate::{schemas, task, validate}
// ============================================================================

//! ## Overview
//! The registry names every contract the engine understands and binds each to
//! its invariant check. The pairing map declares which contracts a required
//! gate transitively demands. Both tables are data: validation walks them
//! rather than hard-coding contract knowledge anywhere else.

// ============================================================================
// SECTION: Imports
// ============================================================================

use identity_runtime_core::FindingLog;

use crate::schemas;
use crate::task::TaskRecord;
use crate::validate::ValidationContext;

// ============================================================================
// SECTION: Contract Definition
// ============================================================================

/// One named contract with its invariant check.
pub struct ContractDef {
    /// Contract name as it appears in the task record.
    pub name: &'static str,
    /// Invariant check accumulating findings into the log.
    pub check: fn(&ValidationContext, &TaskRecord, &mut FindingLog),
}

// ============================================================================
// SECTION: Skeleton and Gates
// ============================================================================

/// Fixed top-level keys every task record must carry.
pub const SKELETON_KEYS: &[&str] = &[
    "objective",
    "state_machine",
    "gates",
    "source_of_truth",
    "escalation_policy",
    "required_artifacts",
    "post_execution_mandatory",
    "evaluation_contract",
    "reasoning_loop_contract",
    "routing_contract",
    "rulebook_contract",
    "blocker_taxonomy_contract",
    "collaboration_trigger_contract",
    "capability_orchestration_contract",
    "knowledge_acquisition_contract",
    "experience_feedback_contract",
    "install_safety_contract",
    "ci_enforcement_contract",
    "capability_arbitration_contract",
];

/// Gates that carry no partner contract but must still be marked required.
pub const BASELINE_GATES: &[&str] = &[
    "document_gate",
    "media_gate",
    "category_compliance_gate",
    "reject_memory_gate",
    "payload_evidence_gate",
    "multimodal_consistency_gate",
    "reasoning_loop_gate",
    "routing_gate",
    "rulebook_gate",
];

/// Gate-to-contract pairings: a required gate demands every paired contract.
pub const GATE_PAIRINGS: &[(&str, &[&str])] = &[
    ("protocol_baseline_review_gate", &["protocol_review_contract"]),
    (
        "identity_update_gate",
        &["identity_update_lifecycle_contract", "trigger_regression_contract"],
    ),
    (
        "collaboration_trigger_gate",
        &["blocker_taxonomy_contract", "collaboration_trigger_contract"],
    ),
    ("orchestration_gate", &["capability_orchestration_contract"]),
    ("knowledge_acquisition_gate", &["knowledge_acquisition_contract"]),
    ("experience_feedback_gate", &["experience_feedback_contract"]),
    ("install_safety_gate", &["install_safety_contract"]),
    ("install_provenance_gate", &["install_provenance_contract"]),
    ("ci_enforcement_gate", &["ci_enforcement_contract"]),
    ("arbitration_gate", &["capability_arbitration_contract"]),
];

/// Validator quorum every update lifecycle contract must require.
pub const UPGRADE_QUORUM_CHECKS: &[&str] = &[
    "runtime-contract",
    "upgrade-prereq",
    "update-lifecycle",
    "trigger-regression",
    "collab-trigger",
    "install-safety",
    "experience-feedback",
    "capability-arbitration",
];

// ============================================================================
// SECTION: Registry
// ============================================================================

/// The full contract registry in validation order.
const REGISTRY: &[ContractDef] = &[
    ContractDef {
        name: "objective",
        check: schemas::check_objective,
    },
    ContractDef {
        name: "state_machine",
        check: schemas::check_state_machine,
    },
    ContractDef {
        name: "source_of_truth",
        check: schemas::check_source_of_truth,
    },
    ContractDef {
        name: "escalation_policy",
        check: schemas::check_escalation_policy,
    },
    ContractDef {
        name: "evaluation_contract",
        check: schemas::check_evaluation,
    },
    ContractDef {
        name: "reasoning_loop_contract",
        check: schemas::check_reasoning_loop,
    },
    ContractDef {
        name: "routing_contract",
        check: schemas::check_routing,
    },
    ContractDef {
        name: "rulebook_contract",
        check: schemas::check_rulebook,
    },
    ContractDef {
        name: "protocol_review_contract",
        check: schemas::check_protocol_review,
    },
    ContractDef {
        name: "identity_update_lifecycle_contract",
        check: schemas::check_update_lifecycle,
    },
    ContractDef {
        name: "trigger_regression_contract",
        check: schemas::check_trigger_regression,
    },
    ContractDef {
        name: "blocker_taxonomy_contract",
        check: schemas::check_blocker_taxonomy,
    },
    ContractDef {
        name: "collaboration_trigger_contract",
        check: schemas::check_collaboration_trigger,
    },
    ContractDef {
        name: "capability_orchestration_contract",
        check: schemas::check_orchestration,
    },
    ContractDef {
        name: "knowledge_acquisition_contract",
        check: schemas::check_knowledge_acquisition,
    },
    ContractDef {
        name: "experience_feedback_contract",
        check: schemas::check_experience_feedback,
    },
    ContractDef {
        name: "install_safety_contract",
        check: schemas::check_install_safety,
    },
    ContractDef {
        name: "install_provenance_contract",
        check: schemas::check_install_provenance,
    },
    ContractDef {
        name: "ci_enforcement_contract",
        check: schemas::check_ci_enforcement,
    },
    ContractDef {
        name: "capability_arbitration_contract",
        check: schemas::check_capability_arbitration,
    },
    ContractDef {
        name: "agent_handoff_contract",
        check: schemas::check_agent_handoff,
    },
    ContractDef {
        name: "learning_verification_contract",
        check: schemas::check_learning_verification,
    },
];

/// Returns the full contract registry in validation order.
#[must_use]
pub fn registry() -> &'static [ContractDef] {
    REGISTRY
}
