// crates/identity-runtime-contract/src/validate.rs
// ============================================================================
// Module: Whole-Record Validation
// Description: Validates a task record against the full contract model.
// Purpose: Orchestrate skeleton, gate, pairing, and per-contract checks.
// Dependencies: crate::{model, task}, identity-runtime-core
// ============================================================================

//! ## Overview
//! Whole-record validation walks the fixed skeleton, the gate markings, the
//! gate-to-contract pairings, and every registered contract the record
//! references or a required gate demands. Findings accumulate across all
//! steps; the caller receives the complete list. Validation is pure given the
//! record, the evidence tree under the context root, and the context clock.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;

use identity_runtime_core::FindingKind;
use identity_runtime_core::FindingLog;
use identity_runtime_core::IdentityId;
use identity_runtime_core::Timestamp;
use serde_json::Value;

use crate::model;
use crate::model::BASELINE_GATES;
use crate::model::GATE_PAIRINGS;
use crate::model::SKELETON_KEYS;
use crate::task::TaskRecord;

// ============================================================================
// SECTION: Validation Context
// ============================================================================

/// Explicit inputs to contract validation.
///
/// # Invariants
/// - `now` is the only clock validation may observe.
#[derive(Debug, Clone)]
pub struct ValidationContext {
    /// Runtime root every declared path is resolved against.
    pub root: PathBuf,
    /// Identity the record belongs to.
    pub identity_id: IdentityId,
    /// Validation clock for freshness checks.
    pub now: Timestamp,
}

impl ValidationContext {
    /// Creates a validation context.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, identity_id: IdentityId, now: Timestamp) -> Self {
        Self {
            root: root.into(),
            identity_id,
            now,
        }
    }
}

// ============================================================================
// SECTION: Whole-Record Validation
// ============================================================================

/// Validates a task record against the composite contract model.
///
/// Steps: fixed skeleton keys, gate markings (baseline and paired gates must
/// be `required`, values drawn from `required`/`optional`), gate-to-contract
/// pairings, then every registered contract the record carries or a required
/// gate demands.
#[must_use]
pub fn validate_task_record(ctx: &ValidationContext, task: &TaskRecord) -> FindingLog {
    let mut log = FindingLog::new();

    check_skeleton(task, &mut log);
    check_gates(task, &mut log);
    check_pairings(task, &mut log);

    for def in model::registry() {
        let demanded = gate_demands(task, def.name);
        if task.contract(def.name).is_some() || demanded {
            (def.check)(ctx, task, &mut log);
        }
    }

    log
}

/// Checks the fixed skeleton keys and their basic shapes.
fn check_skeleton(task: &TaskRecord, log: &mut FindingLog) {
    for key in SKELETON_KEYS {
        if task.has(key) {
            log.ok(format!("top-level key present: {key}"));
        } else {
            log.fail(FindingKind::Schema, *key, format!("task record missing top-level key: {key}"));
        }
    }

    for key in ["required_artifacts", "post_execution_mandatory"] {
        match task.get(key).and_then(Value::as_array) {
            Some(items) if !items.is_empty() => {}
            Some(_) => {
                log.fail(FindingKind::Schema, key, format!("{key} must be a non-empty array"));
            }
            None if task.has(key) => {
                log.fail(FindingKind::Schema, key, format!("{key} must be an array"));
            }
            None => {}
        }
    }
}

/// Checks gate markings: object shape, enumerated values, required set.
fn check_gates(task: &TaskRecord, log: &mut FindingLog) {
    let Some(gates) = task.gates() else {
        log.fail(FindingKind::Schema, "gates", "gates must be object");
        return;
    };

    for (gate, marking) in gates {
        match marking.as_str() {
            Some("required" | "optional") => {}
            _ => log.fail(
                FindingKind::Schema,
                format!("gates.{gate}"),
                format!("gates.{gate} must be \"required\" or \"optional\""),
            ),
        }
    }

    let mut mandatory: Vec<&str> = BASELINE_GATES.to_vec();
    mandatory.extend(
        GATE_PAIRINGS
            .iter()
            .map(|(gate, _)| *gate)
            .filter(|gate| *gate != "protocol_baseline_review_gate" && *gate != "install_provenance_gate"),
    );
    for gate in mandatory {
        if task.gate_required(gate) {
            log.ok(format!("gates.{gate}=required"));
        } else {
            log.fail(
                FindingKind::Policy,
                format!("gates.{gate}"),
                format!("gates.{gate} must be 'required'"),
            );
        }
    }
}

/// Checks that every required gate's paired contracts are present.
fn check_pairings(task: &TaskRecord, log: &mut FindingLog) {
    for (gate, contracts) in GATE_PAIRINGS {
        if !task.gate_required(gate) {
            continue;
        }
        for contract in *contracts {
            if task.contract(contract).is_none() {
                log.fail(
                    FindingKind::Policy,
                    format!("gates.{gate}"),
                    format!("{contract} must exist when {gate} is required"),
                );
            }
        }
    }
}

/// Returns `true` when any required gate pairs with the named contract.
fn gate_demands(task: &TaskRecord, contract: &str) -> bool {
    GATE_PAIRINGS.iter().any(|(gate, contracts)| {
        contracts.contains(&contract) && task.gate_required(gate)
    })
}
