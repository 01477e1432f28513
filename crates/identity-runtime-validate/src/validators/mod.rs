// crates/identity-runtime-validate/src/validators/mod.rs
// ============================================================================
// Module: Validator Implementations
// Description: One module per registered validator.
// Purpose: Keep each validator independently readable and invocable.
// Dependencies: sibling validator modules
// ============================================================================

//! ## Overview
//! Each module exposes a single `run(&ValidatorContext) -> Verdict` entry
//! point. Validators are pure over the task record, the evidence tree, and
//! the context clock; the changelog validator additionally observes git.

/// Agent handoff log validator.
pub mod agent_handoff;
/// Capability arbitration validator.
pub mod arbitration;
/// Changelog git-range validator.
pub mod changelog;
/// CI enforcement contract validator.
pub mod ci_enforcement;
/// Collaboration trigger validator.
pub mod collab_trigger;
/// Experience feedback governance validator.
pub mod feedback;
/// Install provenance validator.
pub mod install_provenance;
/// Install safety validator.
pub mod install_safety;
/// Knowledge acquisition validator.
pub mod knowledge;
/// Learning loop linkage validator.
pub mod learning_loop;
/// Catalog manifest validator.
pub mod manifest;
/// Capability orchestration validator.
pub mod orchestration;
/// Whole-record runtime contract validator.
pub mod runtime_contract;
/// Trigger regression suite validator.
pub mod trigger_regression;
/// Update lifecycle validator.
pub mod update_lifecycle;
/// Protocol baseline review prerequisite validator.
pub mod upgrade_prereq;
