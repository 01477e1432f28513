// crates/identity-runtime-validate/src/registry.rs
// ============================================================================
// Module: Validator Registry
// Description: Named validator table, set labels, and command rendering.
// Purpose: Declare every validator once and resolve sets by label.
// Dependencies: crate::{context, validators, verdict}
// ============================================================================

//! ## Overview
//! Validators are registered once in declared order. Set labels resolve to
//! ordered name lists; the upgrade executor renders each validator's command
//! line through the substitution table here (identity-scope flag for most,
//! git range for the changelog validator, self-test flag for the sample
//! validators).

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::context::ValidatorContext;
use crate::validators;
use crate::verdict::Verdict;

// ============================================================================
// SECTION: Validator Definition
// ============================================================================

/// One registered validator.
pub struct ValidatorDef {
    /// Stable validator name (also the required-check token).
    pub name: &'static str,
    /// Validator entry point.
    pub run: fn(&ValidatorContext) -> Verdict,
    /// `true` when the validator supports a self-test corpus.
    pub supports_self_test: bool,
    /// `true` when the validator consumes a git range.
    pub uses_git_range: bool,
}

// ============================================================================
// SECTION: Registry Table
// ============================================================================

/// All registered validators in declared order.
pub const REGISTRY: &[ValidatorDef] = &[
    ValidatorDef {
        name: "manifest",
        run: validators::manifest::run,
        supports_self_test: false,
        uses_git_range: false,
    },
    ValidatorDef {
        name: "runtime-contract",
        run: validators::runtime_contract::run,
        supports_self_test: false,
        uses_git_range: false,
    },
    ValidatorDef {
        name: "upgrade-prereq",
        run: validators::upgrade_prereq::run,
        supports_self_test: false,
        uses_git_range: false,
    },
    ValidatorDef {
        name: "update-lifecycle",
        run: validators::update_lifecycle::run,
        supports_self_test: false,
        uses_git_range: false,
    },
    ValidatorDef {
        name: "trigger-regression",
        run: validators::trigger_regression::run,
        supports_self_test: false,
        uses_git_range: false,
    },
    ValidatorDef {
        name: "collab-trigger",
        run: validators::collab_trigger::run,
        supports_self_test: true,
        uses_git_range: false,
    },
    ValidatorDef {
        name: "agent-handoff",
        run: validators::agent_handoff::run,
        supports_self_test: true,
        uses_git_range: false,
    },
    ValidatorDef {
        name: "knowledge-acquisition",
        run: validators::knowledge::run,
        supports_self_test: true,
        uses_git_range: false,
    },
    ValidatorDef {
        name: "experience-feedback",
        run: validators::feedback::run,
        supports_self_test: true,
        uses_git_range: false,
    },
    ValidatorDef {
        name: "install-safety",
        run: validators::install_safety::run,
        supports_self_test: false,
        uses_git_range: false,
    },
    ValidatorDef {
        name: "install-provenance",
        run: validators::install_provenance::run,
        supports_self_test: false,
        uses_git_range: false,
    },
    ValidatorDef {
        name: "capability-arbitration",
        run: validators::arbitration::run,
        supports_self_test: true,
        uses_git_range: false,
    },
    ValidatorDef {
        name: "ci-enforcement",
        run: validators::ci_enforcement::run,
        supports_self_test: false,
        uses_git_range: false,
    },
    ValidatorDef {
        name: "orchestration",
        run: validators::orchestration::run,
        supports_self_test: false,
        uses_git_range: false,
    },
    ValidatorDef {
        name: "learning-loop",
        run: validators::learning_loop::run,
        supports_self_test: false,
        uses_git_range: false,
    },
    ValidatorDef {
        name: "changelog",
        run: validators::changelog::run,
        supports_self_test: false,
        uses_git_range: true,
    },
];

/// Required validator set for methodology v1.2.
pub const V1_2_REQUIRED: &[&str] = &[
    "manifest",
    "runtime-contract",
    "upgrade-prereq",
    "update-lifecycle",
    "install-safety",
    "experience-feedback",
    "capability-arbitration",
    "ci-enforcement",
];

/// Candidate validator set for methodology v1.2.
pub const V1_2_CANDIDATES: &[&str] = &[
    "trigger-regression",
    "collab-trigger",
    "agent-handoff",
    "knowledge-acquisition",
    "orchestration",
    "learning-loop",
    "install-provenance",
    "changelog",
];

// ============================================================================
// SECTION: Lookup
// ============================================================================

/// Resolves a validator by name.
#[must_use]
pub fn validator_by_name(name: &str) -> Option<&'static ValidatorDef> {
    REGISTRY.iter().find(|def| def.name == name)
}

/// Resolves a set label to its ordered validator names.
#[must_use]
pub fn set_by_label(label: &str) -> Option<&'static [&'static str]> {
    match label {
        "v1_2_required" => Some(V1_2_REQUIRED),
        "v1_2_candidates" => Some(V1_2_CANDIDATES),
        _ => None,
    }
}

/// Renders the command line recorded for one validator invocation.
///
/// Substitution table: identity-scope flag for most validators, git range
/// for the changelog validator, self-test flag for the sample validators.
#[must_use]
pub fn command_for(def: &ValidatorDef, ctx: &ValidatorContext) -> String {
    if def.uses_git_range {
        let base = ctx.git_base.as_deref().unwrap_or("HEAD~1");
        let head = ctx.git_head.as_deref().unwrap_or("HEAD");
        return format!("identity validate --only {} --base {base} --head {head}", def.name);
    }

    let mut command =
        format!("identity validate --only {} --identity-id {}", def.name, ctx.identity_id);
    if def.supports_self_test && ctx.self_test {
        command.push_str(" --self-test");
    }
    command
}
