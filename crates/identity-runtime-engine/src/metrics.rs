// crates/identity-runtime-engine/src/metrics.rs
// ============================================================================
// Module: Route Quality Metrics and Upgrade Decider
// Description: Metrics document model and the threshold-crossing decision.
// Purpose: Decide deterministically whether an upgrade cycle is warranted.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The decider is a pure function over a route-quality metrics document and
//! the arbitration trigger thresholds. The decision is the disjunction of
//! three rate checks; reasons are rendered in declared order so two runs
//! over the same inputs produce identical reports. Absent metric fields
//! default to healthy; absent thresholds never trigger.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

// ============================================================================
// SECTION: Metrics Document
// ============================================================================

/// Route quality metrics exported from handoff production logs.
///
/// Rates are percentages in `[0, 100]`. Counts are retained for audit; the
/// decider reads only the rates.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RouteQualityMetrics {
    /// Identity the metrics describe.
    #[serde(default)]
    pub identity_id: String,
    /// Task id the metrics were exported under.
    #[serde(default)]
    pub task_id: String,
    /// Glob pattern the handoff logs were read from.
    #[serde(default)]
    pub source_pattern: String,
    /// Total handoff records folded.
    #[serde(default)]
    pub total_routes: u64,
    /// Records whose route hit.
    #[serde(default)]
    pub route_hit_count: u64,
    /// Records flagged as misroutes.
    #[serde(default)]
    pub misroute_count: u64,
    /// Records that used a fallback route.
    #[serde(default)]
    pub fallback_count: u64,
    /// Records that ended blocked.
    #[serde(default)]
    pub blocked_count: u64,
    /// Records that passed without fallback.
    #[serde(default)]
    pub first_pass_success_count: u64,
    /// Records that reused knowledge or applied a rulebook update.
    #[serde(default)]
    pub knowledge_reuse_count: u64,
    /// Records whose replay passed.
    #[serde(default)]
    pub replay_success_count: u64,
    /// Records flagged for policy drift or contract violation.
    #[serde(default)]
    pub policy_drift_incidents: u64,
    /// Route hit rate percentage.
    #[serde(default)]
    pub route_hit_rate: f64,
    /// Misroute rate percentage.
    #[serde(default)]
    pub misroute_rate: f64,
    /// Fallback rate percentage.
    #[serde(default)]
    pub fallback_rate: f64,
    /// First-pass success rate percentage (default healthy).
    #[serde(default = "healthy_rate")]
    pub first_pass_success_rate: f64,
    /// Knowledge reuse rate percentage.
    #[serde(default)]
    pub knowledge_reuse_rate: f64,
    /// Replay success rate percentage (default healthy).
    #[serde(default = "healthy_rate")]
    pub replay_success_rate: f64,
}

/// Default for success rates when the exporter omitted them.
const fn healthy_rate() -> f64 {
    100.0
}

// ============================================================================
// SECTION: Thresholds
// ============================================================================

/// Arbitration trigger thresholds, in percent.
///
/// # Invariants
/// - Absent thresholds deserialize to `f64::MAX` and never trigger.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriggerThresholds {
    /// Misroute rate ceiling.
    #[serde(default = "never_trigger")]
    pub misroute_rate_percent: f64,
    /// Replay failure rate ceiling.
    #[serde(default = "never_trigger")]
    pub replay_failure_rate_percent: f64,
    /// First-pass success drop ceiling.
    #[serde(default = "never_trigger")]
    pub first_pass_success_drop_percent: f64,
}

impl Default for TriggerThresholds {
    fn default() -> Self {
        Self {
            misroute_rate_percent: never_trigger(),
            replay_failure_rate_percent: never_trigger(),
            first_pass_success_drop_percent: never_trigger(),
        }
    }
}

impl TriggerThresholds {
    /// Reads thresholds from an arbitration contract mapping.
    #[must_use]
    pub fn from_contract(contract: &Map<String, Value>) -> Self {
        contract
            .get("trigger_thresholds")
            .cloned()
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_default()
    }
}

/// Threshold default: effectively unreachable.
const fn never_trigger() -> f64 {
    f64::MAX
}

// ============================================================================
// SECTION: Decision
// ============================================================================

/// Decider output: whether an upgrade cycle is warranted, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeDecision {
    /// `true` when any threshold was crossed.
    pub upgrade_required: bool,
    /// Human-readable threshold citations in declared order.
    pub reasons: Vec<String>,
}

/// Decides whether metrics warrant an upgrade cycle.
///
/// Disjunction, evaluated and cited in declared order:
/// misroute rate, replay failure complement, first-pass success drop. The
/// decision is monotone in each failing rate.
#[must_use]
pub fn decide_upgrade(
    metrics: &RouteQualityMetrics,
    thresholds: &TriggerThresholds,
) -> UpgradeDecision {
    let mut reasons = Vec::new();

    let misroute = metrics.misroute_rate;
    if misroute >= thresholds.misroute_rate_percent {
        reasons.push(format!(
            "misroute_rate {misroute} >= threshold {}",
            thresholds.misroute_rate_percent
        ));
    }

    let replay_failure = (100.0 - metrics.replay_success_rate).max(0.0);
    if replay_failure >= thresholds.replay_failure_rate_percent {
        reasons.push(format!(
            "replay_failure_rate {replay_failure} >= threshold {}",
            thresholds.replay_failure_rate_percent
        ));
    }

    let first_pass_drop = (100.0 - metrics.first_pass_success_rate).max(0.0);
    if first_pass_drop >= thresholds.first_pass_success_drop_percent {
        reasons.push(format!(
            "first_pass_success_drop {first_pass_drop} >= threshold {}",
            thresholds.first_pass_success_drop_percent
        ));
    }

    UpgradeDecision {
        upgrade_required: !reasons.is_empty(),
        reasons,
    }
}
