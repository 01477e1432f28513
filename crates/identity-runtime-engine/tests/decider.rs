// crates/identity-runtime-engine/tests/decider.rs
// ============================================================================
// Module: Upgrade Decider Tests
// Description: Tests for the metrics-thresholded upgrade decision.
// ============================================================================
//! ## Overview
//! Validates the disjunction, reason rendering, boundary thresholds, and
//! single-rate monotonicity.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use identity_runtime_engine::RouteQualityMetrics;
use identity_runtime_engine::TriggerThresholds;
use identity_runtime_engine::decide_upgrade;
use proptest::proptest;

/// Standard thresholds: ten percent everywhere.
fn thresholds() -> TriggerThresholds {
    TriggerThresholds {
        misroute_rate_percent: 10.0,
        replay_failure_rate_percent: 10.0,
        first_pass_success_drop_percent: 10.0,
    }
}

/// Metrics with the given failure profile.
fn metrics(misroute: f64, replay: f64, first_pass: f64) -> RouteQualityMetrics {
    RouteQualityMetrics {
        misroute_rate: misroute,
        replay_success_rate: replay,
        first_pass_success_rate: first_pass,
        ..RouteQualityMetrics::default()
    }
}

// ============================================================================
// SECTION: Decision Cases
// ============================================================================

/// Tests fully healthy metrics never trigger.
#[test]
fn test_healthy_metrics_no_trigger() {
    let decision = decide_upgrade(&metrics(0.0, 100.0, 100.0), &thresholds());
    assert!(!decision.upgrade_required);
    assert!(decision.reasons.is_empty());
}

/// Tests a crossed misroute rate triggers with the exact citation.
#[test]
fn test_misroute_trigger_reason() {
    let decision = decide_upgrade(&metrics(15.0, 100.0, 100.0), &thresholds());
    assert!(decision.upgrade_required);
    assert_eq!(decision.reasons, vec!["misroute_rate 15 >= threshold 10".to_string()]);
}

/// Tests the replay-failure complement crossing.
#[test]
fn test_replay_failure_trigger() {
    let decision = decide_upgrade(&metrics(0.0, 85.0, 100.0), &thresholds());
    assert!(decision.upgrade_required);
    assert_eq!(decision.reasons, vec!["replay_failure_rate 15 >= threshold 10".to_string()]);
}

/// Tests the first-pass drop crossing.
#[test]
fn test_first_pass_drop_trigger() {
    let decision = decide_upgrade(&metrics(0.0, 100.0, 80.0), &thresholds());
    assert!(decision.upgrade_required);
    assert_eq!(decision.reasons, vec!["first_pass_success_drop 20 >= threshold 10".to_string()]);
}

/// Tests reasons are ordered misroute, replay, first-pass.
#[test]
fn test_reason_order_is_declared_order() {
    let decision = decide_upgrade(&metrics(50.0, 10.0, 10.0), &thresholds());
    assert_eq!(decision.reasons.len(), 3);
    assert!(decision.reasons[0].starts_with("misroute_rate"));
    assert!(decision.reasons[1].starts_with("replay_failure_rate"));
    assert!(decision.reasons[2].starts_with("first_pass_success_drop"));
}

/// Tests exact-threshold values cross (inclusive comparison).
#[test]
fn test_threshold_is_inclusive() {
    let decision = decide_upgrade(&metrics(10.0, 100.0, 100.0), &thresholds());
    assert!(decision.upgrade_required);
}

/// Tests a zero threshold makes every nonzero failure cross.
#[test]
fn test_zero_threshold_crosses_on_any_failure() {
    let zero = TriggerThresholds {
        misroute_rate_percent: 0.0,
        replay_failure_rate_percent: f64::MAX,
        first_pass_success_drop_percent: f64::MAX,
    };
    let decision = decide_upgrade(&metrics(0.1, 100.0, 100.0), &zero);
    assert!(decision.upgrade_required);
}

/// Tests absent threshold fields never trigger.
#[test]
fn test_default_thresholds_never_trigger() {
    let decision = decide_upgrade(&metrics(100.0, 0.0, 0.0), &TriggerThresholds::default());
    assert!(!decision.upgrade_required);
}

// ============================================================================
// SECTION: Monotonicity
// ============================================================================

proptest! {
    /// A triggered decision stays triggered as the failing rate worsens.
    #[test]
    fn test_decision_monotone_in_misroute(base in 0.0f64..100.0, extra in 0.0f64..100.0) {
        let first = decide_upgrade(&metrics(base, 100.0, 100.0), &thresholds());
        let worse = decide_upgrade(&metrics(base + extra, 100.0, 100.0), &thresholds());
        if first.upgrade_required {
            assert!(worse.upgrade_required);
        }
    }
}
