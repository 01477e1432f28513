// crates/identity-runtime-engine/tests/policy.rs
// ============================================================================
// Module: Patch Surface Policy Tests
// Description: Tests for the safe-auto allowlist/denylist matcher.
// ============================================================================
//! ## Overview
//! Validates deny-wins ordering, allowlist-miss denial, fail-closed behavior
//! for missing surface blocks, and glob separator semantics.

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

use identity_runtime_engine::PatchSurfacePolicy;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;

/// Builds an arbitration contract mapping with the given surface block.
fn contract(surface: Value) -> Map<String, Value> {
    let value = json!({"safe_auto_patch_surface": surface});
    match value {
        Value::Object(map) => map,
        _ => unreachable!("fixture is always an object"),
    }
}

// ============================================================================
// SECTION: Matching
// ============================================================================

/// Tests an allowlisted path passes.
#[test]
fn test_allowlisted_path_passes() {
    let policy = PatchSurfacePolicy::from_contract(&contract(json!({
        "allowlist": ["identity/packs/*/RULEBOOK.jsonl"],
        "denylist": []
    })))
    .unwrap();

    assert!(policy.check("identity/packs/demo/RULEBOOK.jsonl").is_none());
}

/// Tests a denylist hit wins over an allowlist hit.
#[test]
fn test_denylist_wins() {
    let policy = PatchSurfacePolicy::from_contract(&contract(json!({
        "allowlist": ["identity/packs/*/RULEBOOK.jsonl"],
        "denylist": ["**/RULEBOOK.jsonl"]
    })))
    .unwrap();

    let violation = policy.check("identity/packs/demo/RULEBOOK.jsonl").unwrap();
    assert_eq!(violation.reason, "denied by pattern: **/RULEBOOK.jsonl");
}

/// Tests an allowlist miss denies.
#[test]
fn test_allowlist_miss_denies() {
    let policy = PatchSurfacePolicy::from_contract(&contract(json!({
        "allowlist": ["identity/packs/*/RULEBOOK.jsonl"],
        "denylist": []
    })))
    .unwrap();

    let violation = policy.check("identity/packs/demo/CURRENT_TASK.json").unwrap();
    assert_eq!(violation.reason, "not matched by allowlist");
}

/// Tests a missing surface block denies every path.
#[test]
fn test_missing_surface_denies_everything() {
    let policy = PatchSurfacePolicy::from_contract(&Map::new()).unwrap();

    let violation = policy.check("identity/packs/demo/RULEBOOK.jsonl").unwrap();
    assert_eq!(violation.reason, "not matched by allowlist");
}

/// Tests single stars do not cross separators while double stars do.
#[test]
fn test_separator_semantics() {
    let policy = PatchSurfacePolicy::from_contract(&contract(json!({
        "allowlist": ["identity/*/RULEBOOK.jsonl"],
        "denylist": []
    })))
    .unwrap();

    assert!(policy.check("identity/demo/RULEBOOK.jsonl").is_none());
    assert!(policy.check("identity/packs/demo/RULEBOOK.jsonl").is_some());
}

/// Tests check_all accumulates every violation in path order.
#[test]
fn test_check_all_accumulates() {
    let policy = PatchSurfacePolicy::from_contract(&contract(json!({
        "allowlist": ["identity/packs/*/TASK_HISTORY.md"],
        "denylist": ["**/RULEBOOK.jsonl"]
    })))
    .unwrap();

    let violations = policy.check_all(&[
        "identity/packs/demo/RULEBOOK.jsonl".to_string(),
        "identity/packs/demo/TASK_HISTORY.md".to_string(),
        "identity/runtime/logs/arbitration/demo-run.json".to_string(),
    ]);
    assert_eq!(violations.len(), 2);
    assert_eq!(violations[0].path, "identity/packs/demo/RULEBOOK.jsonl");
    assert_eq!(violations[1].path, "identity/runtime/logs/arbitration/demo-run.json");
}
