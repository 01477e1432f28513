// crates/identity-runtime-cli/tests/i18n.rs
// ============================================================================
// Module: CLI Message Catalog Tests
// Description: Tests for catalog lookup and placeholder substitution.
// ============================================================================
//! ## Overview
//! Validates catalog hits, the missing-key fallback, and deterministic
//! placeholder substitution.

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

use identity_runtime_cli::i18n::MessageArg;
use identity_runtime_cli::i18n::translate;
use identity_runtime_cli::t;

// ============================================================================
// SECTION: Catalog Lookup
// ============================================================================

/// Tests a known key renders its template.
#[test]
fn test_known_key_renders_template() {
    let message = translate("update.next.none", Vec::new());
    assert_eq!(message, "next_action=no_upgrade_triggered");
}

/// Tests an unknown key falls back to the key itself.
#[test]
fn test_missing_key_falls_back_to_key() {
    let message = translate("no.such.key", Vec::new());
    assert_eq!(message, "no.such.key");
}

// ============================================================================
// SECTION: Substitution
// ============================================================================

/// Tests placeholder substitution through the macro.
#[test]
fn test_macro_substitutes_placeholders() {
    let message = t!("update.report", path = "identity/runtime/reports/run.json");
    assert_eq!(message, "report=identity/runtime/reports/run.json");
}

/// Tests multiple placeholders substitute in declared order.
#[test]
fn test_multiple_placeholders() {
    let message = translate(
        "status.line",
        vec![MessageArg::new("id", "demo"), MessageArg::new("path", "identity/packs/demo")],
    );
    assert_eq!(message, "identity_id=demo pack_path=identity/packs/demo");
}

/// Tests untouched placeholders remain when arguments are missing.
#[test]
fn test_unmatched_placeholder_preserved() {
    let message = translate("status.line", vec![MessageArg::new("id", "demo")]);
    assert_eq!(message, "identity_id=demo pack_path={path}");
}
