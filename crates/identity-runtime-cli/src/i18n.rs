// crates/identity-runtime-cli/src/i18n.rs
// ============================================================================
// Module: CLI Message Catalog
// Description: Provides the message catalog and translation utilities.
// Purpose: Centralize user-facing strings for consistent output.
// Dependencies: Standard library collections and formatting utilities.
// ============================================================================

//! ## Overview
//! The identity CLI stores user-facing strings in a small translation catalog
//! to enforce consistent messaging. All runtime output should be routed
//! through the [`t!`](crate::t) macro. Validator report lines are engine data
//! (they are written into hashed log files) and do not pass through here.
//!
//! ## Invariants
//! - The catalog is initialized once and read-only thereafter.
//! - Missing keys fall back to the key itself to avoid panics.
//! - Placeholder substitutions preserve deterministic order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// SECTION: Types
// ============================================================================

/// A formatted message argument captured by the [`macro@crate::t`] macro.
#[derive(Clone)]
pub struct MessageArg {
    /// The placeholder name used in message templates (e.g., `"path"`).
    pub key: &'static str,
    /// The formatted string value to substitute for this placeholder.
    pub value: String,
}

impl MessageArg {
    /// Constructs a new [`MessageArg`] from a key and displayable value.
    pub fn new(key: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Static catalog entries loaded into the message bundle.
const CATALOG_ITEMS: &[(&str, &str)] = &[
    ("main.version", "identity {version}"),
    ("output.stream.stdout", "stdout"),
    ("output.stream.stderr", "stderr"),
    ("output.stream.unknown", "output"),
    ("output.write_failed", "Failed to write to {stream}: {error}"),
    ("init.ok", "[OK] created identity pack: {path}"),
    ("init.registered", "[OK] registered identity in catalog: {path}"),
    ("init.failed", "[FAIL] {error}"),
    ("validate.header", "[INFO] running validator set {label} for identity={id}"),
    ("validate.check", "[{status}] {name}"),
    ("validate.status.ok", "OK"),
    ("validate.status.fail", "FAIL"),
    ("validate.summary.pass", "[OK] validator set passed for identity={id}"),
    ("validate.summary.fail", "[FAIL] validator set failed for identity={id}"),
    ("validate.failed", "[FAIL] {error}"),
    ("compile.ok", "Wrote {path}"),
    ("compile.check.ok", "[OK] compiled brief is up to date"),
    ("compile.check.stale", "[FAIL] compiled brief is stale: {path}"),
    ("compile.failed", "[FAIL] {error}"),
    ("activate.ok", "[OK] activated identity in catalog: {id}"),
    ("activate.failed", "[FAIL] {error}"),
    ("update.report", "report={path}"),
    ("update.upgrade_required", "upgrade_required={value}"),
    ("update.all_ok", "all_ok={value}"),
    ("update.next.review", "next_action=review_required: apply patch plan via PR"),
    ("update.next.applied", "next_action=safe_auto_applied_and_validated"),
    ("update.next.none", "next_action=no_upgrade_triggered"),
    ("update.next.blocked", "next_action=blocked_by_safe_auto_path_policy"),
    ("update.failed", "[FAIL] {error}"),
    ("install.report", "report={path}"),
    ("install.mirror", "mirror={path}"),
    ("install.conflict", "conflict_type={value}"),
    ("install.action", "action={value}"),
    ("install.abort", "next_action=abort_and_explain_conflict"),
    ("install.verify.ok", "[OK] install report verified: {id}"),
    ("install.verify.report", "verify_report={path}"),
    ("install.rollback.ok", "[OK] rollback complete -> {path}"),
    ("install.failed", "[FAIL] {error}"),
    ("status.line", "identity_id={id} pack_path={path}"),
    ("status.file", "- file {name}: exists={exists}"),
    ("status.check", "- check ok={ok} code={code}: {command}"),
    ("status.summary", "all_checks_pass={value}"),
    ("status.failed", "[FAIL] {error}"),
    ("list.default", "default_identity={id}"),
    ("list.row", "{index}. [{star}] id={id} status={status} pack_exists={exists} priority={priority} path={path}"),
    ("list.failed", "[FAIL] {error}"),
    ("cigate.pass", "[OK] ci gate passed"),
    ("cigate.fail", "[FAIL] ci gate failed"),
    ("cigate.failed", "[FAIL] {error}"),
    ("metrics.ok", "[OK] route quality metrics exported: {path}"),
    ("metrics.failed", "[FAIL] {error}"),
];

// ============================================================================
// SECTION: Translation
// ============================================================================

/// Translates `key` using the catalog while substituting `args`.
#[must_use]
pub fn translate(key: &str, args: Vec<MessageArg>) -> String {
    let template = catalog().get(key).copied().unwrap_or(key);
    if args.is_empty() {
        return template.to_string();
    }

    let mut result = template.to_string();
    for arg in args {
        let placeholder = format!("{{{}}}", arg.key);
        result = result.replace(&placeholder, &arg.value);
    }
    result
}

/// Returns the static catalog used by the CLI.
fn catalog() -> &'static HashMap<&'static str, &'static str> {
    static CATALOG: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();

    CATALOG.get_or_init(|| CATALOG_ITEMS.iter().copied().collect())
}

// ============================================================================
// SECTION: Macro
// ============================================================================

/// Formats a catalog message from a key and named arguments.
///
/// # Arguments
///
/// - `$key` must match a catalog entry.
/// - Named arguments are substituted into `{placeholder}` positions.
///
/// # Returns
///
/// A [`String`] with placeholders substituted.
#[macro_export]
macro_rules! t {
    ($key:literal $(, $name:ident = $value:expr )* $(,)?) => {{
        let args = ::std::vec![
            $(
                $crate::i18n::MessageArg::new(stringify!($name), $value.to_string()),
            )*
        ];
        $crate::i18n::translate($key, args)
    }};
}
