// crates/identity-runtime-validate/src/validators/changelog.rs
// ============================================================================
// Module: Changelog Validator
// Description: Requires changelog updates across a significant git range.
// Purpose: Keep protocol and runtime changes documented.
// Dependencies: crate::git, identity-runtime-core
// ============================================================================

//! ## Overview
//! Over `base..head`, any change matching the significant set (identity,
//! scripts, skills, workflows, reference docs, README, CHANGELOG) and not
//! exempted (governance snapshots are audited separately) requires the
//! changelog to change in the same range.

// ============================================================================
// SECTION: Imports
// ============================================================================

use identity_runtime_core::FindingKind;
use identity_runtime_core::FindingLog;

use crate::context::ValidatorContext;
use crate::git;
use crate::verdict::Verdict;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Path prefixes whose changes demand a changelog update.
const SIGNIFICANT_PREFIXES: &[&str] =
    &["identity/", "scripts/", "skills/", ".github/workflows/", "docs/references/"];

/// Exact paths whose changes demand a changelog update.
const SIGNIFICANT_FILES: &[&str] = &["README.md", "CHANGELOG.md"];

/// Prefixes exempt from the changelog rule.
const EXEMPT_PREFIXES: &[&str] = &["docs/governance/"];

/// Changelog document path.
const CHANGELOG_PATH: &str = "CHANGELOG.md";

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// Runs the changelog validator.
#[must_use]
pub fn run(ctx: &ValidatorContext) -> Verdict {
    let mut log = FindingLog::new();
    let root = ctx.layout.root();

    let range =
        git::resolve_range(root, ctx.git_base.as_deref(), ctx.git_head.as_deref());
    let (base, head) = match range {
        Ok(range) => range,
        Err(err) => {
            log.warn(format!("fallback base resolution failed; skip enforcement: {err}"));
            return Verdict::from_log("changelog", log);
        }
    };

    let files = match git::changed_files(root, &base, &head) {
        Ok(files) => files,
        Err(err) => {
            log.fail(FindingKind::Io, "git", format!("{err}"));
            return Verdict::from_log("changelog", log);
        }
    };
    if files.is_empty() {
        log.ok(format!("no changed files in range {base}..{head}"));
        return Verdict::from_log("changelog", log);
    }

    let significant: Vec<&String> =
        files.iter().filter(|path| is_significant(path)).collect();
    log.info(format!("range: {base}..{head}"));
    log.info(format!("changed files: {}", files.len()));
    log.info(format!("significant changed files: {}", significant.len()));

    if !root.join(CHANGELOG_PATH).exists() {
        log.fail(
            FindingKind::Reference,
            CHANGELOG_PATH,
            format!("changelog file missing: {CHANGELOG_PATH}"),
        );
        return Verdict::from_log("changelog", log);
    }

    if significant.is_empty() {
        log.ok("no significant protocol/runtime changes; changelog update not required");
        return Verdict::from_log("changelog", log);
    }

    if files.iter().any(|path| path == CHANGELOG_PATH) {
        log.ok("significant changes detected and CHANGELOG.md updated");
        log.line("Changelog validation PASSED");
    } else {
        log.fail(
            FindingKind::Policy,
            CHANGELOG_PATH,
            "significant changes detected but CHANGELOG.md was not updated in this range",
        );
        for path in significant {
            log.info(format!("  - {path}"));
        }
    }
    Verdict::from_log("changelog", log)
}

// ============================================================================
// SECTION: Classification
// ============================================================================

/// Returns `true` when a changed path demands a changelog update.
#[must_use]
pub fn is_significant(path: &str) -> bool {
    if SIGNIFICANT_FILES.contains(&path) {
        return true;
    }
    if EXEMPT_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
        return false;
    }
    SIGNIFICANT_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}
