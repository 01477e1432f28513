// crates/identity-runtime-engine/src/cigate.rs
// ============================================================================
// Module: CI Enforcement Gate
// Description: Diff-scoped evidence enforcement over a git range.
// Purpose: Block identity-core changes that lack signed execution evidence.
// Dependencies: crate::upgrade, identity-runtime-{core,contract,validate}
// ============================================================================

//! ## Overview
//! Given `base..head`, the gate applies three rules: the changelog rule
//! (significant changes require a changelog change), the self-upgrade rule
//! (identity-core changes require a well-formed execution report, its sibling
//! patch plan, required-check coverage, SHA-256-verified logs, and optional
//! CI-context binding), and the install-provenance rule (the declared
//! operation chain within the trailing window). The gate never demands an
//! upgrade report when no identity-core file changed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;

use identity_runtime_contract::TaskRecord;
use identity_runtime_contract::task::object_of;
use identity_runtime_contract::task::str_list;
use identity_runtime_core::Catalog;
use identity_runtime_core::CatalogError;
use identity_runtime_core::FindingKind;
use identity_runtime_core::FindingLog;
use identity_runtime_core::IdentityId;
use identity_runtime_core::RuntimeLayout;
use identity_runtime_core::Timestamp;
use identity_runtime_core::document;
use identity_runtime_core::hashing;
use identity_runtime_validate::GitError;
use identity_runtime_validate::ValidatorContext;
use identity_runtime_validate::git;
use identity_runtime_validate::run_one;
use identity_runtime_validate::validators::changelog::is_significant;
use thiserror::Error;

use crate::upgrade::ExecutionReport;

// ============================================================================
// SECTION: Options and Outcome
// ============================================================================

/// Inputs to one gate evaluation.
#[derive(Debug, Clone)]
pub struct CiGateOptions {
    /// Target identity.
    pub identity_id: IdentityId,
    /// Git range base; resolved to `HEAD~1` when absent.
    pub base: Option<String>,
    /// Git range head; resolved to `HEAD` when absent.
    pub head: Option<String>,
    /// Require `execution_context` to bind to the CI environment.
    pub require_ci_binding: bool,
    /// Expected `GITHUB_RUN_ID` when binding is required.
    pub expected_run_id: Option<String>,
    /// Expected `GITHUB_SHA` when binding is required.
    pub expected_sha: Option<String>,
    /// Gate clock.
    pub now: Timestamp,
}

/// Gate outcome with itemized reasons.
#[derive(Debug, Clone)]
pub struct CiGateOutcome {
    /// Report lines in emission order.
    pub lines: Vec<String>,
    /// `true` when every applicable rule passed.
    pub pass: bool,
}

/// Errors raised before the gate could evaluate.
#[derive(Debug, Error)]
pub enum CiGateError {
    /// Git range resolution or diff failed.
    #[error(transparent)]
    Git(#[from] GitError),
    /// Catalog or pack resolution failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    /// A document load failed.
    #[error(transparent)]
    Document(#[from] identity_runtime_core::DocumentError),
}

// ============================================================================
// SECTION: Gate Evaluation
// ============================================================================

/// Evaluates the CI enforcement gate over a git range.
///
/// # Errors
///
/// Returns [`CiGateError`] when git or the catalog cannot be consulted.
pub fn enforce(layout: &RuntimeLayout, options: &CiGateOptions) -> Result<CiGateOutcome, CiGateError> {
    let mut log = FindingLog::new();
    let root = layout.root();

    let (base, head) =
        git::resolve_range(root, options.base.as_deref(), options.head.as_deref())?;
    let changed = git::changed_files(root, &base, &head)?;
    log.info(format!("range: {base}..{head}"));

    if changed.is_empty() {
        log.ok("no changed files in range; enforcement skipped");
        return Ok(outcome(log));
    }

    changelog_rule(root, &changed, &mut log);

    let catalog = Catalog::load(&layout.catalog_path())?;
    let task_path = catalog.resolve_task(root, &options.identity_id)?;
    let task = TaskRecord::load(&task_path)?;

    let touched_core = touched_core_files(&changed, &options.identity_id);
    if touched_core.is_empty() {
        log.ok("no identity-core contract files changed; enforcement pass");
    } else {
        self_upgrade_rule(layout, options, &task, &changed, &touched_core, &mut log);
    }

    install_provenance_rule(layout, options, &task, &mut log);

    Ok(outcome(log))
}

/// Converts the log into an outcome.
fn outcome(log: FindingLog) -> CiGateOutcome {
    let pass = log.is_ok();
    let (lines, _) = log.into_parts();
    CiGateOutcome {
        lines,
        pass,
    }
}

// ============================================================================
// SECTION: Changelog Rule
// ============================================================================

/// Requires a changelog change alongside significant changes.
fn changelog_rule(root: &Path, changed: &[String], log: &mut FindingLog) {
    let significant: Vec<&String> =
        changed.iter().filter(|path| is_significant(path)).collect();
    if significant.is_empty() {
        log.ok("no significant changes; changelog rule not applicable");
        return;
    }
    if !root.join("CHANGELOG.md").exists() {
        log.fail(FindingKind::Reference, "CHANGELOG.md", "changelog file missing: CHANGELOG.md");
        return;
    }
    if changed.iter().any(|path| path == "CHANGELOG.md") {
        log.ok("significant changes detected and CHANGELOG.md updated");
    } else {
        log.fail(
            FindingKind::Policy,
            "CHANGELOG.md",
            "significant changes detected but CHANGELOG.md was not updated in this range",
        );
    }
}

// ============================================================================
// SECTION: Self-Upgrade Rule
// ============================================================================

/// Returns the changed identity-core file paths.
fn touched_core_files(changed: &[String], identity_id: &IdentityId) -> Vec<String> {
    let prefixes =
        [format!("identity/{identity_id}/"), format!("identity/packs/{identity_id}/")];
    changed
        .iter()
        .filter(|path| {
            prefixes.iter().any(|prefix| path.starts_with(prefix))
                && identity_runtime_core::pack::CORE_PACK_FILES
                    .iter()
                    .any(|core| path.ends_with(&format!("/{core}")))
        })
        .cloned()
        .collect()
}

/// Requires matching, well-formed execution evidence for core changes.
fn self_upgrade_rule(
    layout: &RuntimeLayout,
    options: &CiGateOptions,
    task: &TaskRecord,
    changed: &[String],
    touched_core: &[String],
    log: &mut FindingLog,
) {
    for path in touched_core {
        log.info(format!("touched core file: {path}"));
    }

    let report_prefix = format!("identity-upgrade-exec-{}-", options.identity_id);
    let evidence_changed: Vec<&String> = changed
        .iter()
        .filter(|path| {
            path.starts_with("identity/runtime/reports/")
                && path.ends_with(".json")
                && Path::new(path)
                    .file_name()
                    .map(|name| name.to_string_lossy().starts_with(&report_prefix))
                    .unwrap_or(false)
        })
        .collect();

    if evidence_changed.is_empty() {
        log.fail(
            FindingKind::Evidence,
            "identity/runtime/reports",
            "identity-core files changed without self-upgrade evidence report change",
        );
        return;
    }

    let report_candidates: Vec<&&String> = evidence_changed
        .iter()
        .filter(|path| !path.ends_with("-patch-plan.json"))
        .collect();
    if report_candidates.is_empty() {
        log.fail(
            FindingKind::Evidence,
            "identity/runtime/reports",
            "self-upgrade evidence exists but no execution report JSON found",
        );
        return;
    }

    let required_tokens = required_check_tokens(task);
    let mut valid_reports = 0usize;
    for relative in report_candidates {
        if check_report(layout, options, relative, &required_tokens, &evidence_changed, log) {
            valid_reports += 1;
        }
    }

    if valid_reports == 0 {
        log.fail(
            FindingKind::Evidence,
            "identity/runtime/reports",
            "no valid self-upgrade execution evidence report found",
        );
    } else {
        log.ok(format!("self-upgrade enforcement passed (valid_execution_reports={valid_reports})"));
    }
}

/// Reads the quorum tokens from the lifecycle contract.
fn required_check_tokens(task: &TaskRecord) -> Vec<String> {
    task.contract("identity_update_lifecycle_contract")
        .and_then(|lifecycle| object_of(lifecycle, "validation_contract").cloned())
        .map(|validation| str_list(&validation, "required_checks"))
        .unwrap_or_default()
}

/// Validates one changed execution report; returns `true` when valid.
fn check_report(
    layout: &RuntimeLayout,
    options: &CiGateOptions,
    relative: &str,
    required_tokens: &[String],
    evidence_changed: &[&String],
    log: &mut FindingLog,
) -> bool {
    let path = layout.root().join(relative);
    let report: ExecutionReport = match document::load_json(&path) {
        Ok(report) => report,
        Err(err) => {
            log.fail(
                FindingKind::Evidence,
                relative,
                format!("cannot parse evidence report {relative}: {err}"),
            );
            return false;
        }
    };

    let mut valid = true;
    if report.identity_id != options.identity_id {
        log.fail(
            FindingKind::Evidence,
            relative,
            format!("evidence report identity mismatch in {relative}"),
        );
        valid = false;
    }
    if report.run_id.is_blank() {
        log.fail(FindingKind::Evidence, relative, format!("report.run_id missing in {relative}"));
        return false;
    }

    let invocation = &report.creator_invocation;
    if invocation.tool != "identity-creator"
        || invocation.mode != "update"
        || invocation.run_id != report.run_id
    {
        log.fail(
            FindingKind::Evidence,
            relative,
            format!("creator_invocation binding invalid in {relative}"),
        );
        valid = false;
    }

    let missing_tokens: Vec<&String> = required_tokens
        .iter()
        .filter(|token| !report.checks.iter().any(|command| command.contains(token.as_str())))
        .collect();
    if !missing_tokens.is_empty() {
        log.fail(
            FindingKind::Evidence,
            relative,
            format!("evidence report missing required checks in {relative}: {missing_tokens:?}"),
        );
        valid = false;
    }

    for (index, check) in report.check_results.iter().enumerate() {
        let log_path = layout.root().join(&check.log_path);
        if !log_path.exists() {
            log.fail(
                FindingKind::Evidence,
                format!("{relative}#{index}"),
                format!("check log missing: {}", check.log_path),
            );
            valid = false;
            continue;
        }
        match hashing::hash_file(&log_path) {
            Ok(actual) if actual == check.log_sha256 => {}
            Ok(_) => {
                log.fail(
                    FindingKind::Evidence,
                    format!("{relative}#{index}"),
                    format!("check log sha256 mismatch: {}", check.log_path),
                );
                valid = false;
            }
            Err(err) => {
                log.fail(
                    FindingKind::Io,
                    format!("{relative}#{index}"),
                    format!("check log unreadable: {err}"),
                );
                valid = false;
            }
        }
    }

    let plan_name = format!("identity/runtime/reports/{}-patch-plan.json", report.run_id);
    if !evidence_changed.iter().any(|path| ***path == plan_name) {
        log.fail(
            FindingKind::Evidence,
            relative,
            format!("evidence report {relative} missing matching patch plan diff change: {plan_name}"),
        );
        valid = false;
    }

    if options.require_ci_binding {
        let context = &report.execution_context;
        if context.generated_by != "ci" {
            log.fail(
                FindingKind::Evidence,
                relative,
                format!("execution_context.generated_by must be ci in {relative}"),
            );
            valid = false;
        }
        if let Some(expected) = &options.expected_run_id
            && &context.github_run_id != expected
        {
            log.fail(
                FindingKind::Evidence,
                relative,
                format!("execution_context.github_run_id mismatch in {relative}"),
            );
            valid = false;
        }
        if let Some(expected) = &options.expected_sha
            && &context.github_sha != expected
        {
            log.fail(
                FindingKind::Evidence,
                relative,
                format!("execution_context.github_sha mismatch in {relative}"),
            );
            valid = false;
        }
    }

    valid
}

// ============================================================================
// SECTION: Install Provenance Rule
// ============================================================================

/// Applies the install provenance chain rule when the gate is required.
fn install_provenance_rule(
    layout: &RuntimeLayout,
    options: &CiGateOptions,
    task: &TaskRecord,
    log: &mut FindingLog,
) {
    if !task.gate_required("install_provenance_gate") {
        log.ok("install_provenance_gate not required; provenance rule skipped");
        return;
    }

    let ctx = ValidatorContext::new(layout.clone(), options.identity_id.clone(), options.now);
    match run_one(&ctx, "install-provenance") {
        Ok(verdict) => {
            if verdict.ok {
                log.ok("install provenance chain observed");
            } else {
                for finding in verdict.findings {
                    log.fail(finding.kind, finding.id, finding.message);
                }
            }
        }
        Err(err) => log.fail(FindingKind::Io, "install-provenance", format!("{err}")),
    }
}
