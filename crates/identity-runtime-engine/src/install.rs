// crates/identity-runtime-engine/src/install.rs
// ============================================================================
// Module: Identity Installer
// Description: Signature-classified pack install, verify, and rollback.
// Purpose: Never destroy existing state without a backup and a report.
// Dependencies: identity-runtime-core, serde
// ============================================================================

//! ## Overview
//! Source and destination trees reduce to content signatures; the conflict
//! classification drives the action: fresh installs and destructive replaces
//! apply guarded (backup first on replace), identical trees no-op with a
//! report, and anything else aborts with an explanation. Every mutation
//! emits a report under the install reports directory and mirrors it into
//! the examples tree for sample-validator consumption.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use identity_runtime_core::Catalog;
use identity_runtime_core::CatalogEntry;
use identity_runtime_core::CatalogError;
use identity_runtime_core::DocumentError;
use identity_runtime_core::HashError;
use identity_runtime_core::IdentityId;
use identity_runtime_core::ReportId;
use identity_runtime_core::RuntimeLayout;
use identity_runtime_core::Timestamp;
use identity_runtime_core::document;
use identity_runtime_core::evidence;
use identity_runtime_core::hashing;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Classification
// ============================================================================

/// Installer operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstallOperation {
    /// Classify and report without mutation.
    Plan,
    /// Full install pass without mutation.
    DryRun,
    /// Mutating install per classification.
    Install,
    /// Re-check the latest report.
    Verify,
    /// Restore a tree from a named backup.
    Rollback,
}

impl fmt::Display for InstallOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plan => f.write_str("plan"),
            Self::DryRun => f.write_str("dry-run"),
            Self::Install => f.write_str("install"),
            Self::Verify => f.write_str("verify"),
            Self::Rollback => f.write_str("rollback"),
        }
    }
}

/// Conflict classification between source and destination trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    /// Destination absent.
    FreshInstall,
    /// Byte-identical trees.
    SameSignature,
    /// Caller requested a destructive replace.
    DestructiveReplace,
    /// Divergent trees without a destructive flag.
    CompatibleUpgrade,
}

/// Action derived from the conflict classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallAction {
    /// Copy the source tree (after backup on replace).
    GuardedApply,
    /// Do nothing, report only.
    NoOpWithReport,
    /// Refuse and explain the conflict.
    AbortAndExplain,
    /// Verification outcome marker.
    Verified,
}

/// Classifies an install conflict.
///
/// | condition | conflict | action |
/// |---|---|---|
/// | destination absent | fresh_install | guarded_apply |
/// | signatures equal | same_signature | no_op_with_report |
/// | destructive flag | destructive_replace | guarded_apply |
/// | otherwise | compatible_upgrade | abort_and_explain |
#[must_use]
pub fn classify_conflict(
    source_signature: &str,
    destination_signature: Option<&str>,
    destructive_replace: bool,
) -> (ConflictType, InstallAction) {
    match destination_signature {
        None => (ConflictType::FreshInstall, InstallAction::GuardedApply),
        Some(destination) if !source_signature.is_empty() && source_signature == destination => {
            (ConflictType::SameSignature, InstallAction::NoOpWithReport)
        }
        Some(_) if destructive_replace => {
            (ConflictType::DestructiveReplace, InstallAction::GuardedApply)
        }
        Some(_) => (ConflictType::CompatibleUpgrade, InstallAction::AbortAndExplain),
    }
}

// ============================================================================
// SECTION: Report Document
// ============================================================================

/// Installer invocation block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallerInvocation {
    /// Producing tool id.
    pub tool: String,
    /// Tool entry point.
    pub entrypoint: String,
    /// Rendered command line.
    pub command: String,
}

/// Install report emitted for every operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallReport {
    /// Report identifier.
    pub report_id: ReportId,
    /// Target identity.
    pub identity_id: IdentityId,
    /// Report generation stamp.
    pub generated_at: Timestamp,
    /// Operation that produced this report.
    pub operation: InstallOperation,
    /// Conflict classification.
    pub conflict_type: ConflictType,
    /// Derived action.
    pub action: InstallAction,
    /// Source pack path.
    pub source_pack: String,
    /// Target pack path.
    pub target_pack: String,
    /// Source tree signature.
    pub source_signature: String,
    /// Target tree signature before mutation, empty when absent.
    pub target_signature_before: String,
    /// Paths preserved by the operation.
    pub preserved_paths: Vec<String>,
    /// `true` for plan and dry-run operations.
    pub dry_run: bool,
    /// Files copied by the operation.
    pub changed_files: Vec<String>,
    /// Producing-tool binding.
    pub installer_invocation: InstallerInvocation,
    /// Backup directory, present after a guarded replace.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub backup_ref: String,
    /// Rollback reference (`restore_from:<path>`), present after a backup.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub rollback_ref: String,
    /// Report id this verify run checked, present on verify reports.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub verified_report_id: String,
}

/// Outcome of one installer invocation.
#[derive(Debug, Clone)]
pub struct InstallOutcome {
    /// Emitted report.
    pub report: InstallReport,
    /// Report path on disk.
    pub report_path: PathBuf,
    /// Mirror path, present for mutating operations.
    pub mirror_path: Option<PathBuf>,
    /// Process exit code.
    pub exit_code: u8,
}

// ============================================================================
// SECTION: Options and Errors
// ============================================================================

/// Inputs to one installer invocation.
#[derive(Debug, Clone)]
pub struct InstallOptions {
    /// Target identity.
    pub identity_id: IdentityId,
    /// Source pack override; defaults to `<pack_root>/<id>`.
    pub source_pack: Option<PathBuf>,
    /// Target root; defaults to the canonical packs root.
    pub target_root: Option<PathBuf>,
    /// Pack root for default source resolution.
    pub pack_root: Option<PathBuf>,
    /// Register the identity in the catalog after install.
    pub register: bool,
    /// Activate the identity on registration.
    pub activate: bool,
    /// Permit destructive replace with backup.
    pub destructive_replace: bool,
    /// Title for catalog registration.
    pub title: String,
    /// Description for catalog registration.
    pub description: String,
    /// Rollback reference (`restore_from:<path>`).
    pub rollback_ref: Option<String>,
    /// Catalog document override.
    pub catalog: Option<PathBuf>,
    /// Invocation clock.
    pub now: Timestamp,
}

/// Errors raised by installer preconditions.
#[derive(Debug, Error)]
pub enum InstallError {
    /// Source pack not found.
    #[error("source pack not found: {0} (pass --source-pack)")]
    SourceNotFound(PathBuf),
    /// Catalog failure during registration.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    /// Document read/write failure.
    #[error(transparent)]
    Document(#[from] DocumentError),
    /// Tree hashing failure.
    #[error(transparent)]
    Hash(#[from] HashError),
    /// Tree copy failure.
    #[error("failed to copy {path}: {source}")]
    Copy {
        /// Path that could not be copied.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// Rollback reference missing or malformed.
    #[error("rollback_ref format invalid: {0} (expected restore_from:<path>)")]
    BadRollbackRef(String),
    /// Backup path for rollback not found.
    #[error("backup path not found: {0}")]
    BackupNotFound(PathBuf),
    /// No install report found for verification.
    #[error("no install report found under {0} for identity={1}")]
    NoReport(PathBuf, IdentityId),
    /// Latest report failed verification.
    #[error("install report verification failed: {0}")]
    VerifyFailed(String),
}

// ============================================================================
// SECTION: Entry Points
// ============================================================================

/// Runs the `plan` operation: classify and report, no mutation.
///
/// # Errors
///
/// Returns [`InstallError`] on precondition or I/O failure.
pub fn plan(layout: &RuntimeLayout, options: &InstallOptions) -> Result<InstallOutcome, InstallError> {
    let paths = resolve_paths(layout, options)?;
    let (conflict_type, action) = classify(&paths, options);
    let report = build_report(options, InstallOperation::Plan, conflict_type, action, &paths, ReportExtras::plan());
    let report_path = write_report(layout, &report)?;
    Ok(InstallOutcome {
        report,
        report_path,
        mirror_path: None,
        exit_code: 0,
    })
}

/// Runs the `dry-run` or `install` operation.
///
/// # Errors
///
/// Returns [`InstallError`] on precondition or I/O failure.
pub fn install(
    layout: &RuntimeLayout,
    options: &InstallOptions,
    dry_run: bool,
) -> Result<InstallOutcome, InstallError> {
    let paths = resolve_paths(layout, options)?;
    let (conflict_type, action) = classify(&paths, options);

    let mut extras = ReportExtras {
        dry_run,
        ..ReportExtras::default()
    };
    if !dry_run && action == InstallAction::GuardedApply {
        if paths.destination.exists() {
            let backup_dir = layout
                .install_backups_dir()
                .join(format!("{}-{}", options.identity_id, options.now.unix_seconds()));
            copy_tree(&paths.destination, &backup_dir)?;
            extras.rollback_ref = format!("restore_from:{}", backup_dir.display());
            extras.backup_ref = backup_dir.display().to_string();
        }
        extras.changed_files = sync_tree(&paths.source, &paths.destination)?;
    }

    if options.register && !dry_run {
        register_identity(layout, options, &paths)?;
    }

    let operation = if dry_run { InstallOperation::DryRun } else { InstallOperation::Install };
    let report = build_report(options, operation, conflict_type, action, &paths, extras);
    let report_path = write_report(layout, &report)?;

    let mirror_path = layout.install_examples_dir().join(format!(
        "install-report-{}-{}.json",
        options.now.date_stamp(),
        options.identity_id
    ));
    document::write_json_pretty(&mirror_path, &report)?;

    Ok(InstallOutcome {
        report,
        report_path,
        mirror_path: Some(mirror_path),
        exit_code: 0,
    })
}

/// Runs the `verify` operation over the latest report.
///
/// # Errors
///
/// Returns [`InstallError`] when no report exists or verification fails.
pub fn verify(layout: &RuntimeLayout, options: &InstallOptions) -> Result<InstallOutcome, InstallError> {
    let reports_dir = layout.install_reports_dir();
    let pattern = format!(
        "identity/runtime/reports/install/identity-install-{}-*.json",
        options.identity_id
    );
    let latest = evidence::latest(layout.root(), &pattern, None)
        .ok()
        .flatten()
        .ok_or_else(|| InstallError::NoReport(reports_dir, options.identity_id.clone()))?;

    let checked: InstallReport = document::load_json(&latest)?;
    if checked.identity_id != options.identity_id {
        return Err(InstallError::VerifyFailed("report identity mismatch".to_string()));
    }
    if checked.installer_invocation.tool != "identity-installer" {
        return Err(InstallError::VerifyFailed(
            "installer_invocation.tool must be identity-installer".to_string(),
        ));
    }

    let paths = ResolvedPaths {
        source: PathBuf::from(&checked.source_pack),
        destination: PathBuf::from(&checked.target_pack),
        source_signature: checked.source_signature.clone(),
        destination_signature: if checked.target_signature_before.is_empty() {
            None
        } else {
            Some(checked.target_signature_before.clone())
        },
        preserved: checked.preserved_paths.clone(),
    };
    let mut report = build_report(
        options,
        InstallOperation::Verify,
        checked.conflict_type,
        InstallAction::Verified,
        &paths,
        ReportExtras::default(),
    );
    report.verified_report_id = checked.report_id.as_str().to_string();
    let report_path = write_report(layout, &report)?;

    Ok(InstallOutcome {
        report,
        report_path,
        mirror_path: None,
        exit_code: 0,
    })
}

/// Runs the `rollback` operation from a named backup.
///
/// # Errors
///
/// Returns [`InstallError`] on a malformed reference or missing backup.
pub fn rollback(
    layout: &RuntimeLayout,
    options: &InstallOptions,
) -> Result<PathBuf, InstallError> {
    let reference = options
        .rollback_ref
        .clone()
        .ok_or_else(|| InstallError::BadRollbackRef(String::new()))?;
    let backup = reference
        .strip_prefix("restore_from:")
        .ok_or_else(|| InstallError::BadRollbackRef(reference.clone()))?;
    let backup = PathBuf::from(backup);
    if !backup.exists() {
        return Err(InstallError::BackupNotFound(backup));
    }

    let destination = target_pack_dir(layout, options);
    if destination.exists() {
        fs::remove_dir_all(&destination).map_err(|source| InstallError::Copy {
            path: destination.clone(),
            source,
        })?;
    }
    copy_tree(&backup, &destination)?;
    Ok(destination)
}

// ============================================================================
// SECTION: Resolution and Classification
// ============================================================================

/// Resolved source/destination trees with their signatures.
struct ResolvedPaths {
    /// Source pack directory.
    source: PathBuf,
    /// Destination pack directory.
    destination: PathBuf,
    /// Source tree signature.
    source_signature: String,
    /// Destination tree signature, absent when no tree exists.
    destination_signature: Option<String>,
    /// Paths the operation preserves.
    preserved: Vec<String>,
}

/// Resolves install paths and signatures.
fn resolve_paths(
    layout: &RuntimeLayout,
    options: &InstallOptions,
) -> Result<ResolvedPaths, InstallError> {
    let source = match &options.source_pack {
        Some(path) => {
            if !path.exists() {
                return Err(InstallError::SourceNotFound(path.clone()));
            }
            path.clone()
        }
        None => {
            let pack_root =
                options.pack_root.clone().unwrap_or_else(|| layout.packs_root());
            let default = pack_root.join(options.identity_id.as_str());
            if !default.exists() {
                return Err(InstallError::SourceNotFound(default));
            }
            default
        }
    };
    let destination = target_pack_dir(layout, options);

    let source_signature = hashing::directory_signature(&source)?
        .map(|digest| digest.as_str().to_string())
        .unwrap_or_default();
    let destination_signature = hashing::directory_signature(&destination)?
        .map(|digest| digest.as_str().to_string());

    let preserved = if destination.exists() {
        vec![destination.display().to_string()]
    } else {
        Vec::new()
    };

    Ok(ResolvedPaths {
        source,
        destination,
        source_signature,
        destination_signature,
        preserved,
    })
}

/// Returns the destination pack directory for an invocation.
fn target_pack_dir(layout: &RuntimeLayout, options: &InstallOptions) -> PathBuf {
    options
        .target_root
        .clone()
        .unwrap_or_else(|| layout.packs_root())
        .join(options.identity_id.as_str())
}

/// Classifies the resolved trees.
fn classify(paths: &ResolvedPaths, options: &InstallOptions) -> (ConflictType, InstallAction) {
    classify_conflict(
        &paths.source_signature,
        paths.destination_signature.as_deref(),
        options.destructive_replace,
    )
}

// ============================================================================
// SECTION: Tree Operations
// ============================================================================

/// Copies a tree into a fresh destination.
fn copy_tree(source: &Path, destination: &Path) -> Result<Vec<String>, InstallError> {
    sync_tree(source, destination)
}

/// Copies every file from source on top of destination, creating directories.
fn sync_tree(source: &Path, destination: &Path) -> Result<Vec<String>, InstallError> {
    let mut copied = Vec::new();
    fs::create_dir_all(destination).map_err(|err| InstallError::Copy {
        path: destination.to_path_buf(),
        source: err,
    })?;
    for entry in walk_sorted(source) {
        let rel = entry.strip_prefix(source).unwrap_or(&entry);
        let target = destination.join(rel);
        if entry.is_dir() {
            fs::create_dir_all(&target).map_err(|err| InstallError::Copy {
                path: target.clone(),
                source: err,
            })?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|err| InstallError::Copy {
                path: parent.to_path_buf(),
                source: err,
            })?;
        }
        fs::copy(&entry, &target).map_err(|err| InstallError::Copy {
            path: target.clone(),
            source: err,
        })?;
        copied.push(target.display().to_string());
    }
    Ok(copied)
}

/// Walks a tree in sorted order, skipping unreadable entries.
fn walk_sorted(root: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .map(|entry| entry.path().to_path_buf())
        .collect();
    paths.sort();
    paths
}

// ============================================================================
// SECTION: Reports
// ============================================================================

/// Optional report fields varying per operation.
#[derive(Debug, Default)]
struct ReportExtras {
    /// `true` for plan and dry-run operations.
    dry_run: bool,
    /// Files the operation copied.
    changed_files: Vec<String>,
    /// Backup directory path.
    backup_ref: String,
    /// Rollback reference.
    rollback_ref: String,
}

impl ReportExtras {
    /// Extras for a plan report.
    fn plan() -> Self {
        Self {
            dry_run: true,
            ..Self::default()
        }
    }
}

/// Builds an install report document.
fn build_report(
    options: &InstallOptions,
    operation: InstallOperation,
    conflict_type: ConflictType,
    action: InstallAction,
    paths: &ResolvedPaths,
    extras: ReportExtras,
) -> InstallReport {
    let millis = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| elapsed.subsec_millis())
        .unwrap_or(0);
    let report_id = ReportId::new(format!(
        "identity-install-{}-{operation}-{}-{millis:03}",
        options.identity_id,
        options.now.unix_seconds()
    ));
    InstallReport {
        report_id,
        identity_id: options.identity_id.clone(),
        generated_at: options.now,
        operation,
        conflict_type,
        action,
        source_pack: paths.source.display().to_string(),
        target_pack: paths.destination.display().to_string(),
        source_signature: paths.source_signature.clone(),
        target_signature_before: paths.destination_signature.clone().unwrap_or_default(),
        preserved_paths: paths.preserved.clone(),
        dry_run: extras.dry_run,
        changed_files: extras.changed_files,
        installer_invocation: InstallerInvocation {
            tool: "identity-installer".to_string(),
            entrypoint: "identity install".to_string(),
            command: format!(
                "identity install {operation} --identity-id {}",
                options.identity_id
            ),
        },
        backup_ref: extras.backup_ref,
        rollback_ref: extras.rollback_ref,
        verified_report_id: String::new(),
    }
}

/// Writes a report under the install reports directory.
fn write_report(layout: &RuntimeLayout, report: &InstallReport) -> Result<PathBuf, InstallError> {
    let report_path =
        layout.install_reports_dir().join(format!("{}.json", report.report_id));
    document::write_json_pretty(&report_path, report)?;
    Ok(report_path)
}

// ============================================================================
// SECTION: Registration
// ============================================================================

/// Inserts or updates the catalog entry, preserving the existing default.
fn register_identity(
    layout: &RuntimeLayout,
    options: &InstallOptions,
    paths: &ResolvedPaths,
) -> Result<(), InstallError> {
    let catalog_path = options.catalog.clone().unwrap_or_else(|| layout.catalog_path());
    let mut catalog = Catalog::load(&catalog_path)?;
    let pack_path = paths
        .destination
        .strip_prefix(layout.root())
        .unwrap_or(&paths.destination)
        .components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/");

    catalog.register(
        CatalogEntry {
            id: options.identity_id.clone(),
            title: if options.title.is_empty() {
                options.identity_id.as_str().to_string()
            } else {
                options.title.clone()
            },
            description: options.description.clone(),
            status: String::new(),
            methodology_version: "v1.2.3".to_string(),
            pack_path,
            tags: Some(vec!["identity".to_string()]),
            policy: None,
            dependencies: None,
            interface: None,
            governance: None,
            extra: serde_json::Map::new(),
        },
        options.activate,
    );
    catalog.save(&catalog_path)?;
    Ok(())
}
