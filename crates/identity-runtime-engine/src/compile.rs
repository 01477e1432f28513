// crates/identity-runtime-engine/src/compile.rs
// ============================================================================
// Module: Runtime Brief Compiler
// Description: Renders the compiled identity runtime brief.
// Purpose: Summarize the active identity deterministically.
// Dependencies: identity-runtime-{contract,core}
// ============================================================================

//! ## Overview
//! The brief is rendered from the catalog's default entry and its task
//! record: hard guardrails, the current objective, and the current state.
//! Rendering is byte-deterministic; `--check` re-renders and compares with
//! the file on disk so a second compile is always a no-op.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;

use identity_runtime_contract::TaskRecord;
use identity_runtime_contract::task::str_of;
use identity_runtime_core::Catalog;
use identity_runtime_core::CatalogError;
use identity_runtime_core::DocumentError;
use identity_runtime_core::RuntimeLayout;
use identity_runtime_core::document;
use thiserror::Error;

// ============================================================================
// SECTION: Errors and Outcome
// ============================================================================

/// Errors raised while compiling the brief.
#[derive(Debug, Error)]
pub enum CompileError {
    /// Catalog resolution failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    /// Document read or write failed.
    #[error(transparent)]
    Document(#[from] DocumentError),
    /// The catalog has no resolvable default identity.
    #[error("default_identity not found in identities: {0}")]
    DefaultMissing(String),
}

/// Compile outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileOutcome {
    /// Brief written (or already identical) at the given path.
    Written(PathBuf),
    /// `--check` found the on-disk brief out of date.
    Stale(PathBuf),
}

// ============================================================================
// SECTION: Compiler
// ============================================================================

/// Compiles the runtime brief, or checks it when `check_only` is set.
///
/// # Errors
///
/// Returns [`CompileError`] when inputs cannot be resolved or the write
/// fails.
pub fn compile_brief(
    layout: &RuntimeLayout,
    check_only: bool,
) -> Result<CompileOutcome, CompileError> {
    let catalog_path = layout.catalog_path();
    let catalog = Catalog::load(&catalog_path)?;
    let default_id = catalog.default_identity.clone();
    let entry = catalog
        .entry(&default_id)
        .ok_or_else(|| CompileError::DefaultMissing(default_id.as_str().to_string()))?;

    let task_path = catalog.resolve_task(layout.root(), &default_id)?;
    let task = TaskRecord::load(&task_path)?;

    let objective = task
        .contract("objective")
        .and_then(|objective| str_of(objective, "title"))
        .unwrap_or_default();
    let state = task
        .object("state_machine")
        .and_then(|machine| str_of(machine, "current_state"))
        .unwrap_or("unknown");

    let mut lines = vec![
        "# Identity Runtime Brief".to_string(),
        String::new(),
        format!("Active identity: {}", entry.id),
        String::new(),
        "This file is generated/maintained by identity runtime tooling.".to_string(),
        String::new(),
        "Hard guardrails:".to_string(),
    ];
    let guardrails = entry.hard_guardrails();
    if guardrails.is_empty() {
        lines.push("- (none)".to_string());
    } else {
        lines.extend(guardrails.iter().map(|rail| format!("- {rail}")));
    }
    lines.extend([
        String::new(),
        "Current objective:".to_string(),
        format!("- {}", if objective.is_empty() { "(not set)" } else { objective }),
        String::new(),
        "Current state:".to_string(),
        format!("- {state}"),
        String::new(),
        "See source:".to_string(),
        format!("- {}", relative_display(layout, &catalog_path)),
        format!("- {}", relative_display(layout, &task_path)),
    ]);
    let rendered = format!("{}\n", lines.join("\n").trim());

    let output = layout.compiled_brief_path();
    let existing = document::read_text(&output).ok();
    if check_only {
        return Ok(if existing.as_deref() == Some(rendered.as_str()) {
            CompileOutcome::Written(output)
        } else {
            CompileOutcome::Stale(output)
        });
    }

    if existing.as_deref() != Some(rendered.as_str()) {
        document::write_text(&output, &rendered)?;
    }
    Ok(CompileOutcome::Written(output))
}

/// Renders a path relative to the runtime root with forward slashes.
fn relative_display(layout: &RuntimeLayout, path: &std::path::Path) -> String {
    let rel = path.strip_prefix(layout.root()).unwrap_or(path);
    rel.components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
