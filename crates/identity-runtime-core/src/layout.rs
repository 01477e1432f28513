// crates/identity-runtime-core/src/layout.rs
// ============================================================================
// Module: Identity Runtime Filesystem Layout
// Description: Canonical paths under the identity runtime tree.
// Purpose: Keep every component pointed at the same directories.
// Dependencies: crate::identifiers
// ============================================================================

//! ## Overview
//! All runtime state lives under `identity/` relative to a caller-supplied
//! root. This type is the one source for those paths; components never spell
//! directory names themselves.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;

use crate::identifiers::IdentityId;

// ============================================================================
// SECTION: Layout
// ============================================================================

/// Canonical identity runtime tree rooted at a working directory.
#[derive(Debug, Clone)]
pub struct RuntimeLayout {
    /// Runtime root (usually the repository root).
    root: PathBuf,
}

impl RuntimeLayout {
    /// Creates a layout rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
        }
    }

    /// Returns the runtime root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `identity/catalog/identities.yaml`
    #[must_use]
    pub fn catalog_path(&self) -> PathBuf {
        self.root.join("identity/catalog/identities.yaml")
    }

    /// `identity/catalog/schema/identities.schema.json`
    #[must_use]
    pub fn catalog_schema_path(&self) -> PathBuf {
        self.root.join("identity/catalog/schema/identities.schema.json")
    }

    /// `identity/packs/`
    #[must_use]
    pub fn packs_root(&self) -> PathBuf {
        self.root.join("identity/packs")
    }

    /// `identity/packs/<id>/`
    #[must_use]
    pub fn pack_dir(&self, id: &IdentityId) -> PathBuf {
        self.packs_root().join(id.as_str())
    }

    /// `identity/runtime/IDENTITY_COMPILED.md`
    #[must_use]
    pub fn compiled_brief_path(&self) -> PathBuf {
        self.root.join("identity/runtime/IDENTITY_COMPILED.md")
    }

    /// `identity/runtime/examples/`
    #[must_use]
    pub fn examples_dir(&self) -> PathBuf {
        self.root.join("identity/runtime/examples")
    }

    /// `identity/runtime/examples/install/`
    #[must_use]
    pub fn install_examples_dir(&self) -> PathBuf {
        self.examples_dir().join("install")
    }

    /// `identity/runtime/logs/upgrade/<id>/`
    #[must_use]
    pub fn upgrade_logs_dir(&self, id: &IdentityId) -> PathBuf {
        self.root.join("identity/runtime/logs/upgrade").join(id.as_str())
    }

    /// `identity/runtime/logs/arbitration/`
    #[must_use]
    pub fn arbitration_logs_dir(&self) -> PathBuf {
        self.root.join("identity/runtime/logs/arbitration")
    }

    /// `identity/runtime/logs/handoff/`
    #[must_use]
    pub fn handoff_logs_dir(&self) -> PathBuf {
        self.root.join("identity/runtime/logs/handoff")
    }

    /// `identity/runtime/logs/feedback/`
    #[must_use]
    pub fn feedback_logs_dir(&self) -> PathBuf {
        self.root.join("identity/runtime/logs/feedback")
    }

    /// `identity/runtime/metrics/<id>-route-quality.json`
    #[must_use]
    pub fn metrics_path(&self, id: &IdentityId) -> PathBuf {
        self.root.join("identity/runtime/metrics").join(format!("{id}-route-quality.json"))
    }

    /// `identity/runtime/reports/`
    #[must_use]
    pub fn reports_dir(&self) -> PathBuf {
        self.root.join("identity/runtime/reports")
    }

    /// `identity/runtime/reports/install/`
    #[must_use]
    pub fn install_reports_dir(&self) -> PathBuf {
        self.reports_dir().join("install")
    }

    /// `identity/runtime/backups/install/`
    #[must_use]
    pub fn install_backups_dir(&self) -> PathBuf {
        self.root.join("identity/runtime/backups/install")
    }
}
