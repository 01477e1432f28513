// crates/identity-runtime-validate/src/context.rs
// ============================================================================
// Module: Validator Context
// Description: Explicit inputs shared by every validator invocation.
// Purpose: Keep validators pure over (task record, evidence, clock).
// Dependencies: identity-runtime-contract, identity-runtime-core
// ============================================================================

//! ## Overview
//! Validators receive everything they may observe through this context: the
//! runtime layout, the catalog, the target identity, the clock, and optional
//! git-range and self-test inputs. Nothing reads the environment directly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;

use identity_runtime_contract::TaskRecord;
use identity_runtime_contract::ValidationContext;
use identity_runtime_core::Catalog;
use identity_runtime_core::FindingKind;
use identity_runtime_core::FindingLog;
use identity_runtime_core::IdentityId;
use identity_runtime_core::RuntimeLayout;
use identity_runtime_core::Timestamp;

// ============================================================================
// SECTION: Context
// ============================================================================

/// Explicit inputs to one validator invocation.
#[derive(Debug, Clone)]
pub struct ValidatorContext {
    /// Runtime tree layout.
    pub layout: RuntimeLayout,
    /// Catalog document path (defaults to the layout's canonical location).
    pub catalog_path: PathBuf,
    /// Target identity.
    pub identity_id: IdentityId,
    /// Validation clock.
    pub now: Timestamp,
    /// Run validator self-test corpora when supported.
    pub self_test: bool,
    /// Git range base for the changelog validator.
    pub git_base: Option<String>,
    /// Git range head for the changelog validator.
    pub git_head: Option<String>,
    /// Metrics document override for the arbitration validator.
    pub metrics_path: Option<PathBuf>,
}

impl ValidatorContext {
    /// Creates a context with canonical paths and no optional inputs.
    #[must_use]
    pub fn new(layout: RuntimeLayout, identity_id: IdentityId, now: Timestamp) -> Self {
        let catalog_path = layout.catalog_path();
        Self {
            layout,
            catalog_path,
            identity_id,
            now,
            self_test: false,
            git_base: None,
            git_head: None,
            metrics_path: None,
        }
    }

    /// Builds the contract validation context for this invocation.
    #[must_use]
    pub fn contract_ctx(&self) -> ValidationContext {
        ValidationContext::new(self.layout.root(), self.identity_id.clone(), self.now)
    }

    /// Loads the catalog, recording a finding on failure.
    #[must_use]
    pub fn load_catalog(&self, log: &mut FindingLog) -> Option<Catalog> {
        match Catalog::load(&self.catalog_path) {
            Ok(catalog) => Some(catalog),
            Err(err) => {
                log.fail(FindingKind::Io, "catalog", format!("{err}"));
                None
            }
        }
    }

    /// Resolves and loads the target task record, recording findings on
    /// failure.
    #[must_use]
    pub fn load_task(&self, log: &mut FindingLog) -> Option<TaskRecord> {
        let catalog = self.load_catalog(log)?;
        let task_path = match catalog.resolve_task(self.layout.root(), &self.identity_id) {
            Ok(path) => path,
            Err(err) => {
                log.fail(FindingKind::Reference, "catalog", format!("{err}"));
                return None;
            }
        };
        log.info(format!("CURRENT_TASK: {}", task_path.display()));
        match TaskRecord::load(&task_path) {
            Ok(task) => Some(task),
            Err(err) => {
                log.fail(
                    FindingKind::Schema,
                    "CURRENT_TASK.json",
                    format!("invalid CURRENT_TASK json: {err}"),
                );
                None
            }
        }
    }
}
