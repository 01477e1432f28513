// crates/identity-runtime-core/src/catalog.rs
// ============================================================================
// Module: Identity Runtime Catalog
// Description: Catalog document model and identity pack resolution.
// Purpose: Resolve identity ids to packs and select validation targets.
// Dependencies: crate::{document, identifiers}, serde, thiserror
// ============================================================================

//! ## Overview
//! The catalog is the single YAML document listing every identity. Resolution
//! follows the entry's `pack_path` when it exists on disk and falls back to
//! the legacy `identity/<id>/` location. The catalog is always passed as an
//! explicit input; no module-level default exists.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

use crate::document;
use crate::document::DocumentError;
use crate::identifiers::IdentityId;
use crate::pack;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised by catalog loading and resolution.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Catalog document failed to load or save.
    #[error(transparent)]
    Document(#[from] DocumentError),
    /// The requested identity id is not present in the catalog.
    #[error("identity id not found in catalog: {id}")]
    UnknownIdentity {
        /// Missing identity id.
        id: IdentityId,
    },
    /// No pack directory resolved for the identity.
    #[error("identity pack not found: {id}")]
    PackNotFound {
        /// Identity whose pack is missing.
        id: IdentityId,
    },
    /// The resolved pack has no task record.
    #[error("CURRENT_TASK.json not found for identity: {id}")]
    TaskNotFound {
        /// Identity whose task record is missing.
        id: IdentityId,
    },
    /// No identities matched the target selector.
    #[error("no target identities selected")]
    NoTargets,
}

// ============================================================================
// SECTION: Catalog Model
// ============================================================================

/// Catalog entry for one identity.
///
/// Loading is lenient: missing fields default to empty values so that the
/// manifest validator, not the parser, reports incomplete entries. Unknown
/// keys round-trip through `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Identity identifier (catalog slug).
    pub id: IdentityId,
    /// Display title.
    #[serde(default)]
    pub title: String,
    /// Short description.
    #[serde(default)]
    pub description: String,
    /// Lifecycle status (`active` or `inactive`).
    #[serde(default)]
    pub status: String,
    /// Methodology version tag.
    #[serde(default)]
    pub methodology_version: String,
    /// Pack directory path relative to the runtime root.
    #[serde(default)]
    pub pack_path: String,
    /// Optional classification tags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Optional activation policy block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<Value>,
    /// Optional dependency declarations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Value>,
    /// Optional interface block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface: Option<Value>,
    /// Optional governance block (hard guardrails for the compiled brief).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub governance: Option<Value>,
    /// Unknown keys preserved across rewrites.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CatalogEntry {
    /// Returns `true` when the entry status is `active` (case-insensitive).
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status.trim().eq_ignore_ascii_case("active")
    }

    /// Returns the `governance.hard_guardrails` strings, if declared.
    #[must_use]
    pub fn hard_guardrails(&self) -> Vec<String> {
        self.governance
            .as_ref()
            .and_then(|governance| governance.get("hard_guardrails"))
            .and_then(Value::as_array)
            .map(|rails| {
                rails.iter().filter_map(Value::as_str).map(ToString::to_string).collect()
            })
            .unwrap_or_default()
    }

    /// Returns `policy.activation_priority`, if declared.
    #[must_use]
    pub fn activation_priority(&self) -> Option<i64> {
        self.policy
            .as_ref()
            .and_then(|policy| policy.get("activation_priority"))
            .and_then(Value::as_i64)
    }
}

/// Target selection modes for catalog iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSelector {
    /// Exactly one identity by id.
    One(IdentityId),
    /// Every identity in the catalog.
    All,
    /// Active identities, falling back to the default identity.
    ActiveOrDefault,
}

/// The identity catalog document.
///
/// # Invariants
/// - `default_identity` resolves to exactly one entry; enforced by the
///   manifest validator.
/// - Entry order is preserved across load/save cycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Catalog schema version tag.
    #[serde(default)]
    pub version: Value,
    /// Default identity id.
    #[serde(default)]
    pub default_identity: IdentityId,
    /// Identity entries in declaration order.
    #[serde(default)]
    pub identities: Vec<CatalogEntry>,
}

impl Catalog {
    /// Loads the catalog from a YAML document.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Document`] on read or parse failure.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        Ok(document::load_yaml(path)?)
    }

    /// Saves the catalog preserving entry order.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Document`] on write failure.
    pub fn save(&self, path: &Path) -> Result<(), CatalogError> {
        Ok(document::write_yaml(path, self)?)
    }

    /// Looks up an entry by identity id.
    #[must_use]
    pub fn entry(&self, id: &IdentityId) -> Option<&CatalogEntry> {
        self.identities.iter().find(|entry| entry.id == *id)
    }

    /// Looks up a mutable entry by identity id.
    pub fn entry_mut(&mut self, id: &IdentityId) -> Option<&mut CatalogEntry> {
        self.identities.iter_mut().find(|entry| entry.id == *id)
    }

    /// Resolves the pack directory for an identity.
    ///
    /// The entry's `pack_path` wins when it exists under `root`; otherwise
    /// the legacy `identity/<id>/` location is consulted.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownIdentity`] or
    /// [`CatalogError::PackNotFound`].
    pub fn resolve_pack(&self, root: &Path, id: &IdentityId) -> Result<PathBuf, CatalogError> {
        let entry = self.entry(id).ok_or_else(|| CatalogError::UnknownIdentity {
            id: id.clone(),
        })?;

        let declared = entry.pack_path.trim();
        if !declared.is_empty() {
            let candidate = root.join(declared);
            if candidate.exists() {
                return Ok(candidate);
            }
        }

        let legacy = root.join("identity").join(id.as_str());
        if legacy.exists() {
            return Ok(legacy);
        }

        Err(CatalogError::PackNotFound {
            id: id.clone(),
        })
    }

    /// Resolves the task record path for an identity.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when the pack or its task record is missing.
    pub fn resolve_task(&self, root: &Path, id: &IdentityId) -> Result<PathBuf, CatalogError> {
        let task = self.resolve_pack(root, id)?.join(pack::CURRENT_TASK_FILE);
        if task.exists() {
            return Ok(task);
        }
        Err(CatalogError::TaskNotFound {
            id: id.clone(),
        })
    }

    /// Selects target entries for validation.
    ///
    /// `ActiveOrDefault` picks every active entry, or the default entry when
    /// none is active.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NoTargets`] when the selection is empty.
    pub fn select_targets(
        &self,
        selector: &TargetSelector,
    ) -> Result<Vec<&CatalogEntry>, CatalogError> {
        let selected: Vec<&CatalogEntry> = match selector {
            TargetSelector::One(id) => self.entry(id).into_iter().collect(),
            TargetSelector::All => self.identities.iter().collect(),
            TargetSelector::ActiveOrDefault => {
                let active: Vec<&CatalogEntry> =
                    self.identities.iter().filter(|entry| entry.is_active()).collect();
                if active.is_empty() {
                    self.entry(&self.default_identity).into_iter().collect()
                } else {
                    active
                }
            }
        };

        if selected.is_empty() {
            return Err(CatalogError::NoTargets);
        }
        Ok(selected)
    }

    /// Flips an entry's status to `active`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownIdentity`] when the id is absent.
    pub fn activate(&mut self, id: &IdentityId) -> Result<(), CatalogError> {
        let entry = self.entry_mut(id).ok_or_else(|| CatalogError::UnknownIdentity {
            id: id.clone(),
        })?;
        entry.status = "active".to_string();
        Ok(())
    }

    /// Inserts or updates an entry, preserving the existing default.
    ///
    /// Existing entries keep their position and status unless `activate` is
    /// set; new entries are appended. `default_identity` is never modified
    /// here.
    pub fn register(&mut self, incoming: CatalogEntry, activate: bool) {
        if let Some(existing) = self.entry_mut(&incoming.id) {
            existing.pack_path = incoming.pack_path;
            if !incoming.title.is_empty() {
                existing.title = incoming.title;
            }
            if !incoming.description.is_empty() {
                existing.description = incoming.description;
            }
            if activate {
                existing.status = "active".to_string();
            }
            return;
        }

        let mut entry = incoming;
        entry.status = if activate { "active" } else { "inactive" }.to_string();
        self.identities.push(entry);
    }
}
