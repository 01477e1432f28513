// crates/identity-runtime-core/src/pack.rs
// ============================================================================
// Module: Identity Runtime Pack Model
// Description: Pack file layout constants and rulebook row schema.
// Purpose: Name the documents every identity pack must carry.
// Dependencies: crate::{identifiers, time}, serde
// ============================================================================

//! ## Overview
//! An identity pack is a directory holding the role prompt, the central task
//! record, the append-only history ledger, the append-only rulebook, and the
//! pack metadata. This module names those files and types the rulebook row.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::identifiers::RuleId;
use crate::time::Timestamp;

// ============================================================================
// SECTION: Pack Files
// ============================================================================

/// Central task record document.
pub const CURRENT_TASK_FILE: &str = "CURRENT_TASK.json";
/// Role prompt document (opaque to the engine).
pub const IDENTITY_PROMPT_FILE: &str = "IDENTITY_PROMPT.md";
/// Append-only history ledger.
pub const TASK_HISTORY_FILE: &str = "TASK_HISTORY.md";
/// Append-only learning rulebook.
pub const RULEBOOK_FILE: &str = "RULEBOOK.jsonl";
/// Pack metadata document.
pub const META_FILE: &str = "META.yaml";
/// Optional agent descriptor document.
pub const AGENT_DESCRIPTOR_FILE: &str = "agents/identity.yaml";

/// Pack files whose presence is checked by `status` and resolver invariants.
pub const REQUIRED_PACK_FILES: [&str; 4] =
    [IDENTITY_PROMPT_FILE, CURRENT_TASK_FILE, TASK_HISTORY_FILE, META_FILE];

/// Identity-core files whose change demands self-upgrade evidence in CI.
pub const CORE_PACK_FILES: [&str; 3] = [CURRENT_TASK_FILE, IDENTITY_PROMPT_FILE, RULEBOOK_FILE];

/// Reports which required pack files exist under a pack directory.
#[must_use]
pub fn required_files_present(pack_dir: &Path) -> Vec<(&'static str, bool)> {
    REQUIRED_PACK_FILES.iter().map(|name| (*name, pack_dir.join(name).exists())).collect()
}

// ============================================================================
// SECTION: Pack Metadata
// ============================================================================

/// Pack metadata document (`META.yaml`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackMeta {
    /// Identity identifier.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Short description.
    pub description: String,
    /// Lifecycle status.
    pub status: String,
    /// Methodology version tag.
    pub methodology_version: String,
}

// ============================================================================
// SECTION: Rulebook Rows
// ============================================================================

/// Learned rule classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    /// Behavior to repeat.
    Positive,
    /// Behavior to avoid.
    Negative,
}

/// One rulebook row.
///
/// # Invariants
/// - Rows are appended, never rewritten; `evidence_run_id` links the row to
///   the run that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulebookRecord {
    /// Rule identifier.
    pub rule_id: RuleId,
    /// Rule classification.
    #[serde(rename = "type")]
    pub rule_type: RuleType,
    /// Condition that fired the rule.
    pub trigger: String,
    /// Action the rule prescribes.
    pub action: String,
    /// Run id of the evidence backing this rule.
    pub evidence_run_id: String,
    /// Scope label for the rule.
    pub scope: String,
    /// Confidence value (number or label, producer-dependent).
    pub confidence: Value,
    /// Last update stamp.
    pub updated_at: Timestamp,
}
