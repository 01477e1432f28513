// crates/identity-runtime-validate/src/validators/manifest.rs
// ============================================================================
// Module: Catalog Manifest Validator
// Description: Validates the catalog against its schema and semantics.
// Purpose: Keep ids unique, the default resolvable, and pack paths live.
// Dependencies: identity-runtime-core, jsonschema, serde_json
// ============================================================================

//! ## Overview
//! Two passes over the catalog: a JSON Schema pass against
//! `identities.schema.json`, then the semantic checks the schema cannot
//! express (unique ids, default membership, pack paths on disk, activation
//! priority bounds).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use identity_runtime_core::FindingKind;
use identity_runtime_core::FindingLog;
use identity_runtime_core::document;
use serde_json::Value;

use crate::context::ValidatorContext;
use crate::verdict::Verdict;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// Runs the manifest validator.
#[must_use]
pub fn run(ctx: &ValidatorContext) -> Verdict {
    let mut log = FindingLog::new();
    check(ctx, &mut log);
    if log.is_ok() {
        log.ok("identity manifest semantic validation passed");
    }
    Verdict::from_log("manifest", log)
}

/// Runs both validation passes, accumulating findings.
fn check(ctx: &ValidatorContext, log: &mut FindingLog) {
    let schema_path = ctx.layout.catalog_schema_path();
    if !schema_path.exists() {
        log.fail(
            FindingKind::Reference,
            "catalog.schema",
            format!("missing schema file: {}", schema_path.display()),
        );
        return;
    }
    if !ctx.catalog_path.exists() {
        log.fail(
            FindingKind::Reference,
            "catalog",
            format!("missing catalog file: {}", ctx.catalog_path.display()),
        );
        return;
    }

    let catalog: Value = match document::load_yaml(&ctx.catalog_path) {
        Ok(value) => value,
        Err(err) => {
            log.fail(FindingKind::Schema, "catalog", format!("invalid catalog yaml: {err}"));
            return;
        }
    };

    schema_pass(&schema_path, &catalog, log);
    semantic_pass(ctx, &catalog, log);
}

// ============================================================================
// SECTION: Schema Pass
// ============================================================================

/// Validates the catalog document against the bundled JSON Schema.
fn schema_pass(schema_path: &std::path::Path, catalog: &Value, log: &mut FindingLog) {
    let schema: Value = match document::load_json(schema_path) {
        Ok(value) => value,
        Err(err) => {
            log.fail(FindingKind::Schema, "catalog.schema", format!("invalid schema json: {err}"));
            return;
        }
    };
    let validator = match jsonschema::validator_for(&schema) {
        Ok(validator) => validator,
        Err(err) => {
            log.fail(
                FindingKind::Schema,
                "catalog.schema",
                format!("schema failed to compile: {err}"),
            );
            return;
        }
    };

    let mut clean = true;
    for error in validator.iter_errors(catalog) {
        clean = false;
        log.fail(
            FindingKind::Schema,
            format!("catalog{}", error.instance_path),
            format!("catalog schema violation at {}: {}", error.instance_path, error),
        );
    }
    if clean {
        log.ok("catalog conforms to identities.schema.json");
    }
}

// ============================================================================
// SECTION: Semantic Pass
// ============================================================================

/// Runs the semantic checks the schema cannot express.
fn semantic_pass(ctx: &ValidatorContext, catalog: &Value, log: &mut FindingLog) {
    for key in ["version", "default_identity", "identities"] {
        if catalog.get(key).is_none() {
            log.fail(
                FindingKind::Schema,
                format!("catalog.{key}"),
                format!("catalog missing required key: {key}"),
            );
        }
    }

    let default_id =
        catalog.get("default_identity").and_then(Value::as_str).unwrap_or_default().trim();
    let Some(identities) = catalog.get("identities").and_then(Value::as_array) else {
        log.fail(FindingKind::Schema, "catalog.identities", "identities must be a non-empty list");
        return;
    };
    if identities.is_empty() {
        log.fail(FindingKind::Schema, "catalog.identities", "identities must be a non-empty list");
        return;
    }

    let mut seen: BTreeSet<String> = BTreeSet::new();
    let mut has_default = false;
    for (index, item) in identities.iter().enumerate() {
        let prefix = format!("identities[{index}]");
        let Some(entry) = item.as_object() else {
            log.fail(FindingKind::Schema, &prefix, format!("{prefix} must be an object"));
            continue;
        };

        for key in ["id", "title", "description", "status", "methodology_version", "pack_path"] {
            if !entry.contains_key(key) {
                log.fail(
                    FindingKind::Schema,
                    format!("{prefix}.{key}"),
                    format!("{prefix} missing required key: {key}"),
                );
            }
        }

        let id = entry.get("id").and_then(Value::as_str).unwrap_or_default().trim().to_string();
        if !id.is_empty() {
            if !seen.insert(id.clone()) {
                log.fail(
                    FindingKind::Schema,
                    format!("{prefix}.id"),
                    format!("duplicate identity id: {id}"),
                );
            }
            if id == default_id {
                has_default = true;
            }
        }

        let pack_path =
            entry.get("pack_path").and_then(Value::as_str).unwrap_or_default().trim().to_string();
        if !pack_path.is_empty() && !ctx.layout.root().join(&pack_path).exists() {
            log.fail(
                FindingKind::Reference,
                format!("{prefix}.pack_path"),
                format!("{prefix} pack_path not found: {pack_path}"),
            );
        }

        if let Some(policy) = entry.get("policy") {
            match policy.as_object() {
                Some(policy) => {
                    if let Some(priority) = policy.get("activation_priority") {
                        let in_range = priority
                            .as_i64()
                            .map(|value| (0..=100).contains(&value))
                            .unwrap_or(false);
                        if !in_range {
                            log.fail(
                                FindingKind::Schema,
                                format!("{prefix}.policy.activation_priority"),
                                format!("{prefix}.policy.activation_priority must be int[0..100]"),
                            );
                        }
                    }
                }
                None => log.fail(
                    FindingKind::Schema,
                    format!("{prefix}.policy"),
                    format!("{prefix}.policy must be object"),
                ),
            }
        }

        if let Some(deps) = entry.get("dependencies") {
            match deps.as_object() {
                Some(deps) => {
                    if let Some(tools) = deps.get("tools")
                        && !tools.is_array()
                    {
                        log.fail(
                            FindingKind::Schema,
                            format!("{prefix}.dependencies.tools"),
                            format!("{prefix}.dependencies.tools must be list"),
                        );
                    }
                }
                None => log.fail(
                    FindingKind::Schema,
                    format!("{prefix}.dependencies"),
                    format!("{prefix}.dependencies must be object"),
                ),
            }
        }
    }

    if !has_default {
        log.fail(
            FindingKind::Policy,
            "catalog.default_identity",
            format!("default_identity {default_id} is not present in identities"),
        );
    }
}
