// crates/identity-runtime-core/tests/catalog.rs
// ============================================================================
// Module: Catalog Tests
// Description: Tests for catalog resolution and target selection.
// ============================================================================
//! ## Overview
//! Validates pack resolution fallbacks, target selection defaults, and
//! registration semantics.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::fs;
use std::path::Path;

use identity_runtime_core::Catalog;
use identity_runtime_core::CatalogEntry;
use identity_runtime_core::CatalogError;
use identity_runtime_core::IdentityId;
use identity_runtime_core::TargetSelector;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Writes a two-identity catalog and pack directories under `root`.
fn seed_catalog(root: &Path) -> Catalog {
    let yaml = r#"
version: v1
default_identity: demo
identities:
  - id: demo
    title: Demo
    description: Demo identity
    status: active
    methodology_version: v1.2.3
    pack_path: identity/packs/demo
  - id: drafted
    title: Drafted
    description: Inactive identity
    status: inactive
    methodology_version: v1.2.3
    pack_path: identity/packs/drafted
"#;
    let catalog_path = root.join("identity/catalog/identities.yaml");
    fs::create_dir_all(catalog_path.parent().unwrap()).unwrap();
    fs::write(&catalog_path, yaml).unwrap();
    fs::create_dir_all(root.join("identity/packs/demo")).unwrap();
    fs::write(root.join("identity/packs/demo/CURRENT_TASK.json"), "{}\n").unwrap();
    Catalog::load(&catalog_path).unwrap()
}

// ============================================================================
// SECTION: Resolution
// ============================================================================

/// Tests pack resolution uses the declared pack path.
#[test]
fn test_resolve_pack_uses_declared_path() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = seed_catalog(dir.path());

    let pack = catalog.resolve_pack(dir.path(), &IdentityId::from("demo")).unwrap();
    assert_eq!(pack, dir.path().join("identity/packs/demo"));
}

/// Tests resolution falls back to the legacy pack location.
#[test]
fn test_resolve_pack_legacy_fallback() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = seed_catalog(dir.path());
    fs::create_dir_all(dir.path().join("identity/drafted")).unwrap();

    let pack = catalog.resolve_pack(dir.path(), &IdentityId::from("drafted")).unwrap();
    assert_eq!(pack, dir.path().join("identity/drafted"));
}

/// Tests unknown ids and missing packs surface distinct errors.
#[test]
fn test_resolve_pack_errors() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = seed_catalog(dir.path());

    let unknown = catalog.resolve_pack(dir.path(), &IdentityId::from("ghost"));
    assert!(matches!(unknown, Err(CatalogError::UnknownIdentity { .. })));

    let missing = catalog.resolve_pack(dir.path(), &IdentityId::from("drafted"));
    assert!(matches!(missing, Err(CatalogError::PackNotFound { .. })));
}

/// Tests task resolution requires the task record on disk.
#[test]
fn test_resolve_task_requires_record() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = seed_catalog(dir.path());

    let task = catalog.resolve_task(dir.path(), &IdentityId::from("demo")).unwrap();
    assert!(task.ends_with("CURRENT_TASK.json"));

    fs::create_dir_all(dir.path().join("identity/drafted")).unwrap();
    let missing = catalog.resolve_task(dir.path(), &IdentityId::from("drafted"));
    assert!(matches!(missing, Err(CatalogError::TaskNotFound { .. })));
}

// ============================================================================
// SECTION: Target Selection
// ============================================================================

/// Tests the default selector picks active identities.
#[test]
fn test_select_targets_active_only() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = seed_catalog(dir.path());

    let targets = catalog.select_targets(&TargetSelector::ActiveOrDefault).unwrap();
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].id.as_str(), "demo");
}

/// Tests the selector falls back to the default identity.
#[test]
fn test_select_targets_default_fallback() {
    let dir = tempfile::tempdir().unwrap();
    let mut catalog = seed_catalog(dir.path());
    for entry in &mut catalog.identities {
        entry.status = "inactive".to_string();
    }

    let targets = catalog.select_targets(&TargetSelector::ActiveOrDefault).unwrap();
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].id.as_str(), "demo");
}

/// Tests selecting an absent identity is an error, not an empty set.
#[test]
fn test_select_targets_missing_id() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = seed_catalog(dir.path());

    let result = catalog.select_targets(&TargetSelector::One(IdentityId::from("ghost")));
    assert!(matches!(result, Err(CatalogError::NoTargets)));
}

// ============================================================================
// SECTION: Registration
// ============================================================================

/// Tests registration appends inactive entries and preserves the default.
#[test]
fn test_register_preserves_default() {
    let dir = tempfile::tempdir().unwrap();
    let mut catalog = seed_catalog(dir.path());

    catalog.register(
        CatalogEntry {
            id: IdentityId::from("fresh"),
            title: "Fresh".to_string(),
            description: "Newly installed".to_string(),
            status: String::new(),
            methodology_version: "v1.2.3".to_string(),
            pack_path: "identity/packs/fresh".to_string(),
            tags: Some(vec!["identity".to_string()]),
            policy: None,
            dependencies: None,
            interface: None,
            governance: None,
            extra: serde_json::Map::new(),
        },
        false,
    );

    assert_eq!(catalog.default_identity.as_str(), "demo");
    let fresh = catalog.entry(&IdentityId::from("fresh")).unwrap();
    assert_eq!(fresh.status, "inactive");
}

/// Tests re-registration updates in place and can activate.
#[test]
fn test_register_updates_existing_entry() {
    let dir = tempfile::tempdir().unwrap();
    let mut catalog = seed_catalog(dir.path());

    catalog.register(
        CatalogEntry {
            id: IdentityId::from("drafted"),
            title: "Drafted v2".to_string(),
            description: String::new(),
            status: String::new(),
            methodology_version: "v1.2.3".to_string(),
            pack_path: "identity/packs/drafted-v2".to_string(),
            tags: None,
            policy: None,
            dependencies: None,
            interface: None,
            governance: None,
            extra: serde_json::Map::new(),
        },
        true,
    );

    assert_eq!(catalog.identities.len(), 2);
    let updated = catalog.entry(&IdentityId::from("drafted")).unwrap();
    assert_eq!(updated.title, "Drafted v2");
    assert_eq!(updated.description, "Inactive identity");
    assert_eq!(updated.pack_path, "identity/packs/drafted-v2");
    assert!(updated.is_active());
}

/// Tests activation flips status and save round-trips entry order.
#[test]
fn test_activate_and_save_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let mut catalog = seed_catalog(dir.path());
    catalog.activate(&IdentityId::from("drafted")).unwrap();

    let path = dir.path().join("identity/catalog/identities.yaml");
    catalog.save(&path).unwrap();
    let reloaded = Catalog::load(&path).unwrap();

    assert_eq!(reloaded.identities[0].id.as_str(), "demo");
    assert_eq!(reloaded.identities[1].id.as_str(), "drafted");
    assert!(reloaded.identities[1].is_active());
}
