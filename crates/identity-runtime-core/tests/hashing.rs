// crates/identity-runtime-core/tests/hashing.rs
// ============================================================================
// Module: Hashing Tests
// Description: Tests for byte hashing and directory content signatures.
// ============================================================================
//! ## Overview
//! Validates deterministic SHA-256 digests and signature equivalence laws.

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

use identity_runtime_core::hashing::directory_signature;
use identity_runtime_core::hashing::hash_bytes;
use identity_runtime_core::hashing::hash_file;

// ============================================================================
// SECTION: Byte Hashing
// ============================================================================

/// Tests the known SHA-256 digest of the empty input.
#[test]
fn test_hash_bytes_empty_input() {
    let digest = hash_bytes(b"");
    assert_eq!(
        digest.as_str(),
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
}

/// Tests file hashing matches byte hashing.
#[test]
fn test_hash_file_matches_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("payload.bin");
    fs::write(&path, b"identity runtime").unwrap();

    assert_eq!(hash_file(&path).unwrap(), hash_bytes(b"identity runtime"));
}

// ============================================================================
// SECTION: Directory Signatures
// ============================================================================

/// Tests byte-identical trees produce equal signatures.
#[test]
fn test_signature_equal_for_identical_trees() {
    let left = tempfile::tempdir().unwrap();
    let right = tempfile::tempdir().unwrap();
    for root in [left.path(), right.path()] {
        fs::create_dir_all(root.join("agents")).unwrap();
        fs::write(root.join("CURRENT_TASK.json"), "{}\n").unwrap();
        fs::write(root.join("agents/identity.yaml"), "interface: {}\n").unwrap();
    }

    let sig_left = directory_signature(left.path()).unwrap().unwrap();
    let sig_right = directory_signature(right.path()).unwrap().unwrap();
    assert_eq!(sig_left, sig_right);
}

/// Tests one differing byte changes the signature.
#[test]
fn test_signature_changes_with_content() {
    let root = tempfile::tempdir().unwrap();
    fs::write(root.path().join("a.txt"), "one").unwrap();
    let before = directory_signature(root.path()).unwrap().unwrap();

    fs::write(root.path().join("a.txt"), "two").unwrap();
    let after = directory_signature(root.path()).unwrap().unwrap();
    assert_ne!(before, after);
}

/// Tests a missing directory yields no signature.
#[test]
fn test_signature_absent_for_missing_dir() {
    let root = tempfile::tempdir().unwrap();
    let missing = root.path().join("nope");
    assert!(directory_signature(&missing).unwrap().is_none());
}

/// Tests signatures ignore file discovery order.
#[test]
fn test_signature_is_order_independent() {
    let root = tempfile::tempdir().unwrap();
    fs::write(root.path().join("b.txt"), "beta").unwrap();
    fs::write(root.path().join("a.txt"), "alpha").unwrap();
    let first = directory_signature(root.path()).unwrap().unwrap();
    let second = directory_signature(root.path()).unwrap().unwrap();
    assert_eq!(first, second);
}
