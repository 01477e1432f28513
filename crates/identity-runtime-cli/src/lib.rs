// crates/identity-runtime-cli/src/lib.rs
// ============================================================================
// Module: Identity Runtime CLI Library
// Description: Shared helpers for the identity command-line interface.
// Purpose: Provide reusable components (i18n) for the CLI binary and tests.
// Dependencies: Standard library.
// ============================================================================

//! ## Overview
//! This library module houses the CLI message catalog. The binary entry point
//! (`src/main.rs`) routes every user-facing string through the [`t!`](crate::t)
//! macro to keep output consistent and diffable.

// ============================================================================
// SECTION: Modules
// ============================================================================

/// Message catalog and translation helpers.
pub mod i18n;
