// crates/identity-runtime-validate/tests/common/mod.rs
// ============================================================================
// Module: Validator Test Fixtures
// Description: Scaffolded runtime trees and validator contexts.
// ============================================================================
//! ## Overview
//! Seeds a full-contract identity via the production scaffolder and builds
//! validator contexts pinned to the fixture clock.

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
    dead_code,
    reason = "Test-only fixtures shared across integration test binaries."
)]

use std::path::Path;

use identity_runtime_core::IdentityId;
use identity_runtime_core::RuntimeLayout;
use identity_runtime_core::Timestamp;
use identity_runtime_engine::ScaffoldOptions;
use identity_runtime_engine::ScaffoldProfile;
use identity_runtime_engine::scaffold::scaffold_pack;
use identity_runtime_validate::ValidatorContext;

/// Fixed test clock.
pub const NOW: &str = "2026-02-22T09:40:00Z";

/// Returns the fixed test clock.
pub fn now() -> Timestamp {
    Timestamp::parse(NOW).unwrap()
}

/// Scaffolds identity `demo`, registered and activated, under `root`.
pub fn seed_runtime(root: &Path) -> RuntimeLayout {
    let layout = RuntimeLayout::new(root);
    scaffold_pack(
        &layout,
        &ScaffoldOptions {
            id: IdentityId::from("demo"),
            title: "Demo".to_string(),
            description: "Demo identity".to_string(),
            profile: ScaffoldProfile::FullContract,
            register: true,
            activate: true,
            set_default: true,
            pack_root: None,
            catalog: None,
            now: now(),
        },
    )
    .unwrap();
    layout
}

/// Builds a validator context for `demo` at the fixture clock.
pub fn ctx(layout: &RuntimeLayout) -> ValidatorContext {
    ValidatorContext::new(layout.clone(), IdentityId::from("demo"), now())
}
