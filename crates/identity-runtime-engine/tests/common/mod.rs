// crates/identity-runtime-engine/tests/common/mod.rs
// ============================================================================
// Module: Engine Test Fixtures
// Description: Scaffolded runtime trees for executor and installer tests.
// ============================================================================
//! ## Overview
//! Seeds a registered, activated full-contract identity in a temp runtime
//! tree via the production scaffolder, with a fixed clock.

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
use serde_json::json;

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

/// Overwrites the route-quality metrics document for `demo`.
pub fn write_metrics(layout: &RuntimeLayout, misroute: f64, replay: f64, first_pass: f64) {
    let metrics = json!({
        "identity_id": "demo",
        "misroute_rate": misroute,
        "replay_success_rate": replay,
        "first_pass_success_rate": first_pass,
    });
    identity_runtime_core::document::write_json_pretty(
        &layout.metrics_path(&IdentityId::from("demo")),
        &metrics,
    )
    .unwrap();
}
