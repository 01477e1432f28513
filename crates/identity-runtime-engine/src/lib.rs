// crates/identity-runtime-engine/src/lib.rs
// ============================================================================
// Module: Identity Runtime Engine Library
// Description: Public API surface for engine orchestration.
// Purpose: Expose the decider, executor, installer, gate, and scaffolder.
// Dependencies: crate modules
// ============================================================================

//! ## Overview
//! The engine crate carries every mutating workflow: the metrics-thresholded
//! upgrade executor, the install-safety classifier, the CI enforcement gate,
//! the runtime brief compiler, the route-metrics exporter, and the pack
//! scaffolder. All workflows emit write-once reports and append-only log
//! entries; nothing here rewrites existing history.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod cigate;
pub mod compile;
pub mod exporter;
pub mod install;
pub mod metrics;
pub mod policy;
pub mod scaffold;
pub mod upgrade;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use cigate::CiGateError;
pub use cigate::CiGateOptions;
pub use cigate::CiGateOutcome;
pub use compile::CompileError;
pub use compile::CompileOutcome;
pub use exporter::ExportError;
pub use install::InstallError;
pub use install::InstallOperation;
pub use install::InstallOptions;
pub use install::InstallOutcome;
pub use install::InstallReport;
pub use metrics::RouteQualityMetrics;
pub use metrics::TriggerThresholds;
pub use metrics::UpgradeDecision;
pub use metrics::decide_upgrade;
pub use policy::PatchSurfacePolicy;
pub use policy::PathPolicyViolation;
pub use scaffold::ScaffoldError;
pub use scaffold::ScaffoldOptions;
pub use scaffold::ScaffoldProfile;
pub use upgrade::ExecutionReport;
pub use upgrade::UpgradeError;
pub use upgrade::UpgradeMode;
pub use upgrade::UpgradeOptions;
pub use upgrade::UpgradeOutcome;
