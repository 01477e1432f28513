// crates/identity-runtime-engine/src/exporter.rs
// ============================================================================
// Module: Route Quality Metrics Exporter
// Description: Folds handoff production logs into a metrics document.
// Purpose: Feed the upgrade decider with observed routing quality.
// Dependencies: crate::metrics, identity-runtime-{contract,core}
// ============================================================================

//! ## Overview
//! A thin collaborator: every handoff log matched by the handoff contract's
//! pattern contributes counters (route hit, misroute, fallback, blocked,
//! first-pass success, knowledge reuse, replay success, policy drift), which
//! reduce to percentage rates rounded to two decimals.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;

use identity_runtime_contract::TaskRecord;
use identity_runtime_contract::task::bool_of;
use identity_runtime_contract::task::object_of;
use identity_runtime_contract::task::str_of;
use identity_runtime_core::Catalog;
use identity_runtime_core::CatalogError;
use identity_runtime_core::DocumentError;
use identity_runtime_core::IdentityId;
use identity_runtime_core::RuntimeLayout;
use identity_runtime_core::document;
use identity_runtime_core::evidence;
use thiserror::Error;

use crate::metrics::RouteQualityMetrics;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while exporting metrics.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Catalog resolution failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    /// Document read or write failed.
    #[error(transparent)]
    Document(#[from] DocumentError),
    /// The handoff contract declares no log pattern.
    #[error("agent_handoff_contract.handoff_log_path_pattern missing")]
    PatternMissing,
    /// No handoff logs matched the pattern.
    #[error("no handoff logs for metrics: pattern={0}")]
    NoLogs(String),
}

// ============================================================================
// SECTION: Exporter
// ============================================================================

/// Exports route quality metrics for an identity.
///
/// # Errors
///
/// Returns [`ExportError`] when the contract or logs cannot be resolved.
pub fn export_metrics(
    layout: &RuntimeLayout,
    identity_id: &IdentityId,
    out: Option<PathBuf>,
) -> Result<(RouteQualityMetrics, PathBuf), ExportError> {
    let catalog = Catalog::load(&layout.catalog_path())?;
    let task_path = catalog.resolve_task(layout.root(), identity_id)?;
    let task = TaskRecord::load(&task_path)?;

    let pattern = task
        .contract("agent_handoff_contract")
        .and_then(|contract| str_of(contract, "handoff_log_path_pattern"))
        .unwrap_or_default()
        .to_string();
    if pattern.is_empty() {
        return Err(ExportError::PatternMissing);
    }

    let files = evidence::matches(layout.root(), &pattern).unwrap_or_default();
    if files.is_empty() {
        return Err(ExportError::NoLogs(pattern));
    }

    let mut metrics = RouteQualityMetrics {
        identity_id: identity_id.as_str().to_string(),
        task_id: task.task_id(),
        source_pattern: pattern,
        ..RouteQualityMetrics::default()
    };

    for file in &files {
        let Ok(record) = document::load_json_mapping(file) else {
            continue;
        };
        metrics.total_routes += 1;

        let route = object_of(&record, "route_decision").cloned().unwrap_or_default();
        let hit = bool_of(&route, "route_hit").unwrap_or(false);
        let misroute = bool_of(&route, "misroute").unwrap_or(false);
        let fallback = bool_of(&route, "fallback").unwrap_or(false);

        let result = str_of(&record, "result").unwrap_or_default();
        if result == "BLOCKED" {
            metrics.blocked_count += 1;
        }
        if result == "PASS" && !fallback {
            metrics.first_pass_success_count += 1;
        }

        if hit {
            metrics.route_hit_count += 1;
        }
        if misroute {
            metrics.misroute_count += 1;
        }
        if fallback {
            metrics.fallback_count += 1;
        }

        let rulebook_applied = object_of(&record, "rulebook_update")
            .and_then(|update| bool_of(update, "applied"))
            .unwrap_or(false);
        if bool_of(&record, "knowledge_reuse").unwrap_or(false) || rulebook_applied {
            metrics.knowledge_reuse_count += 1;
        }
        if str_of(&record, "replay_status").unwrap_or_default().eq_ignore_ascii_case("PASS") {
            metrics.replay_success_count += 1;
        }
        if bool_of(&record, "policy_drift").unwrap_or(false)
            || bool_of(&record, "contract_violation").unwrap_or(false)
        {
            metrics.policy_drift_incidents += 1;
        }
    }

    metrics.route_hit_rate = pct(metrics.route_hit_count, metrics.total_routes);
    metrics.misroute_rate = pct(metrics.misroute_count, metrics.total_routes);
    metrics.fallback_rate = pct(metrics.fallback_count, metrics.total_routes);
    metrics.first_pass_success_rate = pct(metrics.first_pass_success_count, metrics.total_routes);
    metrics.knowledge_reuse_rate = pct(metrics.knowledge_reuse_count, metrics.total_routes);
    metrics.replay_success_rate = pct(metrics.replay_success_count, metrics.total_routes);

    let out_path = out.unwrap_or_else(|| layout.metrics_path(identity_id));
    document::write_json_pretty(&out_path, &metrics)?;
    Ok((metrics, out_path))
}

/// Percentage of `n` over `d`, rounded to two decimals; `0` when `d` is zero.
fn pct(n: u64, d: u64) -> f64 {
    if d == 0 {
        return 0.0;
    }
    let numerator = n as f64;
    let denominator = d as f64;
    ((numerator / denominator) * 10_000.0).round() / 100.0
}
