// crates/identity-runtime-contract/tests/common/mod.rs
// ============================================================================
// Module: Contract Test Fixtures
// Description: Canonical full-contract task record and pack seeding helpers.
// ============================================================================
//! ## Overview
//! Builds a compliant full-contract task record plus the on-disk evidence the
//! contract model resolves (rulebook rows, protocol review evidence).

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

use std::fs;
use std::path::Path;

use serde_json::Value;
use serde_json::json;

/// Returns a compliant full-contract task record for `id`.
pub fn full_task_record(id: &str) -> Value {
    json!({
        "task_id": format!("{id}_bootstrap"),
        "agent_identity": {
            "name": id,
            "role": "Demo role",
            "methodology_version": "v1.2.3",
            "prompt_version": "v1.2.3",
            "json_version": "v1.2.3",
            "identity_prompt_path": format!("identity/packs/{id}/IDENTITY_PROMPT.md"),
            "canon_path": "identity/protocol/IDENTITY_PROTOCOL.md"
        },
        "objective": {"title": "Bootstrap the identity", "priority": "HIGH", "status": "pending"},
        "state_machine": {
            "current_state": "intake",
            "allowed_states": ["intake", "analyze", "execute", "verify", "done", "blocked"],
            "transition_rules": [
                "intake -> analyze",
                "analyze -> execute",
                "execute -> verify",
                "verify -> done",
                "verify -> analyze",
                "analyze -> blocked"
            ]
        },
        "gates": {
            "document_gate": "required",
            "media_gate": "required",
            "category_compliance_gate": "required",
            "reject_memory_gate": "required",
            "payload_evidence_gate": "required",
            "multimodal_consistency_gate": "required",
            "reasoning_loop_gate": "required",
            "routing_gate": "required",
            "rulebook_gate": "required",
            "protocol_baseline_review_gate": "required",
            "identity_update_gate": "required",
            "collaboration_trigger_gate": "required",
            "orchestration_gate": "required",
            "knowledge_acquisition_gate": "required",
            "experience_feedback_gate": "required",
            "install_safety_gate": "required",
            "install_provenance_gate": "optional",
            "ci_enforcement_gate": "required",
            "arbitration_gate": "required"
        },
        "protocol_review_contract": {
            "required_before": ["identity_capability_upgrade", "identity_architecture_decision"],
            "must_review_sources": [
                {"type": "repo_file", "repo": "identity-runtime", "path": "identity/protocol/IDENTITY_PROTOCOL.md"}
            ],
            "required_evidence_fields": [
                "review_id", "reviewed_at", "reviewer_identity", "purpose",
                "sources_reviewed", "findings", "decision"
            ],
            "evidence_report_path_pattern": "identity/runtime/examples/protocol-baseline-review-*.json",
            "max_review_age_days": 7
        },
        "evaluation_contract": {
            "required_evidence_triplet": ["api_evidence", "event_evidence", "ui_evidence"],
            "consistency_required": true,
            "consistency_fail_action": "block_done_and_trigger_recheck",
            "run_report_path_pattern": "resource/reports/*run*.json"
        },
        "reasoning_loop_contract": {
            "max_attempts_before_escalation": 3,
            "mandatory_fields_per_attempt": ["attempt", "hypothesis", "patch", "expected_effect", "result"],
            "failure_requires_next_action": true
        },
        "routing_contract": {
            "auto_route_enabled": true,
            "fallback_switch_after_failures": 2,
            "problem_type_routes": {
                "unknown": ["identity-creator"],
                "capability_gap": ["identity-creator"]
            }
        },
        "rulebook_contract": {
            "append_only": true,
            "required_rule_types": ["negative", "positive"],
            "required_fields": [
                "rule_id", "type", "trigger", "action",
                "evidence_run_id", "scope", "confidence", "updated_at"
            ],
            "rulebook_path": format!("identity/packs/{id}/RULEBOOK.jsonl")
        },
        "identity_update_lifecycle_contract": {
            "trigger_contract": {
                "mandatory_conditions": ["repeated_failure", "protocol_drift"],
                "max_attempts_before_update": 3
            },
            "patch_surface_contract": {
                "required_files": [
                    "CURRENT_TASK.json", "IDENTITY_PROMPT.md", "RULEBOOK.jsonl", "TASK_HISTORY.md"
                ],
                "required_rulebook_update": true
            },
            "validation_contract": {
                "required_checks": [
                    "runtime-contract", "upgrade-prereq", "update-lifecycle",
                    "trigger-regression", "collab-trigger", "install-safety",
                    "experience-feedback", "capability-arbitration"
                ],
                "must_pass_all": true
            },
            "replay_contract": {
                "replay_required": true,
                "replay_same_case_required": true,
                "replay_fail_action": "block_promotion",
                "evidence_path_pattern": format!("identity/runtime/examples/{id}-update-replay-*.json"),
                "required_fields": [
                    "identity_id", "replay_status", "patched_files", "validation_checks_passed"
                ]
            }
        },
        "trigger_regression_contract": {
            "required": true,
            "required_suites": ["positive_cases", "boundary_cases", "negative_cases"],
            "result_enum": ["PASS", "FAIL"],
            "sample_report_path_pattern": format!("identity/runtime/examples/{id}-trigger-regression-*.json"),
            "fail_action": "block_update"
        },
        "blocker_taxonomy_contract": {
            "required": true,
            "required_blocker_types": [
                "login_required", "captcha_required", "session_expired",
                "manual_verification_required"
            ],
            "blocker_classification_required_fields": [
                "blocker_type", "source", "detected_at", "requires_human_collab", "next_action"
            ]
        },
        "collaboration_trigger_contract": {
            "hard_rule": "notify immediately on any human-collaboration blocker",
            "trigger_conditions": [
                "login_required", "captcha_required", "session_expired",
                "manual_verification_required"
            ],
            "notify_policy": "notify_then_continue",
            "notify_timing": "immediate",
            "notify_channel": "ops-notification-router",
            "dedupe_window_hours": 24,
            "state_change_bypass_dedupe": true,
            "must_emit_receipt_in_chat": true,
            "receipt_required_fields": [
                "event_id", "blocker_type", "notified_at", "channel", "dedupe_key", "status"
            ],
            "evidence_log_path_pattern": format!("identity/runtime/examples/collab/{id}-*.json"),
            "minimum_evidence_logs_required": 1,
            "max_log_age_days": 7
        },
        "capability_orchestration_contract": {
            "required": true,
            "task_type_routes": {
                "default": {
                    "pipeline": ["intake", "analyze", "execute", "verify"],
                    "primary_skills": ["identity-runtime"],
                    "fallback_skills": [],
                    "required_mcp": ["filesystem"],
                    "max_tool_calls": 50,
                    "max_runtime_minutes": 30
                }
            },
            "preflight_requirements": ["catalog_resolves", "pack_files_present"],
            "fail_classification": [
                "route_wrong", "skill_gap", "mcp_unavailable", "tool_auth", "data_issue"
            ],
            "evidence_schema_fields": [
                "task_type", "route", "pipeline_stage", "result", "failure_class"
            ]
        },
        "knowledge_acquisition_contract": {
            "required": true,
            "must_research_when": ["unknown_domain", "stale_claim"],
            "source_priority": ["official_spec", "repo_contract", "community"],
            "evidence_fields": ["claim", "source", "source_level", "confidence", "expiry", "applies_to"],
            "sample_report_path_pattern": format!("identity/runtime/examples/{id}-knowledge-acquisition-*.json"),
            "high_frequency_domains": {"identity-governance": "weekly"}
        },
        "experience_feedback_contract": {
            "required": true,
            "redaction_policy_required": true,
            "retention_days": 90,
            "sensitive_fields_denylist": ["credential", "secret", "token"],
            "export_scope": "instance-only",
            "max_log_age_days": 7,
            "minimum_logs_required": 1,
            "feedback_log_path_pattern": format!("identity/runtime/logs/feedback/{id}-*.json"),
            "promotion_requires_replay_pass": true,
            "sample_report_path_pattern": format!("identity/runtime/examples/{id}-feedback-sample-*.json")
        },
        "install_safety_contract": {
            "required": true,
            "preserve_existing_default": true,
            "on_conflict": "abort_and_explain",
            "idempotent_reinstall_allowed": true,
            "same_signature_action": "no_op_with_report",
            "allow_replace_only_with_backup": true,
            "rollback_reference_required": true,
            "install_report_required": true,
            "dry_run_required": true,
            "install_report_path_pattern": "identity/runtime/examples/install/install-report-*.json"
        },
        "install_provenance_contract": {
            "required": true,
            "installer_tool_required": "identity-installer",
            "operations_required": ["plan", "dry-run", "install"],
            "report_path_pattern": "identity/runtime/reports/install/identity-install-*.json",
            "required_report_fields": [
                "report_id", "identity_id", "generated_at", "operation",
                "conflict_type", "action", "preserved_paths", "installer_invocation"
            ],
            "required_invocation_fields": ["tool", "entrypoint", "command"],
            "enforcement_validator": "install-provenance"
        },
        "ci_enforcement_contract": {
            "required": true,
            "required_workflows": ["identity-protocol-ci"],
            "required_job": "required-gates",
            "required_validator_set_label": "v1_2_required",
            "required_validators": [
                "manifest", "runtime-contract", "upgrade-prereq", "update-lifecycle",
                "install-safety", "experience-feedback", "capability-arbitration",
                "ci-enforcement"
            ],
            "candidate_validators_v1_2": [
                "trigger-regression", "collab-trigger", "agent-handoff",
                "knowledge-acquisition", "orchestration", "learning-loop",
                "install-provenance", "changelog"
            ],
            "required_checks": [
                "protocol-ci / required-gates",
                "identity-protocol-ci / required-gates"
            ],
            "freshness_gate": {
                "handoff_logs_max_age_days": 7,
                "route_metrics_max_age_days": 7
            }
        },
        "capability_arbitration_contract": {
            "required": true,
            "priority_order": ["accurate_judgement", "governance", "latency", "exploration"],
            "conflict_rules": {
                "judgement_vs_routing": {
                    "when": ["route_confidence_low"],
                    "decision": "prefer_accurate_judgement"
                },
                "reasoning_vs_latency": {
                    "when": ["deadline_pressure"],
                    "decision": "prefer_reasoning_within_budget"
                },
                "routing_vs_learning": {
                    "when": ["threshold_trigger"],
                    "decision": "trigger_identity_update_cycle"
                },
                "learning_vs_hotfix": {
                    "when": ["production_incident"],
                    "decision": "hotfix_then_backfill_learning"
                }
            },
            "trigger_thresholds": {
                "misroute_rate_percent": 10,
                "replay_failure_rate_percent": 10,
                "first_pass_success_drop_percent": 10
            },
            "decision_record_required_fields": [
                "arbitration_id", "task_id", "identity_id", "conflict_pair",
                "inputs", "decision", "impact", "rationale", "decided_at"
            ],
            "sample_report_path_pattern": format!("identity/runtime/examples/{id}-capability-arbitration-*.json"),
            "fail_action": "block_auto_apply",
            "safe_auto_patch_surface": {
                "allowlist": [
                    "identity/packs/*/RULEBOOK.jsonl",
                    "identity/packs/*/TASK_HISTORY.md",
                    "identity/runtime/logs/arbitration/*.json"
                ],
                "denylist": [
                    "identity/packs/*/CURRENT_TASK.json",
                    "identity/packs/*/IDENTITY_PROMPT.md"
                ]
            }
        },
        "agent_handoff_contract": {
            "handoff_log_path_pattern": format!("identity/runtime/logs/handoff/{id}-*.json"),
            "required_fields": [
                "handoff_id", "identity_id", "task_id", "timestamp",
                "route_decision", "result"
            ],
            "minimum_logs_required": 1,
            "max_log_age_days": 7
        },
        "learning_verification_contract": {
            "run_id_required": true,
            "reasoning_trace_required": true,
            "rulebook_linkage_required": true,
            "run_report_path_pattern": format!("identity/runtime/examples/{id}-learning-sample-*.json")
        },
        "route_quality_contract": {
            "metrics_output_path": format!("identity/runtime/metrics/{id}-route-quality.json")
        },
        "source_of_truth": {
            "local_docs_roots": ["docs/references"],
            "local_project_evidence_roots": ["resource/reports", "resource/preflight"]
        },
        "escalation_policy": {
            "email_for_offline_only": true,
            "offline_blockers": [],
            "do_not_email_for": [
                "routine_status_update", "normal_progress_report", "non_blocking_warning"
            ]
        },
        "required_artifacts": ["resource/reports/*.json", "resource/reports/*.md"],
        "post_execution_mandatory": [
            format!("append task outcome into identity/packs/{id}/TASK_HISTORY.md"),
            "update objective.status",
            "update state_machine.current_state"
        ],
        "version_control": {"sync_status": "initialized", "last_updated": "2026-02-22"}
    })
}

/// Seeds the pack files and evidence the contract model resolves on disk.
pub fn seed_pack(root: &Path, id: &str, now: &str) {
    let pack = root.join("identity/packs").join(id);
    fs::create_dir_all(&pack).unwrap();

    let record = full_task_record(id);
    fs::write(
        pack.join("CURRENT_TASK.json"),
        serde_json::to_string_pretty(&record).unwrap() + "\n",
    )
    .unwrap();
    fs::write(pack.join("IDENTITY_PROMPT.md"), "# Identity Prompt\n").unwrap();
    fs::write(pack.join("TASK_HISTORY.md"), "# Task History\n\n## Entries\n").unwrap();

    let rulebook_row = json!({
        "rule_id": format!("{id}-bootstrap-positive-rule"),
        "type": "positive",
        "trigger": "identity_pack_initialized",
        "action": "enforce_protocol_baseline_review_before_identity_upgrades",
        "evidence_run_id": "bootstrap",
        "scope": "identity_runtime",
        "confidence": "high",
        "updated_at": now
    });
    fs::write(pack.join("RULEBOOK.jsonl"), serde_json::to_string(&rulebook_row).unwrap() + "\n")
        .unwrap();

    let examples = root.join("identity/runtime/examples");
    fs::create_dir_all(&examples).unwrap();
    let review = json!({
        "review_id": format!("protocol-baseline-review-{id}-sample"),
        "reviewed_at": now,
        "reviewer_identity": id,
        "purpose": "baseline review evidence",
        "sources_reviewed": [
            {"type": "repo_file", "repo": "identity-runtime", "path": "identity/protocol/IDENTITY_PROTOCOL.md"}
        ],
        "findings": ["baseline sources reviewed"],
        "decision": {"result": "approved"}
    });
    fs::write(
        examples.join(format!("protocol-baseline-review-{id}-sample.json")),
        serde_json::to_string_pretty(&review).unwrap() + "\n",
    )
    .unwrap();
}
