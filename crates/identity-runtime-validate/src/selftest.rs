// crates/identity-runtime-validate/src/selftest.rs
// ============================================================================
// Module: Validator Self-Test Harness
// Description: Positive/negative corpus runner for evidence validators.
// Purpose: Assert validators accept good samples and reject bad ones.
// Dependencies: identity-runtime-core
// ============================================================================

//! ## Overview
//! A self-test corpus is a directory of `positive/*.json` and
//! `negative/*.json` sample files. Every positive sample must be accepted by
//! the validator's record check; every negative sample must be rejected.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;

use identity_runtime_core::FindingKind;
use identity_runtime_core::FindingLog;

// ============================================================================
// SECTION: Corpus Runner
// ============================================================================

/// Runs a positive/negative corpus against a per-file acceptance check.
///
/// `accepts` returns `true` when the sample passes validation. Findings are
/// accumulated into `log`; corpus size minimums are enforced first.
pub fn run_corpus(
    log: &mut FindingLog,
    sample_root: &Path,
    label: &str,
    min_positive: usize,
    min_negative: usize,
    mut accepts: impl FnMut(&Path) -> bool,
) {
    let positive = corpus_files(&sample_root.join("positive"));
    let negative = corpus_files(&sample_root.join("negative"));

    if positive.len() < min_positive || negative.len() < min_negative {
        log.fail(
            FindingKind::Evidence,
            format!("{label}.self_test"),
            format!(
                "{label} self-test requires >={min_positive} positive and >={min_negative} \
                 negative samples under {}",
                sample_root.display()
            ),
        );
        return;
    }

    let mut clean = true;
    for sample in &positive {
        if accepts(sample) {
            log.ok(format!("positive sample passed: {}", sample.display()));
        } else {
            clean = false;
            log.fail(
                FindingKind::Evidence,
                format!("{label}.self_test"),
                format!("positive sample should pass: {}", sample.display()),
            );
        }
    }

    for sample in &negative {
        if accepts(sample) {
            clean = false;
            log.fail(
                FindingKind::Evidence,
                format!("{label}.self_test"),
                format!("negative sample should fail: {}", sample.display()),
            );
        } else {
            log.ok(format!("negative sample rejected: {}", sample.display()));
        }
    }

    if clean {
        log.ok(format!("{label} self-test passed"));
    }
}

/// Lists the JSON sample files of one corpus side, sorted.
fn corpus_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().map(|ext| ext == "json").unwrap_or(false))
        .collect();
    files.sort();
    files
}
