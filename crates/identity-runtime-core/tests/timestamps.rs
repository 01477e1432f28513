// crates/identity-runtime-core/tests/timestamps.rs
// ============================================================================
// Module: Timestamp Tests
// Description: Tests for the canonical ISO-8601 UTC timestamp wrapper.
// ============================================================================
//! ## Overview
//! Validates the Z-suffixed wire format, offset normalization, and age math.

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

use identity_runtime_core::Timestamp;

// ============================================================================
// SECTION: Wire Format
// ============================================================================

/// Tests render produces the canonical Z-suffixed second form.
#[test]
fn test_render_canonical_form() {
    let stamp = Timestamp::parse("2026-02-22T09:40:00Z").unwrap();
    assert_eq!(stamp.render(), "2026-02-22T09:40:00Z");
    assert_eq!(stamp.date_stamp(), "2026-02-22");
}

/// Tests offsets normalize to UTC.
#[test]
fn test_parse_normalizes_offsets() {
    let offset = Timestamp::parse("2026-02-22T10:40:00+01:00").unwrap();
    let utc = Timestamp::parse("2026-02-22T09:40:00Z").unwrap();
    assert_eq!(offset, utc);
}

/// Tests serde round-trips the canonical form.
#[test]
fn test_serde_round_trip() {
    let stamp = Timestamp::parse("2026-02-22T09:40:00Z").unwrap();
    let json = serde_json::to_string(&stamp).unwrap();
    assert_eq!(json, "\"2026-02-22T09:40:00Z\"");
    let back: Timestamp = serde_json::from_str(&json).unwrap();
    assert_eq!(back, stamp);
}

/// Tests malformed inputs are rejected.
#[test]
fn test_parse_rejects_naive_timestamps() {
    assert!(Timestamp::parse("2026-02-22 09:40:00").is_err());
    assert!(Timestamp::parse("not-a-time").is_err());
}

// ============================================================================
// SECTION: Arithmetic
// ============================================================================

/// Tests age computation in whole days.
#[test]
fn test_age_days() {
    let earlier = Timestamp::parse("2026-02-15T09:40:00Z").unwrap();
    let now = Timestamp::parse("2026-02-22T09:40:00Z").unwrap();
    assert_eq!(earlier.age_days(now), 7);
    assert_eq!(now.age_days(earlier), -7);
}

/// Tests unix round-trip and hour subtraction.
#[test]
fn test_unix_round_trip_and_window() {
    let stamp = Timestamp::from_unix_seconds(1_771_000_000).unwrap();
    assert_eq!(Timestamp::from_unix_seconds(stamp.unix_seconds()).unwrap(), stamp);

    let window_start = stamp.minus_hours(24);
    assert_eq!(stamp.seconds_since(window_start), 86_400);
}
