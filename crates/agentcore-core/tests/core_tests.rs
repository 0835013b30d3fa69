//! Integration tests for agentcore-core: shared types and error taxonomy.

use agentcore_core::{clamp, CorrelationId, CoreError, Priority, Source, StressLevel};

#[test]
fn priority_order_is_critical_first() {
    assert_eq!(Priority::Critical as u8, 0);
    assert_eq!(Priority::High as u8, 1);
    assert_eq!(Priority::Normal as u8, 2);
    assert_eq!(Priority::Low as u8, 3);
    assert_eq!(Priority::Idle as u8, 4);
}

#[test]
fn priority_serde_lowercase() {
    let json = serde_json::to_string(&Priority::Critical).unwrap();
    assert_eq!(json, "\"critical\"");
    let back: Priority = serde_json::from_str("\"idle\"").unwrap();
    assert_eq!(back, Priority::Idle);
}

#[test]
fn source_display() {
    assert_eq!(Source::Communication.to_string(), "communication");
    assert_eq!(Source::Plugin.to_string(), "plugin");
}

#[test]
fn correlation_id_is_unique() {
    let a = CorrelationId::new();
    let b = CorrelationId::new();
    assert_ne!(a, b);
}

#[test]
fn stress_level_ordering() {
    assert!(StressLevel::Normal < StressLevel::Elevated);
    assert!(StressLevel::Elevated < StressLevel::High);
    assert!(StressLevel::High < StressLevel::Critical);
}

#[test]
fn stress_level_tier_mask_degrades_monotonically() {
    let masks: Vec<_> = [
        StressLevel::Normal,
        StressLevel::Elevated,
        StressLevel::High,
        StressLevel::Critical,
    ]
    .iter()
    .map(|l| l.active_tiers())
    .collect();

    // Once a tier is disabled at some level, it stays disabled at all worse levels.
    for window in masks.windows(2) {
        let (a, b) = (window[0], window[1]);
        assert!(!(b.autonomic && !a.autonomic));
        assert!(!(b.aggregation && !a.aggregation));
        assert!(!(b.cognition && !a.cognition));
        assert!(!(b.smart && !a.smart));
    }
}

#[test]
fn clamp_handles_nan_as_lower_bound() {
    assert_eq!(clamp(f64::NAN, 0.0, 1.0), 0.0);
}

#[test]
fn error_kind_stable_strings() {
    assert_eq!(CoreError::validation_failed("x").kind(), "validation_failed");
    assert_eq!(CoreError::dependency_missing("a", "b").kind(), "dependency_missing");
    assert_eq!(CoreError::activation_failed("a", "b").kind(), "activation_failed");
    assert_eq!(CoreError::rate_limited("a", 1).kind(), "rate_limited");
    assert_eq!(CoreError::storage_limit_exceeded("a", 1.0, 2.0).kind(), "storage_limit_exceeded");
    assert_eq!(CoreError::schedule_limit_exceeded("a", 1).kind(), "schedule_limit_exceeded");
    assert_eq!(CoreError::recipient_collision("rcpt_x").kind(), "recipient_collision");
    assert_eq!(CoreError::tool_invocation_error("t", "m").kind(), "tool_invocation_error");
    assert_eq!(CoreError::internal("x").kind(), "internal");
}

#[test]
fn error_messages_include_context() {
    let e = CoreError::recipient_collision("rcpt_deadbeef");
    assert!(e.to_string().contains("rcpt_deadbeef"));
}
