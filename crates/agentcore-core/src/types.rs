//! Shared primitive types used across every layer of the core.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Event/signal priority. Lower numeric value means higher priority;
/// the `Ord` impl is derived in declaration order so `Priority::Critical < Priority::Idle`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical = 0,
    High = 1,
    Normal = 2,
    Low = 3,
    Idle = 4,
}

impl Priority {
    pub const ALL: [Priority; 5] = [
        Priority::Critical,
        Priority::High,
        Priority::Normal,
        Priority::Low,
        Priority::Idle,
    ];

    pub fn as_index(self) -> usize {
        self as usize
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}

/// Where an event/signal originated.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Communication,
    Thoughts,
    Internal,
    Time,
    System,
    Plugin,
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Source::Communication => "communication",
            Source::Thoughts => "thoughts",
            Source::Internal => "internal",
            Source::Time => "time",
            Source::System => "system",
            Source::Plugin => "plugin",
        };
        write!(f, "{s}")
    }
}

/// A correlation id shared by everything emitted within one tick.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CorrelationId(pub uuid::Uuid);

impl CorrelationId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stress level, totally ordered from least to most degraded.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum StressLevel {
    Normal = 0,
    Elevated = 1,
    High = 2,
    Critical = 3,
}

impl Default for StressLevel {
    fn default() -> Self {
        StressLevel::Normal
    }
}

impl StressLevel {
    /// One level less degraded, or `self` if already `Normal`.
    pub fn step_down(self) -> Self {
        match self {
            StressLevel::Critical => StressLevel::High,
            StressLevel::High => StressLevel::Elevated,
            StressLevel::Elevated => StressLevel::Normal,
            StressLevel::Normal => StressLevel::Normal,
        }
    }

    pub fn active_tiers(self) -> TierMask {
        match self {
            StressLevel::Normal => TierMask { autonomic: true, aggregation: true, cognition: true, smart: true },
            StressLevel::Elevated => TierMask { autonomic: true, aggregation: true, cognition: true, smart: false },
            StressLevel::High => TierMask { autonomic: true, aggregation: true, cognition: false, smart: false },
            StressLevel::Critical => TierMask { autonomic: true, aggregation: false, cognition: false, smart: false },
        }
    }
}

impl std::fmt::Display for StressLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StressLevel::Normal => "normal",
            StressLevel::Elevated => "elevated",
            StressLevel::High => "high",
            StressLevel::Critical => "critical",
        };
        write!(f, "{s}")
    }
}

/// Which processing tiers are currently allowed to run.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TierMask {
    pub autonomic: bool,
    pub aggregation: bool,
    pub cognition: bool,
    pub smart: bool,
}

/// Clamp a value into `[lo, hi]`, tolerating NaN by treating it as `lo`.
pub fn clamp(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        return lo;
    }
    match value.partial_cmp(&lo) {
        Some(Ordering::Less) | None => lo,
        _ => match value.partial_cmp(&hi) {
            Some(Ordering::Greater) => hi,
            _ => value,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_ordering_lower_is_higher_priority() {
        assert!(Priority::Critical < Priority::High);
        assert!(Priority::High < Priority::Normal);
        assert!(Priority::Idle > Priority::Low);
    }

    #[test]
    fn stress_step_down_one_level() {
        assert_eq!(StressLevel::Critical.step_down(), StressLevel::High);
        assert_eq!(StressLevel::Normal.step_down(), StressLevel::Normal);
    }

    #[test]
    fn tier_mask_matches_table() {
        assert_eq!(StressLevel::Critical.active_tiers(), TierMask { autonomic: true, aggregation: false, cognition: false, smart: false });
        assert_eq!(StressLevel::Normal.active_tiers(), TierMask { autonomic: true, aggregation: true, cognition: true, smart: true });
    }

    #[test]
    fn clamp_bounds() {
        assert_eq!(clamp(5.0, 0.0, 1.0), 1.0);
        assert_eq!(clamp(-5.0, 0.0, 1.0), 0.0);
        assert_eq!(clamp(0.5, 0.0, 1.0), 0.5);
    }
}
