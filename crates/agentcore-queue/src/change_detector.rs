//! Weber–Fechner Change Detector (C4): relative-change significance test
//! whose threshold scales inversely with alertness.

use agentcore_core::clamp;

#[derive(Clone, Copy, Debug)]
pub struct ChangeDetectorConfig {
    pub min_absolute_change: f64,
    pub base_threshold: f64,
    pub alertness_influence: f64,
    pub max_threshold: f64,
}

impl Default for ChangeDetectorConfig {
    fn default() -> Self {
        Self {
            min_absolute_change: 0.01,
            base_threshold: 0.1,
            alertness_influence: 0.5,
            max_threshold: 0.9,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChangeResult {
    pub delta: f64,
    pub relative: f64,
    pub is_significant: bool,
}

/// `alertness` in `[0, 1]`; lower alertness widens the threshold (harder
/// to notice small changes), matching §4.5's adjusted-threshold formula.
pub fn detect_change(previous: f64, current: f64, alertness: f64, cfg: &ChangeDetectorConfig) -> ChangeResult {
    let delta = current - previous;

    if previous == 0.0 {
        let is_significant = delta.abs() >= cfg.min_absolute_change;
        return ChangeResult { delta, relative: 0.0, is_significant };
    }

    let relative = 2.0 * delta.abs() / (previous.abs() + current.abs());
    let adjusted_threshold = clamp(
        cfg.base_threshold * (1.0 + cfg.alertness_influence * (1.0 - alertness)),
        0.0,
        cfg.max_threshold,
    );

    let is_significant = delta.abs() >= cfg.min_absolute_change && relative.abs() >= adjusted_threshold;

    ChangeResult { delta, relative, is_significant }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_previous_uses_absolute_threshold() {
        let cfg = ChangeDetectorConfig::default();
        let r = detect_change(0.0, 0.02, 0.5, &cfg);
        assert!(r.is_significant);
        let r = detect_change(0.0, 0.005, 0.5, &cfg);
        assert!(!r.is_significant);
    }

    #[test]
    fn lower_alertness_widens_threshold() {
        let cfg = ChangeDetectorConfig::default();
        // A 15% relative change clears the base threshold (0.1) but not
        // necessarily the alertness-widened one.
        let alert = detect_change(1.0, 1.15, 1.0, &cfg);
        let drowsy = detect_change(1.0, 1.15, 0.0, &cfg);
        assert!(alert.is_significant);
        assert!(!drowsy.is_significant);
    }

    #[test]
    fn large_swing_significant_in_either_direction() {
        let cfg = ChangeDetectorConfig::default();
        let forward = detect_change(1.0, 1.5, 0.3, &cfg);
        let backward = detect_change(1.5, 1.0, 0.3, &cfg);
        assert!(forward.is_significant);
        assert!(backward.is_significant);
    }

    #[test]
    fn symmetric_under_argument_swap() {
        let cfg = ChangeDetectorConfig { base_threshold: 0.6, ..ChangeDetectorConfig::default() };
        let forward = detect_change(1.0, 1.8, 1.0, &cfg);
        let backward = detect_change(1.8, 1.0, 1.0, &cfg);
        assert_eq!(forward.is_significant, backward.is_significant);
        assert!((forward.relative - backward.relative).abs() < f64::EPSILON);
    }

    #[test]
    fn threshold_clamped_to_max() {
        let cfg = ChangeDetectorConfig {
            base_threshold: 10.0,
            alertness_influence: 10.0,
            max_threshold: 0.9,
            ..ChangeDetectorConfig::default()
        };
        // Even at zero alertness the effective threshold can't exceed 0.9,
        // so a >90% relative jump must register as significant.
        let r = detect_change(1.0, 2.0, 0.0, &cfg);
        assert!(r.is_significant);
    }
}
