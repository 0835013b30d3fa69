//! Stress Monitor (C9): combines lag and CPU sampling into a hysteresis-
//! gated `StressLevel`.

use crate::cpu::CpuSampler;
use crate::histogram::LagHistogram;
use agentcore_core::{StressLevel, TierMask};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StressConfig {
    pub lag_thresholds_ms: [f64; 3],
    pub cpu_thresholds_pct: [f64; 3],
    pub recovery_delay_ms: u64,
    pub lag_sample_interval_ms: u64,
    pub cpu_sample_interval_ms: u64,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            lag_thresholds_ms: [100.0, 250.0, 500.0],
            cpu_thresholds_pct: [70.0, 85.0, 95.0],
            recovery_delay_ms: 5000,
            lag_sample_interval_ms: 20,
            cpu_sample_interval_ms: 1000,
        }
    }
}

fn level_for(value: f64, thresholds: [f64; 3]) -> StressLevel {
    if value >= thresholds[2] {
        StressLevel::Critical
    } else if value >= thresholds[1] {
        StressLevel::High
    } else if value >= thresholds[0] {
        StressLevel::Elevated
    } else {
        StressLevel::Normal
    }
}

pub struct StressMonitor {
    config: StressConfig,
    lag_histogram: LagHistogram,
    cpu_sampler: CpuSampler,
    current_level: StressLevel,
    below_current_since: Option<Instant>,
}

impl StressMonitor {
    pub fn new(config: StressConfig) -> Self {
        Self {
            config,
            lag_histogram: LagHistogram::new(),
            cpu_sampler: CpuSampler::new(),
            current_level: StressLevel::Normal,
            below_current_since: None,
        }
    }

    pub fn record_lag_sample(&mut self, lag_ms: f64) {
        self.lag_histogram.record(lag_ms.max(0.0));
    }

    pub fn record_cpu_sample(&mut self) -> f64 {
        self.cpu_sampler.sample()
    }

    pub fn level(&self) -> StressLevel {
        self.current_level
    }

    pub fn active_tiers(&self) -> TierMask {
        self.current_level.active_tiers()
    }

    /// Recomputes the measured level from current samples and applies
    /// hysteresis against the previously reported level. `now` is
    /// threaded in so this is testable without real time.
    pub fn update(&mut self, cpu_pct: f64, now: Instant) -> StressLevel {
        let lag_level = level_for(self.lag_histogram.p99(), self.config.lag_thresholds_ms);
        let cpu_level = level_for(cpu_pct, self.config.cpu_thresholds_pct);
        let measured = lag_level.max(cpu_level);

        if measured >= self.current_level {
            self.current_level = measured;
            self.below_current_since = None;
            return self.current_level;
        }

        // measured < current_level: track how long we've been at or below
        // the level one step down before allowing a drop.
        let one_step_down = self.current_level.step_down();
        if measured <= one_step_down {
            let since = self.below_current_since.get_or_insert(now);
            let recovery_delay = Duration::from_millis(self.config.recovery_delay_ms);
            if now.duration_since(*since) >= recovery_delay {
                self.current_level = one_step_down;
                self.below_current_since = None;
            }
        } else {
            self.below_current_since = None;
        }

        self.current_level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stress_rises_instantly() {
        let mut monitor = StressMonitor::new(StressConfig::default());
        monitor.record_lag_sample(600.0);
        assert_eq!(monitor.update(0.0, Instant::now()), StressLevel::Critical);
    }

    #[test]
    fn stress_does_not_drop_before_recovery_delay() {
        let mut config = StressConfig::default();
        config.recovery_delay_ms = 1000;
        let mut monitor = StressMonitor::new(config);
        monitor.record_lag_sample(600.0);
        let t0 = Instant::now();
        monitor.update(0.0, t0);
        assert_eq!(monitor.level(), StressLevel::Critical);

        // measurements now clear, but recovery delay hasn't elapsed
        let mut clean = LagHistogram::new();
        clean.record(0.0);
        monitor.lag_histogram = clean;
        let still_critical = monitor.update(0.0, t0 + Duration::from_millis(500));
        assert_eq!(still_critical, StressLevel::Critical);
    }

    #[test]
    fn stress_drops_one_level_at_a_time_after_recovery_delay() {
        let mut config = StressConfig::default();
        config.recovery_delay_ms = 1000;
        let mut monitor = StressMonitor::new(config);
        monitor.record_lag_sample(600.0);
        let t0 = Instant::now();
        monitor.update(0.0, t0);
        assert_eq!(monitor.level(), StressLevel::Critical);

        let mut clean = LagHistogram::new();
        clean.record(0.0);
        monitor.lag_histogram = clean;

        let after_delay = monitor.update(0.0, t0 + Duration::from_millis(1100));
        assert_eq!(after_delay, StressLevel::High, "drops only one level at a time");
    }

    #[test]
    fn active_tiers_match_level() {
        let mut monitor = StressMonitor::new(StressConfig::default());
        monitor.record_lag_sample(50.0);
        monitor.update(0.0, Instant::now());
        assert_eq!(monitor.active_tiers(), StressLevel::Normal.active_tiers());
    }
}
