//! Runs the stress monitor as its own long-lived actor: a lag-sampling
//! loop that times its own `tokio::time::sleep` drift, a slower CPU
//! sampling tick, and a `watch` channel publishing the resulting tier
//! mask to the core loop.

use crate::monitor::{StressConfig, StressMonitor};
use agentcore_core::{StressLevel, TierMask};
use std::time::Instant;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Clone)]
pub struct StressHandle {
    pub levels: tokio::sync::watch::Receiver<StressLevel>,
}

impl StressHandle {
    pub fn current_tiers(&self) -> TierMask {
        self.levels.borrow().active_tiers()
    }
}

/// Spawns the stress monitor actor. Returns a handle whose `watch`
/// receiver always holds the most recently published `StressLevel`.
/// Cancellation is cooperative: the loop checks `cancel` each lag tick.
pub fn spawn_stress_monitor(config: StressConfig, cancel: CancellationToken) -> StressHandle {
    let (tx, rx) = tokio::sync::watch::channel(StressLevel::Normal);

    tokio::spawn(async move {
        let lag_interval = Duration::from_millis(config.lag_sample_interval_ms);
        let cpu_interval_ticks = (config.cpu_sample_interval_ms / config.lag_sample_interval_ms.max(1)).max(1);
        let mut monitor = StressMonitor::new(config);

        let mut ticks_since_cpu_sample: u64 = 0;
        let mut cpu_pct = 0.0;

        loop {
            let scheduled = Instant::now() + lag_interval;
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("stress monitor cancelled");
                    break;
                }
                _ = tokio::time::sleep(lag_interval) => {}
            }
            if cancel.is_cancelled() {
                break;
            }

            let actual = Instant::now();
            let lag_ms = actual.saturating_duration_since(scheduled).as_secs_f64() * 1000.0;
            monitor.record_lag_sample(lag_ms);

            ticks_since_cpu_sample += 1;
            if ticks_since_cpu_sample >= cpu_interval_ticks {
                ticks_since_cpu_sample = 0;
                cpu_pct = monitor.record_cpu_sample();
            }

            let level = monitor.update(cpu_pct, actual);
            if *tx.borrow() != level {
                let _ = tx.send(level);
            }
        }
    });

    StressHandle { levels: rx }
}
