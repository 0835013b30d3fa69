//! Process CPU percent via `/proc/self/stat` jiffy deltas. Degrades to
//! `0.0` off Linux or on any read/parse failure — lag alone still drives
//! stress computation.

use std::time::Instant;

#[cfg(target_os = "linux")]
fn read_total_jiffies() -> Option<u64> {
    let stat = std::fs::read_to_string("/proc/self/stat").ok()?;
    // Fields are space-separated; utime/stime are fields 14/15 (1-indexed),
    // but field 2 (comm) can itself contain spaces, so split after the
    // closing paren of comm rather than trusting whitespace alone.
    let after_comm = stat.rsplit_once(')')?.1;
    let fields: Vec<&str> = after_comm.split_whitespace().collect();
    // fields[0] is state (field 3); utime is field 14 -> fields[11], stime field 15 -> fields[12].
    let utime: u64 = fields.get(11)?.parse().ok()?;
    let stime: u64 = fields.get(12)?.parse().ok()?;
    Some(utime + stime)
}

#[cfg(not(target_os = "linux"))]
fn read_total_jiffies() -> Option<u64> {
    None
}

fn clock_ticks_per_sec() -> f64 {
    100.0
}

pub struct CpuSampler {
    last_jiffies: Option<u64>,
    last_sampled_at: Instant,
}

impl CpuSampler {
    pub fn new() -> Self {
        Self { last_jiffies: read_total_jiffies(), last_sampled_at: Instant::now() }
    }

    /// Samples CPU percent since the previous call. First call always
    /// reports 0.0 (no prior delta to measure against).
    pub fn sample(&mut self) -> f64 {
        let now = Instant::now();
        let elapsed_secs = (now - self.last_sampled_at).as_secs_f64();
        self.last_sampled_at = now;

        let Some(current) = read_total_jiffies() else {
            return 0.0;
        };
        let Some(previous) = self.last_jiffies.replace(current) else {
            return 0.0;
        };
        if elapsed_secs <= 0.0 {
            return 0.0;
        }

        let jiffies_delta = current.saturating_sub(previous) as f64;
        let cpu_secs = jiffies_delta / clock_ticks_per_sec();
        agentcore_core::clamp(cpu_secs / elapsed_secs * 100.0, 0.0, 100.0)
    }
}

impl Default for CpuSampler {
    fn default() -> Self {
        Self::new()
    }
}
