//! Fixed-size ring buffer of lag samples with on-demand p99.

const CAPACITY: usize = 256;

pub struct LagHistogram {
    samples: [f64; CAPACITY],
    len: usize,
    next: usize,
}

impl LagHistogram {
    pub fn new() -> Self {
        Self { samples: [0.0; CAPACITY], len: 0, next: 0 }
    }

    pub fn record(&mut self, lag_ms: f64) {
        self.samples[self.next] = lag_ms;
        self.next = (self.next + 1) % CAPACITY;
        if self.len < CAPACITY {
            self.len += 1;
        }
    }

    /// p99 over the samples currently held. Empty histogram reports 0.0.
    pub fn p99(&self) -> f64 {
        if self.len == 0 {
            return 0.0;
        }
        let mut sorted: Vec<f64> = self.samples[..self.len].to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let idx = ((sorted.len() as f64) * 0.99).ceil() as usize;
        let idx = idx.saturating_sub(1).min(sorted.len() - 1);
        sorted[idx]
    }
}

impl Default for LagHistogram {
    fn default() -> Self {
        Self::new()
    }
}
