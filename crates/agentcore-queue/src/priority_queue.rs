//! Priority Event Queue (C1) — five FIFO sub-queues, aggregation, and pruning.

use agentcore_core::{Event, Priority};
use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;

#[derive(Clone, Copy, Debug)]
pub struct PruneConfig {
    pub max_age_ms: i64,
    pub max_priority_to_drop: Priority,
    pub emergency_threshold: Option<usize>,
}

impl Default for PruneConfig {
    fn default() -> Self {
        Self {
            max_age_ms: 300_000,
            max_priority_to_drop: Priority::Low,
            emergency_threshold: None,
        }
    }
}

pub struct PriorityEventQueue {
    sub_queues: [VecDeque<Event>; 5],
    aggregation_window_ms: i64,
}

impl PriorityEventQueue {
    pub fn new(aggregation_window_ms: u64) -> Self {
        Self {
            sub_queues: std::array::from_fn(|_| VecDeque::new()),
            aggregation_window_ms: aggregation_window_ms as i64,
        }
    }

    pub fn push(&mut self, event: Event) {
        self.sub_queues[event.priority.as_index()].push_back(event);
    }

    /// Scans CRITICAL downward and returns the first non-empty head.
    pub fn pull(&mut self) -> Option<Event> {
        for q in self.sub_queues.iter_mut() {
            if let Some(e) = q.pop_front() {
                return Some(e);
            }
        }
        None
    }

    pub fn peek(&self) -> Option<&Event> {
        self.sub_queues.iter().find_map(|q| q.front())
    }

    pub fn size(&self) -> usize {
        self.sub_queues.iter().map(|q| q.len()).sum()
    }

    pub fn size_by_priority(&self) -> [usize; 5] {
        let mut sizes = [0usize; 5];
        for (i, q) in self.sub_queues.iter().enumerate() {
            sizes[i] = q.len();
        }
        sizes
    }

    pub fn clear(&mut self) {
        for q in self.sub_queues.iter_mut() {
            q.clear();
        }
    }

    /// Merges events with identical `(source, channel, type)` whose
    /// timestamps fall within the aggregation window, within each
    /// sub-queue independently. Returns the number removed.
    pub fn aggregate(&mut self) -> usize {
        let window = Duration::milliseconds(self.aggregation_window_ms);
        let mut removed = 0;

        for q in self.sub_queues.iter_mut() {
            let drained: Vec<Event> = q.drain(..).collect();
            let mut merged: Vec<Event> = Vec::with_capacity(drained.len());

            'next_event: for event in drained {
                for survivor in merged.iter_mut() {
                    let gap = if event.timestamp >= survivor.timestamp {
                        event.timestamp - survivor.timestamp
                    } else {
                        survivor.timestamp - event.timestamp
                    };
                    if survivor.aggregation_key() == event.aggregation_key() && gap <= window {
                        let meta = survivor.meta.get_or_insert_with(Default::default);
                        let prior_count = meta.aggregated_count.unwrap_or(1);
                        meta.aggregated_count = Some(prior_count + 1);
                        meta.first_occurrence.get_or_insert(survivor.timestamp);
                        removed += 1;
                        continue 'next_event;
                    }
                }
                merged.push(event);
            }

            *q = merged.into();
        }

        removed
    }

    /// Removes events older than `max_age_ms` from sub-queues with
    /// priority >= `max_priority_to_drop`; if the queue is still over
    /// `emergency_threshold` afterward, drops all IDLE then all LOW.
    pub fn prune(&mut self, cfg: &PruneConfig, now: DateTime<Utc>) -> usize {
        let mut removed = 0;
        let max_age = Duration::milliseconds(cfg.max_age_ms);

        for priority in Priority::ALL {
            if priority < cfg.max_priority_to_drop {
                continue;
            }
            let q = &mut self.sub_queues[priority.as_index()];
            let before = q.len();
            q.retain(|e| now - e.timestamp <= max_age);
            removed += before - q.len();
        }

        if let Some(threshold) = cfg.emergency_threshold {
            for priority in [Priority::Idle, Priority::Low] {
                if self.size() <= threshold {
                    break;
                }
                let q = &mut self.sub_queues[priority.as_index()];
                removed += q.len();
                q.clear();
            }
        }

        removed
    }
}
