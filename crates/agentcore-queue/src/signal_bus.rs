//! Signal Bus (C3) — pub/sub delivery of typed signals with subject filters.

use agentcore_core::{Priority, Signal, Source};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::warn;

pub type HandlerFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
pub type SignalHandler = Arc<dyn Fn(Signal) -> HandlerFuture + Send + Sync>;

#[derive(Clone, Debug, Default)]
pub struct SignalFilter {
    pub source: Option<Source>,
    pub channel: Option<String>,
    pub signal_type: Option<String>,
    /// Lower numeric value means higher priority; the signal must be at
    /// least this urgent to match (`signal.priority <= min_priority`).
    pub min_priority: Option<Priority>,
}

impl SignalFilter {
    fn matches(&self, signal: &Signal) -> bool {
        if let Some(source) = self.source {
            if source != signal.source {
                return false;
            }
        }
        if let Some(channel) = &self.channel {
            if Some(channel.as_str()) != signal.data.channel.as_deref() {
                return false;
            }
        }
        if let Some(signal_type) = &self.signal_type {
            if signal_type != &signal.signal_type {
                return false;
            }
        }
        if let Some(min_priority) = self.min_priority {
            if signal.priority > min_priority {
                return false;
            }
        }
        true
    }
}

struct Subscription {
    filter: SignalFilter,
    handler: SignalHandler,
}

#[derive(Default)]
pub struct SignalBus {
    subscriptions: HashMap<u64, Subscription>,
    next_id: AtomicU64,
}

impl SignalBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, filter: SignalFilter, handler: SignalHandler) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscriptions.insert(id, Subscription { filter, handler });
        id
    }

    pub fn unsubscribe(&mut self, sub_id: u64) -> bool {
        self.subscriptions.remove(&sub_id).is_some()
    }

    /// Starts every matching handler concurrently. Handler panics/failures
    /// are isolated: `publish` never fails and always returns the count of
    /// handlers invoked.
    pub async fn publish(&self, signal: Signal) -> usize {
        let matching: Vec<SignalHandler> = self
            .subscriptions
            .values()
            .filter(|sub| sub.filter.matches(&signal))
            .map(|sub| sub.handler.clone())
            .collect();

        let delivered = matching.len();
        let mut tasks = Vec::with_capacity(delivered);
        for handler in matching {
            let signal = signal.clone();
            tasks.push(tokio::spawn(async move { handler(signal).await }));
        }

        for task in tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "signal handler panicked");
            }
        }

        delivered
    }
}
