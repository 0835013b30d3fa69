//! Neuron registry: dynamic registration applied at the start of each
//! `process()`, `checkAll`, and the required-neuron startup guard.

use crate::neuron::Neuron;
use crate::stock::ALERTNESS_NEURON_ID;
use agentcore_core::{CorrelationId, CoreError, Result, Signal};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::error;

enum PendingChange {
    Register(Arc<dyn Neuron>),
    Unregister(String),
}

#[derive(Default)]
pub struct NeuronRegistry {
    neurons: HashMap<String, Arc<dyn Neuron>>,
    pending: Vec<PendingChange>,
}

impl NeuronRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a registration; applied at the start of the next `process()`.
    pub fn register_neuron(&mut self, neuron: Arc<dyn Neuron>) {
        self.pending.push(PendingChange::Register(neuron));
    }

    pub fn unregister_neuron(&mut self, id: impl Into<String>) {
        self.pending.push(PendingChange::Unregister(id.into()));
    }

    /// Applies queued registration changes immediately (used at init, and
    /// by `process` at the top of each tick).
    pub fn apply_pending_changes(&mut self) {
        for change in self.pending.drain(..) {
            match change {
                PendingChange::Register(neuron) => {
                    self.neurons.insert(neuron.id().to_string(), neuron);
                }
                PendingChange::Unregister(id) => {
                    self.neurons.remove(&id);
                }
            }
        }
    }

    /// Must be called once after initial plugin load; absence of the
    /// required `AlertnessNeuron` is a fatal startup error.
    pub fn validate_required_neurons(&self) -> Result<()> {
        if self.neurons.contains_key(ALERTNESS_NEURON_ID) {
            Ok(())
        } else {
            Err(CoreError::validation_failed("required neuron 'alertness' is not registered"))
        }
    }

    /// Runs every registered neuron against its named value in `values`,
    /// isolating per-neuron errors (a panic-caught check never aborts the
    /// pass — Rust has no cross-thread recoverable panic here, so we treat
    /// a missing value as a logged skip instead of invoking `check`).
    pub fn check_all(
        &self,
        values: &HashMap<String, f64>,
        alertness: f64,
        now: DateTime<Utc>,
        correlation_id: CorrelationId,
    ) -> Vec<Signal> {
        let mut signals = Vec::new();
        for neuron in self.neurons.values() {
            let Some(&value) = values.get(neuron.signal_type()) else {
                continue;
            };
            match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                neuron.check(value, alertness, now, correlation_id)
            })) {
                Ok(Some(signal)) => signals.push(signal),
                Ok(None) => {}
                Err(_) => error!(neuron = neuron.id(), "neuron check panicked; skipping"),
            }
        }
        signals
    }

    pub fn len(&self) -> usize {
        self.neurons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neurons.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stock::AlertnessNeuron;

    #[test]
    fn required_neuron_validation_fails_when_absent() {
        let registry = NeuronRegistry::new();
        assert!(registry.validate_required_neurons().is_err());
    }

    #[test]
    fn required_neuron_validation_succeeds_after_registration() {
        let mut registry = NeuronRegistry::new();
        registry.register_neuron(Arc::new(AlertnessNeuron::default()));
        registry.apply_pending_changes();
        assert!(registry.validate_required_neurons().is_ok());
    }

    #[test]
    fn unregister_removes_neuron() {
        let mut registry = NeuronRegistry::new();
        registry.register_neuron(Arc::new(AlertnessNeuron::default()));
        registry.apply_pending_changes();
        assert_eq!(registry.len(), 1);
        registry.unregister_neuron(ALERTNESS_NEURON_ID);
        registry.apply_pending_changes();
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn check_all_skips_neurons_without_a_value() {
        let mut registry = NeuronRegistry::new();
        registry.register_neuron(Arc::new(AlertnessNeuron::default()));
        registry.apply_pending_changes();
        let values = HashMap::new();
        let signals = registry.check_all(&values, 1.0, Utc::now(), CorrelationId::new());
        assert!(signals.is_empty());
    }
}
