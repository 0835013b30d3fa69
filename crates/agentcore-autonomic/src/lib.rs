//! AUTONOMIC layer (C5) and signal filter pipeline (C6).

pub mod filter;
pub mod neuron;
pub mod registry;
pub mod stock;

pub use filter::{FilterContext, FilterRegistry, SignalFilterStage, ExpiryFilter, PriorityEscalationFilter};
pub use neuron::{NamedThreshold, Neuron, NeuronConfig, ScalarNeuron};
pub use registry::NeuronRegistry;
pub use stock::{contact_pressure_neuron, social_debt_neuron, AlertnessNeuron, PatternBreakNeuron, ALERTNESS_NEURON_ID};
