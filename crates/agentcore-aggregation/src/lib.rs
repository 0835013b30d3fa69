//! Aggregation layer (C7) and ack registry (C8) — bounded wake decisions
//! over raw signals.

pub mod ack_registry;
pub mod aggregation;
pub mod config;

pub use ack_registry::{Ack, AckDecision, AckRegistry, AckType, DEFAULT_OVERRIDE_DELTA};
pub use aggregation::{AggregationLayer, WakeReason, WakeResult};
pub use config::WakeConfig;
