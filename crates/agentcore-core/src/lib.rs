//! agentcore-core - shared primitive types and the stable error taxonomy
//! used by every layer of the cognitive core.

pub mod agent_state;
pub mod error;
pub mod event;
pub mod signal;
pub mod types;

pub use agent_state::AgentState;
pub use error::{CoreError, Result};
pub use event::{Event, EventMeta};
pub use signal::{Signal, SignalAggregate, SignalData, SignalMetrics};
pub use types::*;
