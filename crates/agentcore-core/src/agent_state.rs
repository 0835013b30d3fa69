//! The scalar state neurons observe and the aggregation layer reasons about.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentState {
    pub alertness: f64,
    pub contact_pressure: f64,
    pub social_debt: f64,
    pub energy: f64,
    /// Named scalar series for neurons that watch something not otherwise
    /// promoted to a first-class field (e.g. `PatternBreakNeuron`'s target metric).
    pub metrics: HashMap<String, f64>,
}

impl Default for AgentState {
    fn default() -> Self {
        Self {
            alertness: 1.0,
            contact_pressure: 0.0,
            social_debt: 0.0,
            energy: 1.0,
            metrics: HashMap::new(),
        }
    }
}
