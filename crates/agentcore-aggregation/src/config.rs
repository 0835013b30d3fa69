//! Wake-rule thresholds (mirrors the `wake` section of the consolidated
//! `RuntimeConfig`; this crate doesn't own config loading, just the
//! threshold shape the wake rules are evaluated against).

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WakeConfig {
    pub contact_pressure_threshold: f64,
    pub social_debt_threshold: f64,
    pub low_energy_multiplier: f64,
    pub low_energy_level: f64,
    pub ack_override_delta: f64,
}

impl Default for WakeConfig {
    fn default() -> Self {
        Self {
            contact_pressure_threshold: 0.35,
            social_debt_threshold: 0.5,
            low_energy_multiplier: 1.3,
            low_energy_level: 0.3,
            ack_override_delta: crate::ack_registry::DEFAULT_OVERRIDE_DELTA,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ack_override_delta_matches_pinned_constant() {
        assert_eq!(WakeConfig::default().ack_override_delta, 0.25);
    }
}
