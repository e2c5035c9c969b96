//! Externally supplied grading constants.
//!
//! Every limit and point value used by [`grade`](crate::grade::grade) lives
//! here. All structs deserialize with `#[serde(default)]`, so a partial JSON
//! file only overrides the fields it names.

use gauntlet_engine::{GridLimits, SearchBudget};
use serde::{Deserialize, Serialize};

/// Complete configuration of one grading run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradingConfig {
    pub limits: GridLimits,
    pub budget: SearchBudget,
    pub weights: ScoringWeights,
}

/// Point values and ceilings of each score component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Points per doubling of the grid area.
    pub ambition_per_doubling: f64,

    pub teleport_pair_points: f64,
    pub teleport_cap: f64,
    pub switch_points: f64,
    pub switch_cap: f64,
    pub cond_door_points: f64,
    pub cond_door_cap: f64,

    /// Points per link of the longest key/door chain.
    pub chain_link_points: f64,
    pub decision_point_points: f64,
    pub route_complexity_cap: f64,

    pub bonus_exit_points: f64,
    pub bonus_cap: f64,

    pub completion_points: f64,

    pub path_efficiency_cap: f64,
    /// Moves-to-area ratio that earns the full path efficiency score.
    pub path_efficiency_peak: f64,

    /// Multiplier of the square root of the trap count.
    pub danger_scale: f64,
    pub danger_cap: f64,

    /// Partial credit when the end is reached by no path.
    pub proximity_cap: f64,

    /// Total assigned to grids that fail validation.
    pub invalid_penalty: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            ambition_per_doubling: 100.0,
            teleport_pair_points: 15.0,
            teleport_cap: 60.0,
            switch_points: 20.0,
            switch_cap: 80.0,
            cond_door_points: 30.0,
            cond_door_cap: 90.0,
            chain_link_points: 50.0,
            decision_point_points: 5.0,
            route_complexity_cap: 200.0,
            bonus_exit_points: 75.0,
            bonus_cap: 225.0,
            completion_points: 50.0,
            path_efficiency_cap: 50.0,
            path_efficiency_peak: 0.3,
            danger_scale: 10.0,
            danger_cap: 30.0,
            proximity_cap: 25.0,
            invalid_penalty: -100.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: GradingConfig = serde_json::from_str(
            r#"{ "limits": { "max_edge": 16 }, "weights": { "completion_points": 10.0 } }"#,
        )
        .unwrap();
        assert_eq!(config.limits.max_edge, 16);
        assert_eq!(config.budget, SearchBudget::default());
        assert!((config.weights.completion_points - 10.0).abs() < f64::EPSILON);
        assert!((config.weights.bonus_cap - 225.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = GradingConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: GradingConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
