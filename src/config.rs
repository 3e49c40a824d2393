use crate::error::SimError;
use crate::pixel::Channel;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Environment switch selecting the smaller demo profile.
pub const DEMO_ENV_VAR: &str = "PIXEL_WORLD_DEMO";

/// Probabilities and noise amplitudes used when a species reproduces.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MutationRates {
    /// Chance that a reproduction event produces a new species at all.
    pub species: f64,
    /// Given a new species, chance its whole behaviour table is perturbed.
    pub behaviour: f64,
    /// Given a new species, chance one body pixel changes colour.
    pub pixel: f64,
    /// Given a new species, chance of a body-size change. Rolled but currently inert.
    pub body_size: f64,
    pub base_attraction_noise: f64,
    pub distance_coefficient_noise: f64,
    pub pixel_delta: u32,
}

impl Default for MutationRates {
    fn default() -> Self {
        Self {
            species: 0.2,
            behaviour: 0.8,
            pixel: 0.4,
            body_size: 0.1,
            base_attraction_noise: 0.5,
            distance_coefficient_noise: 0.01,
            pixel_delta: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub world_width: i32,
    pub world_height: i32,
    pub initial_organism_count: usize,
    pub founder_channel: Channel,
    pub founder_intensity: u32,
    pub initial_food_count: usize,
    pub food_channel: Channel,
    pub food_intensity: u32,
    /// Ticks between food injections; 0 disables injection.
    pub food_interval: u64,
    pub food_per_injection: usize,
    /// Chebyshev radius of the square each organism can see.
    pub vision_radius: i32,
    pub base_score: f64,
    pub momentum_bonus: f64,
    /// Food spent per unit of body mass on every move.
    pub movement_cost: f64,
    /// Intensity factor applied to a starved organism's body cells.
    pub corpse_decay: f64,
    pub mutation: MutationRates,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            world_width: 400,
            world_height: 200,
            initial_organism_count: 10,
            founder_channel: Channel::Red,
            founder_intensity: 180,
            initial_food_count: 5000,
            food_channel: Channel::Green,
            food_intensity: 50,
            food_interval: 10,
            food_per_injection: 50,
            vision_radius: 3,
            base_score: 1.0,
            momentum_bonus: 5.0,
            movement_cost: 0.005,
            corpse_decay: 0.5,
            mutation: MutationRates::default(),
        }
    }
}

impl SimulationConfig {
    pub fn demo() -> Self {
        Self {
            world_width: 120,
            world_height: 80,
            initial_organism_count: 20,
            initial_food_count: 800,
            food_per_injection: 20,
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, SimError> {
        let config: SimulationConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, SimError> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&contents)?;
        info!(path = %path.display(), "loaded simulation config");
        Ok(config)
    }

    /// Demo profile when `PIXEL_WORLD_DEMO=true`, default otherwise.
    pub fn from_env() -> Self {
        let demo_mode = std::env::var(DEMO_ENV_VAR).unwrap_or_default() == "true";
        let config = if demo_mode {
            Self::demo()
        } else {
            Self::default()
        };
        info!(demo_mode, ?config, "using built-in simulation config");
        config
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if self.world_width <= 0 || self.world_height <= 0 {
            return Err(SimError::InvalidConfig(format!(
                "world must have positive dimensions, got {}x{}",
                self.world_width, self.world_height
            )));
        }
        if self.vision_radius < 0 {
            return Err(SimError::InvalidConfig(
                "vision_radius must not be negative".to_string(),
            ));
        }
        let probabilities = [
            ("species", self.mutation.species),
            ("behaviour", self.mutation.behaviour),
            ("pixel", self.mutation.pixel),
            ("body_size", self.mutation.body_size),
        ];
        for (name, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(SimError::InvalidConfig(format!(
                    "mutation.{name} must be within 0..=1, got {value}"
                )));
            }
        }
        if !(self.corpse_decay >= 0.0 && self.movement_cost >= 0.0) {
            return Err(SimError::InvalidConfig(
                "corpse_decay and movement_cost must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_and_demo_are_valid() {
        SimulationConfig::default().validate().unwrap();
        SimulationConfig::demo().validate().unwrap();
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config =
            SimulationConfig::from_json_str(r#"{ "world_width": 32, "food_channel": "blue" }"#)
                .unwrap();
        assert_eq!(config.world_width, 32);
        assert_eq!(config.world_height, 200);
        assert_eq!(config.food_channel, Channel::Blue);
        assert_eq!(config.mutation, MutationRates::default());
    }

    #[test]
    fn test_rejects_bad_dimensions() {
        let err = SimulationConfig::from_json_str(r#"{ "world_height": 0 }"#).unwrap_err();
        assert!(matches!(err, SimError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_probability_out_of_range() {
        let mut config = SimulationConfig::default();
        config.mutation.pixel = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = SimulationConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, SimError::Json(_)));
    }
}
