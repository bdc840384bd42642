//! Configuration module - environment variable parsing

use std::env;
use std::str::FromStr;

/// Movement step sizes for discrete directional input
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementConfig {
    /// Units moved per step while on foot
    pub foot_step: f32,
    /// Units moved per step while driving
    pub vehicle_step: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            foot_step: 4.0,
            vehicle_step: 8.0,
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Seed for the simulation RNG
    pub seed: u64,
    /// Step sizes for directional movement
    pub movement: MovementConfig,
    /// Physics ticks between published snapshots
    pub snapshot_interval_ticks: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = MovementConfig::default();

        let config = Self {
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            seed: parse_var("GAME_SEED")?.unwrap_or_else(rand::random),
            movement: MovementConfig {
                foot_step: parse_var("FOOT_STEP")?.unwrap_or(defaults.foot_step),
                vehicle_step: parse_var("VEHICLE_STEP")?.unwrap_or(defaults.vehicle_step),
            },
            snapshot_interval_ticks: parse_var("SNAPSHOT_INTERVAL_TICKS")?.unwrap_or(2),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let step_ok = |step: f32| step.is_finite() && step > 0.0;
        if !step_ok(self.movement.foot_step) {
            return Err(ConfigError::Invalid("FOOT_STEP"));
        }
        if !step_ok(self.movement.vehicle_step) {
            return Err(ConfigError::Invalid("VEHICLE_STEP"));
        }
        if self.snapshot_interval_ticks == 0 {
            return Err(ConfigError::Invalid("SNAPSHOT_INTERVAL_TICKS"));
        }
        Ok(())
    }
}

/// Read an optional variable, failing only when it is present but malformed
fn parse_var<T: FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(None),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
