//! Time management for the simulation
//!
//! The simulation operates in discrete ticks. Every `validation_interval`
//! ticks the orchestrator runs an extra bounds-validation phase.
//! This module provides deterministic time advancement.

use serde::{Deserialize, Serialize};

use crate::core::config::ConfigError;

/// Manages simulation time in discrete ticks
///
/// # Example
/// ```
/// use settlement_sim_core::TimeManager;
///
/// let mut time = TimeManager::new(100); // validate every 100 ticks
/// assert_eq!(time.current_tick(), 0);
/// assert!(time.is_validation_tick());
///
/// time.advance_tick();
/// assert_eq!(time.current_tick(), 1);
/// assert!(!time.is_validation_tick());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeManager {
    /// Total ticks elapsed since simulation start
    current_tick: u64,
    /// Number of ticks between bounds-validation sweeps
    validation_interval: u64,
}

impl TimeManager {
    /// Create a new TimeManager starting at tick 0
    ///
    /// # Panics
    /// Panics if `validation_interval` is zero
    pub fn new(validation_interval: u64) -> Self {
        assert!(validation_interval > 0, "validation_interval must be positive");
        Self {
            current_tick: 0,
            validation_interval,
        }
    }

    /// Create a TimeManager positioned at an arbitrary tick (checkpoint resume)
    ///
    /// # Example
    /// ```
    /// use settlement_sim_core::TimeManager;
    ///
    /// let time = TimeManager::starting_at(200, 100).unwrap();
    /// assert_eq!(time.current_tick(), 200);
    /// assert!(time.is_validation_tick());
    /// assert!(TimeManager::starting_at(200, 0).is_err());
    /// ```
    pub fn starting_at(tick: u64, validation_interval: u64) -> Result<Self, ConfigError> {
        if validation_interval == 0 {
            return Err(ConfigError::Invalid(
                "validation_interval must be > 0".to_string(),
            ));
        }
        Ok(Self {
            current_tick: tick,
            validation_interval,
        })
    }

    /// Advance time by one tick
    pub fn advance_tick(&mut self) {
        self.current_tick += 1;
    }

    /// Get the current tick (total ticks since start)
    pub fn current_tick(&self) -> u64 {
        self.current_tick
    }

    /// Whether the current tick runs the bounds-validation sweep
    ///
    /// True when `tick mod validation_interval == 0`, so tick 0 validates too.
    pub fn is_validation_tick(&self) -> bool {
        self.current_tick % self.validation_interval == 0
    }

    /// Get the validation interval
    pub fn validation_interval(&self) -> u64 {
        self.validation_interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "validation_interval must be positive")]
    fn test_zero_validation_interval_panics() {
        TimeManager::new(0);
    }

    #[test]
    fn test_resume_with_zero_interval_is_a_config_error() {
        assert!(matches!(
            TimeManager::starting_at(40, 0),
            Err(ConfigError::Invalid(_))
        ));
        let time = TimeManager::starting_at(40, 20).unwrap();
        assert!(time.is_validation_tick());
    }
}
