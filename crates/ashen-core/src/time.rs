//! Simulation clock
//!
//! Turns raw frame deltas into scaled simulation time and a number of fixed
//! simulation steps. The rule engine only ever sees fixed steps.

use serde::{Deserialize, Serialize};

/// Errors raised by an invalid clock configuration
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TimeError {
    #[error("Fixed timestep must be positive, got {0}")]
    InvalidTimestep(f32),

    #[error("Time scale must not be negative, got {0}")]
    NegativeTimeScale(f32),
}

/// Configuration for simulation time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeConfig {
    /// How many simulated seconds pass per real second
    pub time_scale: f32,
    /// Length of one simulation step (in seconds)
    pub fixed_timestep: f32,
    /// Maximum delta time to prevent spiral of death
    pub max_delta_time: f32,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            fixed_timestep: 1.0 / 30.0,
            max_delta_time: 0.25,
        }
    }
}

impl TimeConfig {
    /// Check the configuration before building a clock from it
    pub fn validate(&self) -> Result<(), TimeError> {
        if self.fixed_timestep <= 0.0 {
            return Err(TimeError::InvalidTimestep(self.fixed_timestep));
        }
        if self.time_scale < 0.0 {
            return Err(TimeError::NegativeTimeScale(self.time_scale));
        }
        Ok(())
    }
}

/// Simulation time tracking
#[derive(Debug, Clone)]
pub struct GameTime {
    /// Configuration
    pub config: TimeConfig,
    /// Simulated seconds since start
    pub total_time: f64,
    /// Scaled delta of the last frame (clamped)
    pub delta_time: f32,
    /// Frame counter
    pub frame_count: u64,
    /// Number of fixed steps run so far
    pub step_count: u64,
    /// Whether the simulation is paused
    pub paused: bool,
    fixed_accumulator: f32,
}

impl Default for GameTime {
    fn default() -> Self {
        Self::new(TimeConfig::default())
    }
}

impl GameTime {
    /// Create a clock with a custom config
    pub fn new(config: TimeConfig) -> Self {
        Self {
            config,
            total_time: 0.0,
            delta_time: 0.0,
            frame_count: 0,
            step_count: 0,
            paused: false,
            fixed_accumulator: 0.0,
        }
    }

    /// Feed the raw delta of one host frame
    pub fn update(&mut self, raw_delta: f32) {
        self.frame_count += 1;

        if self.paused {
            self.delta_time = 0.0;
            return;
        }

        self.delta_time = raw_delta.clamp(0.0, self.config.max_delta_time) * self.config.time_scale;
        self.total_time += self.delta_time as f64;
        self.fixed_accumulator += self.delta_time;
    }

    /// Drain the accumulator, returning how many fixed steps to simulate this frame
    pub fn fixed_steps(&mut self) -> u32 {
        let mut steps = 0;
        while self.fixed_accumulator >= self.config.fixed_timestep {
            self.fixed_accumulator -= self.config.fixed_timestep;
            steps += 1;
        }
        self.step_count += steps as u64;
        steps
    }

    /// Length of one fixed step
    pub fn step(&self) -> f32 {
        self.config.fixed_timestep
    }

    /// Pause the simulation
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume the simulation
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Set the time scale (0.0 = frozen, 1.0 = normal, 2.0 = double speed)
    pub fn set_time_scale(&mut self, scale: f32) {
        self.config.time_scale = scale.max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_steps_accumulate() {
        let mut time = GameTime::new(TimeConfig {
            time_scale: 1.0,
            fixed_timestep: 0.1,
            max_delta_time: 1.0,
        });

        time.update(0.25);
        assert_eq!(time.fixed_steps(), 2);
        time.update(0.06);
        assert_eq!(time.fixed_steps(), 1);
        assert_eq!(time.step_count, 3);
    }

    #[test]
    fn test_pause_and_clamp() {
        let mut time = GameTime::default();
        time.update(5.0);
        assert!((time.delta_time - 0.25).abs() < 1e-6);

        time.pause();
        time.update(0.016);
        assert_eq!(time.delta_time, 0.0);
        assert_eq!(time.frame_count, 2);
    }

    #[test]
    fn test_validate() {
        let mut config = TimeConfig::default();
        assert!(config.validate().is_ok());
        config.fixed_timestep = 0.0;
        assert_eq!(config.validate(), Err(TimeError::InvalidTimestep(0.0)));
    }
}
