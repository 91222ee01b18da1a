use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Decay parameters for flow particles.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    /// Liveness removed per tick while the particle is inside the grid.
    pub decay_rate: f64,
    /// Liveness multiplier per tick once abandoned.
    pub abandon_decay_mult: f64,
    /// Particles with liveness below this are dead.
    pub dead_threshold: f64,
    /// Mean initial liveness.
    pub initial_liveness: f64,
    /// Relative spread of the initial liveness: `initial * (1 ± jitter / 2)`.
    pub liveness_jitter: f64,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            decay_rate: 1.0,
            abandon_decay_mult: 0.1,
            dead_threshold: 0.1,
            initial_liveness: 300.0,
            liveness_jitter: 0.4,
        }
    }
}

/// Settings for the flow animation loop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Particles alive at any time.
    pub num_particles: usize,
    /// Simulation ticks per second requested from the host loop.
    pub fps: f64,
    /// Euler step in normalized cell units per tick.
    pub time_step: f64,
    /// Particles travelling less than this (normalized) per tick are abandoned.
    pub min_travel: f64,
    /// Scale from map coordinates to pixels for trail output.
    pub pixel_scale: f64,
    /// Travel distance mapped to the darkest trail colour.
    pub min_flow: f64,
    /// Travel distance mapped to the brightest trail colour.
    pub max_flow: f64,
    pub particle: ParticleConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_particles: 1500,
            fps: 30.0,
            time_step: 0.1,
            min_travel: 0.001,
            pixel_scale: 1.0,
            min_flow: 0.0,
            max_flow: 1.0,
            particle: ParticleConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Milliseconds between ticks.
    pub fn frame_interval_ms(&self) -> f64 {
        1000.0 / self.fps
    }
}
