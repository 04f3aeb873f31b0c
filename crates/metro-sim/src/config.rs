//! Simulation tuning. Defaults come from `metro_core::constants`.

use std::time::Duration;

use metro_core::constants::*;

/// Range from which each station draws the delay until its next passenger.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnInterval {
    pub min: Duration,
    pub max: Duration,
}

/// Configuration for starting a new simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    /// RNG seed for determinism. Same seed = same simulation.
    pub seed: u64,
    /// Scaled time covered by one logical tick.
    pub tick_resolution: Duration,
    /// Wall-clock delay between evaluation passes in `run`.
    pub refresh_delay: Duration,
    /// Clock speed multiplier, applied when the loop is built.
    pub speed: f64,
    pub overcrowd_grace: Duration,
    pub station_capacity: usize,
    pub train_speed: f64,
    pub train_car_slots: usize,
    pub car_capacity: usize,
    /// `None` disables passenger generation.
    pub passenger_spawn: Option<SpawnInterval>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            tick_resolution: TICK_RESOLUTION,
            refresh_delay: DEFAULT_REFRESH_DELAY,
            speed: 1.0,
            overcrowd_grace: OVERCROWD_GRACE,
            station_capacity: STATION_CAPACITY,
            train_speed: TRAIN_SPEED,
            train_car_slots: TRAIN_CAR_SLOTS,
            car_capacity: CAR_CAPACITY,
            passenger_spawn: Some(SpawnInterval {
                min: PASSENGER_SPAWN_MIN,
                max: PASSENGER_SPAWN_MAX,
            }),
        }
    }
}
