//! Simulation constants and tuning parameters.

use std::time::Duration;

// --- Time ---

/// Scaled milliseconds per logical tick.
pub const TICK_RESOLUTION_MS: u64 = 10;

/// Fixed logical step of the simulation.
pub const TICK_RESOLUTION: Duration = Duration::from_millis(TICK_RESOLUTION_MS);

/// Default wall-clock delay between two evaluation passes.
pub const DEFAULT_REFRESH_DELAY: Duration = Duration::from_millis(15);

/// Upper bound of the speed multiplier. Lower bound is 0 (paused).
pub const MAX_SPEED_MULTIPLIER: f64 = 8.0;

/// Number of ticks caught up in a single pass above which the host is
/// considered to have stalled.
pub const DRIFT_WARN_TICKS: u64 = 100;

// --- Stations ---

/// Waiting passengers a station holds per upgrade level.
pub const STATION_CAPACITY: usize = 6;

/// Upgrade level of a freshly created station.
pub const INITIAL_UPGRADE_LEVEL: u32 = 1;

/// How long a station may stay overcrowded before the session is lost.
pub const OVERCROWD_GRACE: Duration = Duration::from_secs(45);

/// Shortest delay between two passenger spawns at one station.
pub const PASSENGER_SPAWN_MIN: Duration = Duration::from_secs(4);

/// Longest delay between two passenger spawns at one station.
pub const PASSENGER_SPAWN_MAX: Duration = Duration::from_secs(12);

// --- Lines ---

/// Minimum stations on an open line.
pub const MIN_OPEN_LINE_STATIONS: usize = 2;

/// Minimum stations on a looped line.
pub const MIN_LOOP_LINE_STATIONS: usize = 3;

// --- Trains ---

/// Train speed in map units per second of scaled time.
pub const TRAIN_SPEED: f64 = 120.0;

/// Maximum cars a train can pull.
pub const TRAIN_CAR_SLOTS: usize = 4;

/// Passengers one car carries.
pub const CAR_CAPACITY: usize = 6;

/// Cars a train comes with when first assigned to a line.
pub const INITIAL_TRAIN_CARS: usize = 1;
