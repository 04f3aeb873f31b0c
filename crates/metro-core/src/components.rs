//! ECS components for hecs entities.
//!
//! Components are plain data structs. Game logic lives in systems; the only
//! methods here compute values derived from a component's own fields.

use std::collections::VecDeque;
use std::time::Duration;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::types::{LineId, StationId, TrainId, TunnelId};

/// Map position of a station.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Position(pub DVec2);

/// A rider. Owned by exactly one station waiting room or one car at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passenger {
    /// Shape of the station this passenger wants to reach.
    pub wanted: StationType,
    /// Scaled time at which the passenger appeared.
    pub spawn_time: Duration,
}

/// Station identity and capacity state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Station {
    pub id: StationId,
    pub station_type: StationType,
    /// Waiting passengers tolerated per upgrade level.
    pub capacity: usize,
    pub upgrade_level: u32,
    /// Set while the waiting room is over capacity.
    pub overcrowded_since: Option<Duration>,
}

impl Station {
    /// Waiting count above which the station is overcrowded.
    pub fn effective_capacity(&self) -> usize {
        self.capacity * self.upgrade_level as usize
    }
}

/// Passengers waiting at a station, oldest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WaitingRoom {
    pub passengers: VecDeque<Passenger>,
}

/// When the station produces its next passenger.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PassengerSpawner {
    pub next_spawn_at: Duration,
}

/// A player-built route over stations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Line {
    pub id: LineId,
    pub stations: Vec<StationId>,
    pub shape: LineShape,
    pub trains: Vec<TrainId>,
}

/// A bounded passenger container pulled by a train.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PassengerCar {
    pub capacity: usize,
    pub passengers: Vec<Passenger>,
}

impl PassengerCar {
    pub fn has_room(&self) -> bool {
        self.passengers.len() < self.capacity
    }
}

/// Train state. Position is expressed as progress along the segment from
/// `line.stations[at]` to `line.stations[heading_to]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Train {
    pub id: TrainId,
    pub line: LineId,
    /// Index in the line of the last station reached.
    pub at: usize,
    /// Index in the line of the station being approached.
    pub heading_to: usize,
    pub direction: Direction,
    /// Map units travelled since leaving `at`.
    pub distance: f64,
    /// Map units per second of scaled time.
    pub speed: f64,
    /// Maximum number of cars.
    pub car_slots: usize,
    pub cars: Vec<PassengerCar>,
}

/// Marks the straight segment between two stations as crossing water.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Tunnel {
    pub id: TunnelId,
    pub from: StationId,
    pub to: StationId,
}

impl Tunnel {
    /// Tunnels are undirected.
    pub fn connects(&self, a: StationId, b: StationId) -> bool {
        (self.from == a && self.to == b) || (self.from == b && self.to == a)
    }
}
