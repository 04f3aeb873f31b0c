//! Events exchanged between the simulation core and the presentation layer.
//!
//! Every event is its own type so the bus can route by type. `GameEvent`
//! wraps the outbound ones for buffering between ticks and serialization.

use std::time::Duration;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::types::{ElementOption, OfferId, Rect, StationId, TrainId};

// --- Outbound: core -> presentation ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapSizeSet {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterRegionsSet {
    pub regions: Vec<Rect>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationAppeared {
    pub station: StationId,
    pub station_type: StationType,
    pub position: DVec2,
    pub at: Duration,
}

/// A passenger started waiting at a station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassengerAdded {
    pub station: StationId,
    pub wanted: StationType,
}

/// A passenger left a station's waiting room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassengerRemoved {
    pub station: StationId,
    pub wanted: StationType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassengerBoarded {
    pub train: TrainId,
    pub station: StationId,
    pub wanted: StationType,
}

/// A passenger reached a station of the wanted type and left the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassengerAlighted {
    pub train: TrainId,
    pub station: StationId,
    pub wanted: StationType,
}

/// A station went over capacity; it fails once `grace` has elapsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationWarned {
    pub station: StationId,
    pub grace: Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationUnwarned {
    pub station: StationId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementChoiceOffered {
    pub offer: OfferId,
    pub options: Vec<ElementOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentRejected {
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEnded {
    pub reason: EndReason,
    pub at: Duration,
}

/// Any outbound event, in emission order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GameEvent {
    MapSizeSet(MapSizeSet),
    WaterRegionsSet(WaterRegionsSet),
    StationAppeared(StationAppeared),
    PassengerAdded(PassengerAdded),
    PassengerRemoved(PassengerRemoved),
    PassengerBoarded(PassengerBoarded),
    PassengerAlighted(PassengerAlighted),
    StationWarned(StationWarned),
    StationUnwarned(StationUnwarned),
    ElementChoiceOffered(ElementChoiceOffered),
    IntentRejected(IntentRejected),
    GameEnded(GameEnded),
}

// --- Inbound: presentation -> core ---

/// Start the clock and the simulation loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeStartEvent;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimePauseEvent;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeResumeEvent;

/// Change the speed multiplier. Negative values are clamped to 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSpeedChangeEvent {
    pub multiplier: f64,
}

/// The player quits. One-way.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GameExitEvent;
