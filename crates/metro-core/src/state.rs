//! World snapshot: an immutable copy of the visible state handed to the
//! presentation layer after an evaluation pass.

use std::time::Duration;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::types::{ElementOption, Inventory, LineId, OfferId, Rect, StationId, TrainId};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Scaled time up to which ticks have been processed.
    pub time: Duration,
    pub state: LoopState,
    pub map: MapView,
    pub stations: Vec<StationSnapshot>,
    pub lines: Vec<LineSnapshot>,
    pub trains: Vec<TrainSnapshot>,
    pub inventory: Inventory,
    pub offers: Vec<OfferSnapshot>,
    pub passengers_delivered: u64,
    pub end_reason: Option<EndReason>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapView {
    pub width: f64,
    pub height: f64,
    pub water: Vec<Rect>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationSnapshot {
    pub id: StationId,
    pub station_type: StationType,
    pub position: DVec2,
    /// Wanted type of each waiting passenger, oldest first.
    pub waiting: Vec<StationType>,
    pub effective_capacity: usize,
    pub upgrade_level: u32,
    /// Time left before failure while overcrowded.
    pub overcrowd_remaining: Option<Duration>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineSnapshot {
    pub id: LineId,
    pub stations: Vec<StationId>,
    pub shape: LineShape,
    pub trains: Vec<TrainId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainSnapshot {
    pub id: TrainId,
    pub line: LineId,
    pub position: DVec2,
    pub direction: Direction,
    pub cars: usize,
    /// Wanted type of each rider, car by car.
    pub riders: Vec<StationType>,
    pub capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferSnapshot {
    pub id: OfferId,
    pub options: Vec<ElementOption>,
}
