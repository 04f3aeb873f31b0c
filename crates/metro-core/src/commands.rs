//! Player intents sent from the presentation layer to the simulation.
//!
//! Intents are validated against the World before anything changes; a
//! rejected intent leaves the simulation untouched.

use serde::{Deserialize, Serialize};

use crate::enums::LineShape;
use crate::types::{LineId, OfferId, StationId, TrainId, TunnelId};

/// All possible player mutations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlayerIntent {
    /// Draw a new line through the given stations. Consumes a line.
    CreateLine {
        stations: Vec<StationId>,
        shape: LineShape,
    },
    /// Put a new train on a line. Consumes a train.
    AssignTrain { line: LineId },
    /// Move an existing train to another line.
    ReassignTrain { train: TrainId, line: LineId },
    /// Attach a car to a train. Consumes a passenger car.
    AddPassengerCar { train: TrainId },
    /// Dig a tunnel under water between two stations. Consumes a tunnel.
    AddTunnel { from: StationId, to: StationId },
    /// Enlarge a station. Consumes a station upgrade.
    UpgradeStation { station: StationId },
    /// Accept one option of a pending element-choice offer.
    ChooseElement { offer: OfferId, option: usize },
}

/// What an accepted intent produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum IntentOutcome {
    LineCreated { line: LineId },
    TrainAssigned { train: TrainId },
    TrainReassigned { train: TrainId, line: LineId },
    CarAdded { train: TrainId, cars: usize },
    TunnelBuilt { tunnel: TunnelId },
    StationUpgraded { station: StationId, level: u32 },
    ElementChosen { offer: OfferId },
}
