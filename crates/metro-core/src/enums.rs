//! Enumeration types used throughout the simulation.

use serde::{Deserialize, Serialize};

/// Shape of a station. Passengers want to travel to a shape, not a station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StationType {
    Circle,
    Triangle,
    Square,
    Cross,
    Diamond,
    Star,
}

impl StationType {
    pub const ALL: [StationType; 6] = [
        StationType::Circle,
        StationType::Triangle,
        StationType::Square,
        StationType::Cross,
        StationType::Diamond,
        StationType::Star,
    ];
}

/// Whether a line ends at both extremities or wraps around.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineShape {
    /// Trains reverse at either end.
    #[default]
    Open,
    /// The last station connects back to the first.
    Loop,
}

/// Travel direction of a train along its line's station order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl Direction {
    pub fn reversed(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }
}

/// Resources the player spends on the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    Line,
    Train,
    PassengerCar,
    Tunnel,
    StationUpgrade,
}

/// Simulation loop state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopState {
    /// Constructed, clock not started yet.
    #[default]
    Stopped,
    Running,
    Paused,
    /// Terminal. No further mutation happens.
    Ended,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EndReason {
    /// The player left the game.
    Exit,
    /// A station stayed overcrowded past the grace period.
    Overcrowded { station: crate::types::StationId },
}
