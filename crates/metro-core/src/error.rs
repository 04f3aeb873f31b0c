//! Errors reported back to the requester of a player intent.

use crate::enums::ElementKind;
use crate::types::{LineId, OfferId, StationId, TrainId};

/// A rejected player intent. The World is left unchanged.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MutationError {
    #[error("unknown {0}")]
    UnknownStation(StationId),

    #[error("unknown {0}")]
    UnknownLine(LineId),

    #[error("unknown {0}")]
    UnknownTrain(TrainId),

    #[error("unknown {0}")]
    UnknownOffer(OfferId),

    #[error("{offer} has no option {option}")]
    UnknownOption { offer: OfferId, option: usize },

    #[error("no {0:?} left")]
    InsufficientResources(ElementKind),

    #[error("a line needs at least {required} stations, got {got}")]
    LineTooShort { required: usize, got: usize },

    #[error("{0} appears twice in a row or more than once on the line")]
    RepeatedStation(StationId),

    #[error("segment {from} -> {to} crosses water without a tunnel")]
    CrossesWater { from: StationId, to: StationId },

    #[error("segment {from} -> {to} does not cross water")]
    TunnelNotNeeded { from: StationId, to: StationId },

    #[error("a tunnel already joins {from} and {to}")]
    TunnelExists { from: StationId, to: StationId },

    #[error("{0} has no free car slot")]
    TrainFull(TrainId),

    #[error("{train} already runs on {line}")]
    SameLine { train: TrainId, line: LineId },

    #[error("passengers at {0} cannot want its own type")]
    WrongDestination(StationId),

    #[error("the game has ended")]
    GameEnded,
}
