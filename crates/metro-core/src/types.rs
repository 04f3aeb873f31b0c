//! Fundamental geometric types and entity identifiers.

use std::fmt;

use glam::DVec2;
use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, " #{}"), self.0)
            }
        }
    };
}

entity_id!(
    /// Stable identifier of a station. Never reused within a session.
    StationId,
    "station"
);
entity_id!(
    /// Stable identifier of a line.
    LineId,
    "line"
);
entity_id!(
    /// Stable identifier of a train.
    TrainId,
    "train"
);
entity_id!(TunnelId, "tunnel");
entity_id!(
    /// Identifier of an element-choice offer waiting for the player.
    OfferId,
    "offer"
);

/// Axis-aligned rectangle in map coordinates (x right, y down).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build from two opposite corners, in any order.
    pub fn from_corners(a: DVec2, b: DVec2) -> Self {
        let min = a.min(b);
        let max = a.max(b);
        Self::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    pub fn min(&self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }

    pub fn max(&self) -> DVec2 {
        DVec2::new(self.x + self.width, self.y + self.height)
    }

    /// Whether the point lies inside or on the border.
    pub fn contains(&self, point: DVec2) -> bool {
        let (min, max) = (self.min(), self.max());
        point.x >= min.x && point.x <= max.x && point.y >= min.y && point.y <= max.y
    }

    /// Whether the closed segment `a`-`b` touches the rectangle.
    ///
    /// Liang-Barsky clipping: the segment is clipped against each slab and
    /// intersects iff the remaining parameter interval is non-empty.
    pub fn intersects_segment(&self, a: DVec2, b: DVec2) -> bool {
        let d = b - a;
        let (min, max) = (self.min(), self.max());
        let mut t0 = 0.0_f64;
        let mut t1 = 1.0_f64;

        let slabs = [
            (-d.x, a.x - min.x),
            (d.x, max.x - a.x),
            (-d.y, a.y - min.y),
            (d.y, max.y - a.y),
        ];
        for (p, q) in slabs {
            if p == 0.0 {
                // Parallel to this slab: outside means no hit at all.
                if q < 0.0 {
                    return false;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return false;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return false;
                }
                t1 = t1.min(r);
            }
        }
        t0 <= t1
    }
}

/// Resources available to the player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    pub lines: u32,
    pub trains: u32,
    pub passenger_cars: u32,
    pub tunnels: u32,
    pub station_upgrades: u32,
}

impl Inventory {
    pub fn count(&self, kind: crate::enums::ElementKind) -> u32 {
        use crate::enums::ElementKind::*;
        match kind {
            Line => self.lines,
            Train => self.trains,
            PassengerCar => self.passenger_cars,
            Tunnel => self.tunnels,
            StationUpgrade => self.station_upgrades,
        }
    }

    pub fn count_mut(&mut self, kind: crate::enums::ElementKind) -> &mut u32 {
        use crate::enums::ElementKind::*;
        match kind {
            Line => &mut self.lines,
            Train => &mut self.trains,
            PassengerCar => &mut self.passenger_cars,
            Tunnel => &mut self.tunnels,
            StationUpgrade => &mut self.station_upgrades,
        }
    }
}

/// One choice of an element-choice offer: `weight` units of `element`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementOption {
    pub element: crate::enums::ElementKind,
    pub weight: u32,
}
