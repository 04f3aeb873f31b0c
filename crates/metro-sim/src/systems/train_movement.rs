//! Train kinematics along a line's stations.
//!
//! Open lines shuttle end to end, reversing at the terminals. Loop lines
//! wrap around. Each arrival triggers a station visit.

use std::time::Duration;

use glam::DVec2;

use metro_core::components::{Line, Train};
use metro_core::enums::{Direction, LineShape};
use metro_core::types::{StationId, TrainId};

use crate::systems::station_visit;
use crate::world::World;

/// Index of the stop after `at` and the direction of travel to reach it.
pub fn next_stop(at: usize, direction: Direction, len: usize, shape: LineShape) -> (usize, Direction) {
    match shape {
        LineShape::Loop => match direction {
            Direction::Forward => ((at + 1) % len, Direction::Forward),
            Direction::Backward => ((at + len - 1) % len, Direction::Backward),
        },
        LineShape::Open => {
            let direction = match direction {
                Direction::Forward if at + 1 >= len => Direction::Backward,
                Direction::Backward if at == 0 => Direction::Forward,
                d => d,
            };
            let next = match direction {
                Direction::Forward => at + 1,
                Direction::Backward => at - 1,
            };
            (next, direction)
        }
    }
}

/// Advance every train by one tick and visit the stations it reaches.
pub fn run(world: &mut World, tick: Duration) {
    let dt = tick.as_secs_f64();
    let trains: Vec<_> = world.trains.iter().map(|(&id, &e)| (id, e)).collect();
    for (id, entity) in trains {
        let arrivals = advance(world, id, entity, dt);
        for station in arrivals {
            station_visit::run(world, entity, station);
        }
    }
}

/// Move one train. Returns the stations reached, in order. A tick never
/// reaches more stops than the line has.
fn advance(world: &World, id: TrainId, entity: hecs::Entity, dt: f64) -> Vec<StationId> {
    let mut train = world.expect::<&mut Train>(entity);
    let line = world.expect::<&Line>(world.expect_line(train.line));
    let len = line.stations.len();

    let mut remaining = train.speed * dt;
    let mut arrivals = Vec::new();
    while remaining > 0.0 && arrivals.len() < len {
        let from = world.expect_position(line.stations[train.at]);
        let to = world.expect_position(line.stations[train.heading_to]);
        let left = (from.distance(to) - train.distance).max(0.0);
        if remaining < left {
            train.distance += remaining;
            break;
        }
        remaining -= left;

        let reached = train.heading_to;
        arrivals.push(line.stations[reached]);
        let (next, direction) = next_stop(reached, train.direction, len, line.shape);
        train.at = reached;
        train.heading_to = next;
        train.direction = direction;
        train.distance = 0.0;
    }
    if arrivals.len() == len {
        tracing::trace!(%id, "arrival cap reached this tick");
    }
    arrivals
}

/// Current map position of a train.
pub fn position(world: &World, train: &Train) -> DVec2 {
    let line = world.expect::<&Line>(world.expect_line(train.line));
    let from = world.expect_position(line.stations[train.at]);
    let to = world.expect_position(line.stations[train.heading_to]);
    let length = from.distance(to);
    if length <= f64::EPSILON {
        return from;
    }
    from.lerp(to, (train.distance / length).min(1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_line_reverses_at_terminals() {
        assert_eq!(next_stop(0, Direction::Forward, 3, LineShape::Open), (1, Direction::Forward));
        assert_eq!(next_stop(2, Direction::Forward, 3, LineShape::Open), (1, Direction::Backward));
        assert_eq!(next_stop(1, Direction::Backward, 3, LineShape::Open), (0, Direction::Backward));
        assert_eq!(next_stop(0, Direction::Backward, 3, LineShape::Open), (1, Direction::Forward));
    }

    #[test]
    fn two_station_open_line_shuttles() {
        assert_eq!(next_stop(1, Direction::Forward, 2, LineShape::Open), (0, Direction::Backward));
        assert_eq!(next_stop(0, Direction::Backward, 2, LineShape::Open), (1, Direction::Forward));
    }

    #[test]
    fn loop_line_wraps() {
        assert_eq!(next_stop(2, Direction::Forward, 3, LineShape::Loop), (0, Direction::Forward));
        assert_eq!(next_stop(0, Direction::Backward, 3, LineShape::Loop), (2, Direction::Backward));
    }
}
