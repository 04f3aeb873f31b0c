//! Snapshot system: copies the visible world state into a WorldSnapshot.
//!
//! This system is read-only; it never modifies the world.

use std::time::Duration;

use metro_core::components::*;
use metro_core::enums::*;
use metro_core::state::*;

use crate::systems::train_movement;
use crate::world::World;

/// Build a complete WorldSnapshot from the current world state.
pub fn build_snapshot(
    world: &World,
    time: Duration,
    state: LoopState,
    grace: Duration,
    end_reason: Option<EndReason>,
) -> WorldSnapshot {
    WorldSnapshot {
        time,
        state,
        map: world.map().clone(),
        stations: build_stations(world, time, grace),
        lines: build_lines(world),
        trains: build_trains(world),
        inventory: world.inventory(),
        offers: world
            .offers()
            .map(|(id, options)| OfferSnapshot {
                id,
                options: options.to_vec(),
            })
            .collect(),
        passengers_delivered: world.passengers_delivered(),
        end_reason,
    }
}

/// Stations in id order.
fn build_stations(world: &World, time: Duration, grace: Duration) -> Vec<StationSnapshot> {
    world
        .stations
        .values()
        .map(|&entity| {
            let station = world.expect::<&Station>(entity);
            let room = world.expect::<&WaitingRoom>(entity);
            StationSnapshot {
                id: station.id,
                station_type: station.station_type,
                position: world.expect::<&Position>(entity).0,
                waiting: room.passengers.iter().map(|p| p.wanted).collect(),
                effective_capacity: station.effective_capacity(),
                upgrade_level: station.upgrade_level,
                overcrowd_remaining: station
                    .overcrowded_since
                    .map(|since| grace.saturating_sub(time.saturating_sub(since))),
            }
        })
        .collect()
}

fn build_lines(world: &World) -> Vec<LineSnapshot> {
    world
        .lines
        .values()
        .map(|&entity| {
            let line = world.expect::<&Line>(entity);
            LineSnapshot {
                id: line.id,
                stations: line.stations.clone(),
                shape: line.shape,
                trains: line.trains.clone(),
            }
        })
        .collect()
}

fn build_trains(world: &World) -> Vec<TrainSnapshot> {
    world
        .trains
        .values()
        .map(|&entity| {
            let train = world.expect::<&Train>(entity);
            TrainSnapshot {
                id: train.id,
                line: train.line,
                position: train_movement::position(world, &train),
                direction: train.direction,
                cars: train.cars.len(),
                riders: train
                    .cars
                    .iter()
                    .flat_map(|c| c.passengers.iter().map(|p| p.wanted))
                    .collect(),
                capacity: train.cars.iter().map(|c| c.capacity).sum(),
            }
        })
        .collect()
}
