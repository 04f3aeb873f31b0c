//! Passenger generation: each station with a spawner produces one passenger
//! at a randomized interval, wanting a type present elsewhere on the map.

use std::collections::BTreeSet;
use std::time::Duration;

use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use metro_core::components::{Passenger, PassengerSpawner, Station, WaitingRoom};
use metro_core::enums::StationType;
use metro_core::events::{GameEvent, PassengerAdded};

use crate::config::SpawnInterval;
use crate::world::{StationView, World};

/// Pick the delay until a station's next passenger.
pub fn draw_interval(rng: &mut ChaCha8Rng, interval: SpawnInterval) -> Duration {
    let min = interval.min.as_millis() as u64;
    let max = interval.max.as_millis() as u64;
    if max <= min {
        return interval.min;
    }
    Duration::from_millis(rng.gen_range(min..=max))
}

pub fn run(world: &mut World, rng: &mut ChaCha8Rng, interval: SpawnInterval, now: Duration) {
    let present: BTreeSet<StationType> = world
        .stations
        .values()
        .map(|&e| world.expect::<&Station>(e).station_type)
        .collect();

    // Stations in id order keep rng draws reproducible.
    let World {
        ecs,
        stations,
        outbox,
        ..
    } = world;
    for (&id, &entity) in stations.iter() {
        let Ok(mut spawner) = ecs.get::<&mut PassengerSpawner>(entity) else {
            continue;
        };
        if now < spawner.next_spawn_at {
            continue;
        }
        spawner.next_spawn_at = now + draw_interval(rng, interval);

        let Ok(station) = ecs.get::<&Station>(entity) else {
            continue;
        };
        let choices: Vec<StationType> = present
            .iter()
            .copied()
            .filter(|&t| t != station.station_type)
            .collect();
        let Some(&wanted) = choices.choose(rng) else {
            continue;
        };

        if let (Ok(mut room), Ok(view)) = (
            ecs.get::<&mut WaitingRoom>(entity),
            ecs.get::<&StationView>(entity),
        ) {
            room.passengers.push_back(Passenger {
                wanted,
                spawn_time: now,
            });
            view.0.add_passenger(wanted);
            tracing::debug!(%id, ?wanted, waiting = room.passengers.len(), "passenger spawned");
            outbox.push(GameEvent::PassengerAdded(PassengerAdded { station: id, wanted }));
        }
    }
}
