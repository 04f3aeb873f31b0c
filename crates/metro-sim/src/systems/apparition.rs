//! Materializes due timeline events into the world.

use std::time::Duration;

use rand_chacha::ChaCha8Rng;

use crate::config::SpawnInterval;
use crate::systems::passenger_spawner;
use crate::timeline::{ScenarioTimeline, TimedEvent, TimelinePayload};
use crate::world::World;

/// Apply every timeline event due at `now`, in timeline order.
pub fn run(
    world: &mut World,
    timeline: &mut ScenarioTimeline,
    now: Duration,
    rng: &mut ChaCha8Rng,
    spawn: Option<SpawnInterval>,
) -> usize {
    let due = timeline.take_due(now);
    let count = due.len();
    for event in due {
        materialize(world, event, now, rng, spawn);
    }
    count
}

fn materialize(
    world: &mut World,
    event: TimedEvent,
    now: Duration,
    rng: &mut ChaCha8Rng,
    spawn: Option<SpawnInterval>,
) {
    match event.payload {
        TimelinePayload::StationApparition {
            position,
            station_type,
        } => {
            let next_spawn_at = spawn.map(|interval| now + passenger_spawner::draw_interval(rng, interval));
            world.add_station(position, station_type, now, next_spawn_at);
        }
        TimelinePayload::ElementChoiceOffer { options } => {
            world.offer_elements(options);
        }
    }
}
