//! Overcrowding: a station whose waiting count stays above its effective
//! capacity for the whole grace period ends the game.

use std::time::Duration;

use metro_core::components::{Station, WaitingRoom};
use metro_core::events::{GameEvent, StationUnwarned, StationWarned};
use metro_core::types::StationId;

use crate::world::{StationView, World};

/// Update warnings for every station. Returns the first station (by id)
/// whose grace period has run out.
pub fn run(world: &mut World, now: Duration, grace: Duration) -> Option<StationId> {
    let World {
        ecs,
        stations,
        outbox,
        ..
    } = world;

    let mut failed = None;
    for (&id, &entity) in stations.iter() {
        let (Ok(mut station), Ok(room), Ok(view)) = (
            ecs.get::<&mut Station>(entity),
            ecs.get::<&WaitingRoom>(entity),
            ecs.get::<&StationView>(entity),
        ) else {
            panic!("{id} is missing station components");
        };

        let waiting = room.passengers.len();
        let over = waiting > station.effective_capacity();
        match (over, station.overcrowded_since) {
            (true, None) => {
                station.overcrowded_since = Some(now);
                view.0.warn(grace);
                tracing::warn!(%id, waiting, capacity = station.effective_capacity(), "station overcrowded");
                outbox.push(GameEvent::StationWarned(StationWarned { station: id, grace }));
            }
            (true, Some(since)) => {
                if failed.is_none() && now.saturating_sub(since) >= grace {
                    failed = Some(id);
                }
            }
            (false, Some(_)) => {
                station.overcrowded_since = None;
                view.0.un_warn();
                tracing::info!(%id, waiting, "station no longer overcrowded");
                outbox.push(GameEvent::StationUnwarned(StationUnwarned { station: id }));
            }
            (false, None) => {}
        }
    }
    failed
}
