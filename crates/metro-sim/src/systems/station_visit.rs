//! A train stopping at a station: riders bound for the station's type
//! alight, then waiting passengers board oldest first while there is room.
//!
//! Only passengers whose wanted type some station on the train's line
//! serves get on.

use std::collections::VecDeque;

use hecs::Entity;

use metro_core::components::{Line, Station, Train, WaitingRoom};
use metro_core::enums::StationType;
use metro_core::events::*;
use metro_core::types::StationId;

use crate::world::{StationView, World};

pub fn run(world: &mut World, train_entity: Entity, station: StationId) {
    let station_entity = world.expect_station(station);
    let station_type = world.expect::<&Station>(station_entity).station_type;
    let line_id = world.expect::<&Train>(train_entity).line;
    let served: Vec<StationType> = world
        .expect::<&Line>(world.expect_line(line_id))
        .stations
        .iter()
        .map(|&s| world.expect::<&Station>(world.expect_station(s)).station_type)
        .collect();

    let mut events = Vec::new();
    let alighted = {
        let mut train = world.expect::<&mut Train>(train_entity);
        let mut room = world.expect::<&mut WaitingRoom>(station_entity);
        let view = world.expect::<&StationView>(station_entity);
        let train_id = train.id;

        let mut alighted = 0u64;
        for car in train.cars.iter_mut() {
            let before = car.passengers.len();
            car.passengers.retain(|p| p.wanted != station_type);
            alighted += (before - car.passengers.len()) as u64;
        }
        for _ in 0..alighted {
            events.push(GameEvent::PassengerAlighted(PassengerAlighted {
                train: train_id,
                station,
                wanted: station_type,
            }));
        }

        let mut free: usize = train
            .cars
            .iter()
            .map(|c| c.capacity.saturating_sub(c.passengers.len()))
            .sum();
        let mut kept = VecDeque::with_capacity(room.passengers.len());
        while let Some(passenger) = room.passengers.pop_front() {
            if free == 0 {
                kept.push_back(passenger);
                kept.extend(room.passengers.drain(..));
                break;
            }
            if !served.contains(&passenger.wanted) {
                kept.push_back(passenger);
                continue;
            }
            let wanted = passenger.wanted;
            if let Some(car) = train.cars.iter_mut().find(|c| c.has_room()) {
                car.passengers.push(passenger);
                free -= 1;
                view.0.remove_passenger(wanted);
                events.push(GameEvent::PassengerRemoved(PassengerRemoved { station, wanted }));
                events.push(GameEvent::PassengerBoarded(PassengerBoarded {
                    train: train_id,
                    station,
                    wanted,
                }));
            } else {
                kept.push_back(passenger);
            }
        }
        room.passengers = kept;

        if alighted > 0 || !events.is_empty() {
            tracing::debug!(train = %train_id, %station, alighted, waiting = room.passengers.len(), "station visit");
        }
        alighted
    };

    world.passengers_delivered += alighted;
    world.outbox.extend(events);
}
