//! The entity graph: stations, lines, trains and tunnels in a hecs world,
//! plus the resources and offers of the current session.
//!
//! `World` is the only mutation surface. Player mutations validate every
//! reference, resource count and geometric constraint before touching
//! anything, so a rejected request leaves the world exactly as it was.
//! Entities are never despawned during a session, which keeps every id
//! stored in a line or train resolvable.

use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

use glam::DVec2;
use hecs::{Entity, EntityBuilder};

use metro_core::components::*;
use metro_core::constants::{INITIAL_TRAIN_CARS, INITIAL_UPGRADE_LEVEL, MIN_LOOP_LINE_STATIONS, MIN_OPEN_LINE_STATIONS};
use metro_core::enums::*;
use metro_core::error::MutationError;
use metro_core::events::*;
use metro_core::state::MapView;
use metro_core::types::*;
use metro_core::view::{EntityView, StationViewFactory};

use crate::config::SimConfig;

pub type MutationResult<T> = Result<T, MutationError>;

/// View handle attached to a station entity.
pub struct StationView(pub Box<dyn EntityView>);

/// Sizes used when the world creates entities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityLimits {
    pub station_capacity: usize,
    pub train_speed: f64,
    pub train_car_slots: usize,
    pub car_capacity: usize,
}

impl From<&SimConfig> for EntityLimits {
    fn from(config: &SimConfig) -> Self {
        Self {
            station_capacity: config.station_capacity,
            train_speed: config.train_speed,
            train_car_slots: config.train_car_slots,
            car_capacity: config.car_capacity,
        }
    }
}

#[derive(Debug, Default)]
struct IdCounters {
    station: u32,
    line: u32,
    train: u32,
    tunnel: u32,
    offer: u32,
}

pub struct World {
    pub(crate) ecs: hecs::World,
    pub(crate) stations: BTreeMap<StationId, Entity>,
    pub(crate) lines: BTreeMap<LineId, Entity>,
    pub(crate) trains: BTreeMap<TrainId, Entity>,
    tunnels: BTreeMap<TunnelId, Entity>,
    offers: BTreeMap<OfferId, Vec<ElementOption>>,
    map: MapView,
    inventory: Inventory,
    limits: EntityLimits,
    view_factory: Box<dyn StationViewFactory>,
    ids: IdCounters,
    pub(crate) passengers_delivered: u64,
    /// Events produced since the last drain, in emission order.
    pub(crate) outbox: Vec<GameEvent>,
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("stations", &self.stations.len())
            .field("lines", &self.lines.len())
            .field("trains", &self.trains.len())
            .field("tunnels", &self.tunnels.len())
            .field("inventory", &self.inventory)
            .finish()
    }
}

impl World {
    pub fn new(
        map: MapView,
        inventory: Inventory,
        limits: EntityLimits,
        view_factory: Box<dyn StationViewFactory>,
    ) -> Self {
        Self {
            ecs: hecs::World::new(),
            stations: BTreeMap::new(),
            lines: BTreeMap::new(),
            trains: BTreeMap::new(),
            tunnels: BTreeMap::new(),
            offers: BTreeMap::new(),
            map,
            inventory,
            limits,
            view_factory,
            ids: IdCounters::default(),
            passengers_delivered: 0,
            outbox: Vec::new(),
        }
    }

    // --- Simulation-driven mutations ---

    /// Create a station. `next_spawn_at` is when it produces its first
    /// passenger; `None` means it never does.
    pub fn add_station(
        &mut self,
        position: DVec2,
        station_type: StationType,
        now: Duration,
        next_spawn_at: Option<Duration>,
    ) -> StationId {
        let id = StationId(self.ids.station);
        self.ids.station += 1;

        let view = self.view_factory.create_station_view(station_type);
        view.set_position(position);

        let station = Station {
            id,
            station_type,
            capacity: self.limits.station_capacity,
            upgrade_level: INITIAL_UPGRADE_LEVEL,
            overcrowded_since: None,
        };
        let mut builder = EntityBuilder::new();
        builder.add_bundle((
            station,
            Position(position),
            WaitingRoom::default(),
            StationView(view),
        ));
        if let Some(next_spawn_at) = next_spawn_at {
            builder.add(PassengerSpawner { next_spawn_at });
        }
        let entity = self.ecs.spawn(builder.build());
        self.stations.insert(id, entity);

        tracing::info!(%id, ?station_type, x = position.x, y = position.y, "station appeared");
        self.outbox.push(GameEvent::StationAppeared(StationAppeared {
            station: id,
            station_type,
            position,
            at: now,
        }));
        id
    }

    /// Put a passenger in a station's waiting room.
    pub fn add_passenger(
        &mut self,
        station: StationId,
        wanted: StationType,
        now: Duration,
    ) -> MutationResult<()> {
        let entity = self.station_entity(station)?;
        {
            let info = self.expect::<&Station>(entity);
            if info.station_type == wanted {
                return Err(MutationError::WrongDestination(station));
            }
        }
        self.expect::<&mut WaitingRoom>(entity)
            .passengers
            .push_back(Passenger {
                wanted,
                spawn_time: now,
            });
        self.expect::<&StationView>(entity).0.add_passenger(wanted);
        self.outbox
            .push(GameEvent::PassengerAdded(PassengerAdded { station, wanted }));
        Ok(())
    }

    /// Register a pending element-choice offer.
    pub fn offer_elements(&mut self, options: Vec<ElementOption>) -> OfferId {
        let id = OfferId(self.ids.offer);
        self.ids.offer += 1;
        tracing::info!(%id, ?options, "element choice offered");
        self.outbox
            .push(GameEvent::ElementChoiceOffered(ElementChoiceOffered {
                offer: id,
                options: options.clone(),
            }));
        self.offers.insert(id, options);
        id
    }

    // --- Player mutations ---

    pub fn create_line(&mut self, stations: Vec<StationId>, shape: LineShape) -> MutationResult<LineId> {
        let required = match shape {
            LineShape::Open => MIN_OPEN_LINE_STATIONS,
            LineShape::Loop => MIN_LOOP_LINE_STATIONS,
        };
        if stations.len() < required {
            return Err(MutationError::LineTooShort {
                required,
                got: stations.len(),
            });
        }
        for (i, &station) in stations.iter().enumerate() {
            self.station_entity(station)?;
            if stations[..i].contains(&station) {
                return Err(MutationError::RepeatedStation(station));
            }
        }
        for (from, to) in segments(&stations, shape) {
            if self.crosses_water(from, to) && !self.has_tunnel(from, to) {
                return Err(MutationError::CrossesWater { from, to });
            }
        }
        self.spend(ElementKind::Line)?;

        let id = LineId(self.ids.line);
        self.ids.line += 1;
        tracing::info!(%id, ?shape, stations = stations.len(), "line created");
        let entity = self.ecs.spawn((Line {
            id,
            stations,
            shape,
            trains: Vec::new(),
        },));
        self.lines.insert(id, entity);
        Ok(id)
    }

    /// Put a new train at the first station of `line`.
    pub fn assign_train(&mut self, line: LineId) -> MutationResult<TrainId> {
        let line_entity = self.line_entity(line)?;
        self.spend(ElementKind::Train)?;

        let id = TrainId(self.ids.train);
        self.ids.train += 1;
        let cars = (0..INITIAL_TRAIN_CARS)
            .map(|_| PassengerCar {
                capacity: self.limits.car_capacity,
                passengers: Vec::new(),
            })
            .collect();
        let entity = self.ecs.spawn((Train {
            id,
            line,
            at: 0,
            heading_to: 1,
            direction: Direction::Forward,
            distance: 0.0,
            speed: self.limits.train_speed,
            car_slots: self.limits.train_car_slots,
            cars,
        },));
        self.trains.insert(id, entity);
        self.expect::<&mut Line>(line_entity).trains.push(id);

        tracing::info!(%id, %line, "train assigned");
        Ok(id)
    }

    /// Move a train to the first station of another line. Riders stay on
    /// board and alight wherever the new line serves their destination.
    pub fn reassign_train(&mut self, train: TrainId, line: LineId) -> MutationResult<()> {
        let train_entity = self.train_entity(train)?;
        let new_line = self.line_entity(line)?;
        let old_line = self.expect::<&Train>(train_entity).line;
        if old_line == line {
            return Err(MutationError::SameLine { train, line });
        }

        let old_entity = self.expect_line(old_line);
        self.expect::<&mut Line>(old_entity).trains.retain(|&t| t != train);
        self.expect::<&mut Line>(new_line).trains.push(train);
        {
            let mut state = self.expect::<&mut Train>(train_entity);
            state.line = line;
            state.at = 0;
            state.heading_to = 1;
            state.direction = Direction::Forward;
            state.distance = 0.0;
        }
        tracing::info!(%train, from = %old_line, to = %line, "train reassigned");
        Ok(())
    }

    /// Attach one more car. Returns the new car count.
    pub fn add_passenger_car(&mut self, train: TrainId) -> MutationResult<usize> {
        let entity = self.train_entity(train)?;
        {
            let state = self.expect::<&Train>(entity);
            if state.cars.len() >= state.car_slots {
                return Err(MutationError::TrainFull(train));
            }
        }
        self.spend(ElementKind::PassengerCar)?;

        let capacity = self.limits.car_capacity;
        let mut state = self.expect::<&mut Train>(entity);
        state.cars.push(PassengerCar {
            capacity,
            passengers: Vec::new(),
        });
        Ok(state.cars.len())
    }

    /// Build a tunnel for the straight segment between two stations.
    pub fn add_tunnel(&mut self, from: StationId, to: StationId) -> MutationResult<TunnelId> {
        self.station_entity(from)?;
        self.station_entity(to)?;
        if from == to {
            return Err(MutationError::RepeatedStation(from));
        }
        if !self.crosses_water(from, to) {
            return Err(MutationError::TunnelNotNeeded { from, to });
        }
        if self.has_tunnel(from, to) {
            return Err(MutationError::TunnelExists { from, to });
        }
        self.spend(ElementKind::Tunnel)?;

        let id = TunnelId(self.ids.tunnel);
        self.ids.tunnel += 1;
        let entity = self.ecs.spawn((Tunnel { id, from, to },));
        self.tunnels.insert(id, entity);
        tracing::info!(%id, %from, %to, "tunnel built");
        Ok(id)
    }

    /// Raise a station's upgrade level. Returns the new level.
    pub fn upgrade_station(&mut self, station: StationId) -> MutationResult<u32> {
        let entity = self.station_entity(station)?;
        self.spend(ElementKind::StationUpgrade)?;

        let level = {
            let mut info = self.expect::<&mut Station>(entity);
            info.upgrade_level += 1;
            info.upgrade_level
        };
        self.expect::<&StationView>(entity).0.make_bigger();
        tracing::info!(%station, level, "station upgraded");
        Ok(level)
    }

    /// Accept option `option` of a pending offer and add its units to the
    /// inventory.
    pub fn choose_element(&mut self, offer: OfferId, option: usize) -> MutationResult<ElementOption> {
        let options = self
            .offers
            .get(&offer)
            .ok_or(MutationError::UnknownOffer(offer))?;
        let chosen = *options
            .get(option)
            .ok_or(MutationError::UnknownOption { offer, option })?;

        self.offers.remove(&offer);
        *self.inventory.count_mut(chosen.element) += chosen.weight;
        tracing::info!(%offer, element = ?chosen.element, units = chosen.weight, "element chosen");
        Ok(chosen)
    }

    // --- Queries ---

    pub fn map(&self) -> &MapView {
        &self.map
    }

    pub fn inventory(&self) -> Inventory {
        self.inventory
    }

    pub fn offers(&self) -> impl Iterator<Item = (OfferId, &[ElementOption])> {
        self.offers.iter().map(|(id, o)| (*id, o.as_slice()))
    }

    pub fn station_ids(&self) -> impl Iterator<Item = StationId> + '_ {
        self.stations.keys().copied()
    }

    pub fn line_ids(&self) -> impl Iterator<Item = LineId> + '_ {
        self.lines.keys().copied()
    }

    pub fn train_ids(&self) -> impl Iterator<Item = TrainId> + '_ {
        self.trains.keys().copied()
    }

    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    /// Copy of a station's state.
    pub fn station(&self, id: StationId) -> Option<Station> {
        let entity = *self.stations.get(&id)?;
        Some(Station::clone(&self.expect::<&Station>(entity)))
    }

    pub fn station_position(&self, id: StationId) -> Option<DVec2> {
        let entity = *self.stations.get(&id)?;
        Some(self.expect::<&Position>(entity).0)
    }

    /// Find a station by where it stands.
    pub fn station_at(&self, position: DVec2) -> Option<StationId> {
        self.stations.iter().find_map(|(&id, &entity)| {
            (self.expect::<&Position>(entity).0 == position).then_some(id)
        })
    }

    /// Copy of the passengers waiting at a station, oldest first.
    pub fn waiting(&self, id: StationId) -> Option<VecDeque<Passenger>> {
        let entity = *self.stations.get(&id)?;
        Some(self.expect::<&WaitingRoom>(entity).passengers.clone())
    }

    pub fn waiting_count(&self, id: StationId) -> Option<usize> {
        let entity = *self.stations.get(&id)?;
        Some(self.expect::<&WaitingRoom>(entity).passengers.len())
    }

    pub fn line(&self, id: LineId) -> Option<Line> {
        let entity = *self.lines.get(&id)?;
        Some(Line::clone(&self.expect::<&Line>(entity)))
    }

    pub fn train(&self, id: TrainId) -> Option<Train> {
        let entity = *self.trains.get(&id)?;
        Some(Train::clone(&self.expect::<&Train>(entity)))
    }

    pub fn tunnels(&self) -> Vec<Tunnel> {
        self.tunnels
            .values()
            .map(|&e| *self.expect::<&Tunnel>(e))
            .collect()
    }

    pub fn passengers_delivered(&self) -> u64 {
        self.passengers_delivered
    }

    /// Whether the straight segment between two stations crosses water.
    pub fn segment_crosses_water(&self, a: StationId, b: StationId) -> MutationResult<bool> {
        self.station_entity(a)?;
        self.station_entity(b)?;
        Ok(self.crosses_water(a, b))
    }

    pub fn has_tunnel(&self, a: StationId, b: StationId) -> bool {
        self.tunnels
            .values()
            .any(|&e| self.expect::<&Tunnel>(e).connects(a, b))
    }

    /// Take every event produced since the last call.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.outbox)
    }

    // --- Internal helpers ---

    fn crosses_water(&self, a: StationId, b: StationId) -> bool {
        let (pa, pb) = (self.expect_position(a), self.expect_position(b));
        self.map.water.iter().any(|r| r.intersects_segment(pa, pb))
    }

    fn spend(&mut self, kind: ElementKind) -> MutationResult<()> {
        let count = self.inventory.count_mut(kind);
        if *count == 0 {
            return Err(MutationError::InsufficientResources(kind));
        }
        *count -= 1;
        Ok(())
    }

    fn station_entity(&self, id: StationId) -> MutationResult<Entity> {
        self.stations
            .get(&id)
            .copied()
            .ok_or(MutationError::UnknownStation(id))
    }

    fn line_entity(&self, id: LineId) -> MutationResult<Entity> {
        self.lines
            .get(&id)
            .copied()
            .ok_or(MutationError::UnknownLine(id))
    }

    fn train_entity(&self, id: TrainId) -> MutationResult<Entity> {
        self.trains
            .get(&id)
            .copied()
            .ok_or(MutationError::UnknownTrain(id))
    }

    /// Resolve a station id held by another entity. A miss is a broken
    /// invariant, not a player error.
    pub(crate) fn expect_station(&self, id: StationId) -> Entity {
        match self.stations.get(&id) {
            Some(&entity) => entity,
            None => panic!("dangling reference to {id}"),
        }
    }

    pub(crate) fn expect_line(&self, id: LineId) -> Entity {
        match self.lines.get(&id) {
            Some(&entity) => entity,
            None => panic!("dangling reference to {id}"),
        }
    }

    pub(crate) fn expect_position(&self, id: StationId) -> DVec2 {
        self.expect::<&Position>(self.expect_station(id)).0
    }

    /// Borrow a component every entity of its kind carries.
    pub(crate) fn expect<'a, T: hecs::ComponentRef<'a>>(&'a self, entity: Entity) -> T::Ref {
        match self.ecs.get::<T>(entity) {
            Ok(component) => component,
            Err(err) => panic!("entity {entity:?} lost a component: {err}"),
        }
    }
}

/// Consecutive station pairs of a route, closing the loop when needed.
pub fn segments(stations: &[StationId], shape: LineShape) -> Vec<(StationId, StationId)> {
    let mut pairs: Vec<_> = stations.windows(2).map(|w| (w[0], w[1])).collect();
    if shape == LineShape::Loop && stations.len() > 2 {
        pairs.push((stations[stations.len() - 1], stations[0]));
    }
    pairs
}
