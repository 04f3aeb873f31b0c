//! Simulation loop, the core of the game.
//!
//! `SimulationLoop` owns the World and the scenario timeline, turns clock
//! time into fixed logical ticks, applies player intents and publishes
//! change events on the bus. Completely headless, enabling deterministic
//! testing with a manual time source.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use metro_core::commands::{IntentOutcome, PlayerIntent};
use metro_core::constants::DRIFT_WARN_TICKS;
use metro_core::enums::{EndReason, LoopState};
use metro_core::error::MutationError;
use metro_core::events::*;
use metro_core::state::{MapView, WorldSnapshot};
use metro_core::view::StationViewFactory;

use crate::clock::Clock;
use crate::config::SimConfig;
use crate::error::ScenarioResult;
use crate::event_bus::{EventBus, SubscriptionId};
use crate::scenario::ScenarioDefinition;
use crate::scheduler::Scheduler;
use crate::systems;
use crate::timeline::ScenarioTimeline;
use crate::world::{EntityLimits, World};

/// State transitions requested through the bus, applied by the loop at
/// the start of its next pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopControl {
    Start,
    Pause,
    Resume,
    Exit,
}

type ControlInbox = Arc<Mutex<VecDeque<LoopControl>>>;

/// What one evaluation pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassReport {
    pub ticks: u64,
    pub state: LoopState,
}

pub struct SimulationLoop {
    world: World,
    timeline: ScenarioTimeline,
    config: SimConfig,
    clock: Arc<Clock>,
    bus: Arc<EventBus>,
    state: LoopState,
    next_loop_mark: Duration,
    end_reason: Option<EndReason>,
    rng: ChaCha8Rng,
    inbox: ControlInbox,
    subscriptions: Vec<SubscriptionId>,
}

impl SimulationLoop {
    /// Build the world for `scenario`, set the clock to the configured
    /// speed, announce the map and materialize everything scheduled at t = 0.
    pub fn new(
        scenario: ScenarioDefinition,
        config: SimConfig,
        clock: Arc<Clock>,
        bus: Arc<EventBus>,
        view_factory: Box<dyn StationViewFactory>,
    ) -> ScenarioResult<Self> {
        scenario.validate()?;

        let map = MapView {
            width: scenario.map_width,
            height: scenario.map_height,
            water: scenario.water.clone(),
        };
        let world = World::new(
            map,
            scenario.initial,
            EntityLimits::from(&config),
            view_factory,
        );
        let timeline = ScenarioTimeline::from_scenario(&scenario);
        clock.set_speed(config.speed);
        let inbox = ControlInbox::default();
        let subscriptions = subscribe_controls(&bus, &clock, &inbox);

        let mut sim = Self {
            world,
            timeline,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            clock,
            bus,
            state: LoopState::Stopped,
            next_loop_mark: Duration::ZERO,
            end_reason: None,
            inbox,
            subscriptions,
        };

        tracing::info!(
            scenario = %scenario.name,
            stations = scenario.stations.len(),
            offers = scenario.element_choices.len(),
            "simulation created"
        );
        sim.bus.publish(MapSizeSet {
            width: scenario.map_width,
            height: scenario.map_height,
        });
        sim.bus.publish(WaterRegionsSet {
            regions: scenario.water,
        });
        systems::apparition::run(
            &mut sim.world,
            &mut sim.timeline,
            Duration::ZERO,
            &mut sim.rng,
            sim.config.passenger_spawn,
        );
        sim.flush_events();
        Ok(sim)
    }

    /// Start the clock and the loop. Same as publishing `TimeStartEvent`,
    /// but takes effect immediately.
    pub fn start(&mut self) {
        if self.state == LoopState::Stopped {
            self.clock.start();
            self.transition(LoopState::Running);
        }
    }

    /// One evaluation pass: apply pending control requests, catch up every
    /// tick due by the clock, then publish what changed.
    pub fn evaluate(&mut self) -> PassReport {
        self.drain_controls();

        let mut ticks = 0u64;
        if self.state == LoopState::Running {
            let now = self.clock.now();
            while self.next_loop_mark < now && self.state == LoopState::Running {
                self.tick(self.next_loop_mark);
                self.next_loop_mark += self.config.tick_resolution;
                ticks += 1;
            }
            if ticks > DRIFT_WARN_TICKS {
                tracing::warn!(ticks, mark = ?self.next_loop_mark, "scheduling drift, caught up");
            }
        }

        self.flush_events();
        PassReport {
            ticks,
            state: self.state,
        }
    }

    /// Evaluate until the session ends, waiting `refresh_delay` between
    /// passes. A loop that is never started waits for `TimeStartEvent`.
    pub fn run(&mut self, scheduler: &mut dyn Scheduler) -> EndReason {
        loop {
            self.evaluate();
            if let Some(reason) = self.end_reason {
                return reason;
            }
            scheduler.wait(self.config.refresh_delay);
        }
    }

    /// Apply one player intent. A rejection leaves the world untouched and
    /// is also published as `IntentRejected`.
    pub fn apply_intent(&mut self, intent: PlayerIntent) -> Result<IntentOutcome, MutationError> {
        let result = if self.state == LoopState::Ended {
            Err(MutationError::GameEnded)
        } else {
            self.dispatch(intent)
        };

        match &result {
            Ok(outcome) => tracing::debug!(?outcome, "intent applied"),
            Err(err) => {
                tracing::warn!(%err, "intent rejected");
                self.world
                    .outbox
                    .push(GameEvent::IntentRejected(IntentRejected {
                        reason: err.to_string(),
                    }));
            }
        }
        self.flush_events();
        result
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        systems::snapshot::build_snapshot(
            &self.world,
            self.next_loop_mark,
            self.state,
            self.config.overcrowd_grace,
            self.end_reason,
        )
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }

    /// Scaled time of the next tick to process.
    pub fn next_loop_mark(&self) -> Duration {
        self.next_loop_mark
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Direct world access for scripted setups. Bypasses the intent
    /// boundary and the ended check.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn timeline(&self) -> &ScenarioTimeline {
        &self.timeline
    }

    pub fn clock(&self) -> &Arc<Clock> {
        &self.clock
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Run every system for the tick starting at `mark`.
    fn tick(&mut self, mark: Duration) {
        systems::apparition::run(
            &mut self.world,
            &mut self.timeline,
            mark,
            &mut self.rng,
            self.config.passenger_spawn,
        );
        if let Some(interval) = self.config.passenger_spawn {
            systems::passenger_spawner::run(&mut self.world, &mut self.rng, interval, mark);
        }
        systems::train_movement::run(&mut self.world, self.config.tick_resolution);
        if let Some(station) =
            systems::overcrowding::run(&mut self.world, mark, self.config.overcrowd_grace)
        {
            self.end(EndReason::Overcrowded { station }, mark);
        }
    }

    fn dispatch(&mut self, intent: PlayerIntent) -> Result<IntentOutcome, MutationError> {
        let world = &mut self.world;
        Ok(match intent {
            PlayerIntent::CreateLine { stations, shape } => IntentOutcome::LineCreated {
                line: world.create_line(stations, shape)?,
            },
            PlayerIntent::AssignTrain { line } => IntentOutcome::TrainAssigned {
                train: world.assign_train(line)?,
            },
            PlayerIntent::ReassignTrain { train, line } => {
                world.reassign_train(train, line)?;
                IntentOutcome::TrainReassigned { train, line }
            }
            PlayerIntent::AddPassengerCar { train } => IntentOutcome::CarAdded {
                train,
                cars: world.add_passenger_car(train)?,
            },
            PlayerIntent::AddTunnel { from, to } => IntentOutcome::TunnelBuilt {
                tunnel: world.add_tunnel(from, to)?,
            },
            PlayerIntent::UpgradeStation { station } => IntentOutcome::StationUpgraded {
                station,
                level: world.upgrade_station(station)?,
            },
            PlayerIntent::ChooseElement { offer, option } => {
                world.choose_element(offer, option)?;
                IntentOutcome::ElementChosen { offer }
            }
        })
    }

    fn drain_controls(&mut self) {
        let requests: Vec<LoopControl> = {
            let mut inbox = self.inbox.lock().unwrap_or_else(|e| e.into_inner());
            inbox.drain(..).collect()
        };
        for request in requests {
            match (request, self.state) {
                (_, LoopState::Ended) => {}
                (LoopControl::Start, LoopState::Stopped) => self.transition(LoopState::Running),
                (LoopControl::Pause, LoopState::Running) => self.transition(LoopState::Paused),
                (LoopControl::Resume, LoopState::Paused) => self.transition(LoopState::Running),
                (LoopControl::Exit, _) => self.end(EndReason::Exit, self.next_loop_mark),
                (request, state) => {
                    tracing::debug!(?request, ?state, "control request ignored");
                }
            }
        }
    }

    fn transition(&mut self, to: LoopState) {
        tracing::info!(from = ?self.state, ?to, mark = ?self.next_loop_mark, "loop state changed");
        self.state = to;
    }

    fn end(&mut self, reason: EndReason, at: Duration) {
        if self.state == LoopState::Ended {
            return;
        }
        self.transition(LoopState::Ended);
        self.end_reason = Some(reason);
        self.clock.end();
        tracing::info!(
            ?reason,
            ?at,
            delivered = self.world.passengers_delivered(),
            "game ended"
        );
        self.world
            .outbox
            .push(GameEvent::GameEnded(GameEnded { reason, at }));
    }

    /// Publish buffered events, each as its own type and then wrapped as
    /// `GameEvent`.
    fn flush_events(&mut self) {
        for event in self.world.drain_events() {
            match &event {
                GameEvent::MapSizeSet(e) => self.bus.publish(e.clone()),
                GameEvent::WaterRegionsSet(e) => self.bus.publish(e.clone()),
                GameEvent::StationAppeared(e) => self.bus.publish(e.clone()),
                GameEvent::PassengerAdded(e) => self.bus.publish(e.clone()),
                GameEvent::PassengerRemoved(e) => self.bus.publish(e.clone()),
                GameEvent::PassengerBoarded(e) => self.bus.publish(e.clone()),
                GameEvent::PassengerAlighted(e) => self.bus.publish(e.clone()),
                GameEvent::StationWarned(e) => self.bus.publish(e.clone()),
                GameEvent::StationUnwarned(e) => self.bus.publish(e.clone()),
                GameEvent::ElementChoiceOffered(e) => self.bus.publish(e.clone()),
                GameEvent::IntentRejected(e) => self.bus.publish(e.clone()),
                GameEvent::GameEnded(e) => self.bus.publish(e.clone()),
            }
            self.bus.publish(event);
        }
    }
}

impl Drop for SimulationLoop {
    fn drop(&mut self) {
        for id in self.subscriptions.drain(..) {
            self.bus.unsubscribe(id);
        }
    }
}

/// Listeners apply clock changes on the publisher's thread right away and
/// leave the state transition to the loop.
fn subscribe_controls(bus: &EventBus, clock: &Arc<Clock>, inbox: &ControlInbox) -> Vec<SubscriptionId> {
    fn push(inbox: &ControlInbox, request: LoopControl) {
        inbox
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(request);
    }

    let mut ids = Vec::with_capacity(5);

    let (c, i) = (clock.clone(), inbox.clone());
    ids.push(bus.subscribe(move |_: &TimeStartEvent| {
        c.start();
        push(&i, LoopControl::Start);
    }));

    let (c, i) = (clock.clone(), inbox.clone());
    ids.push(bus.subscribe(move |_: &TimePauseEvent| {
        c.pause();
        push(&i, LoopControl::Pause);
    }));

    let (c, i) = (clock.clone(), inbox.clone());
    ids.push(bus.subscribe(move |_: &TimeResumeEvent| {
        c.resume();
        push(&i, LoopControl::Resume);
    }));

    let c = clock.clone();
    ids.push(bus.subscribe(move |e: &TimeSpeedChangeEvent| {
        c.set_speed(e.multiplier);
        tracing::info!(speed = c.speed(), "speed changed");
    }));

    let i = inbox.clone();
    ids.push(bus.subscribe(move |_: &GameExitEvent| {
        push(&i, LoopControl::Exit);
    }));

    ids
}
