//! Simulation engine for Magic Metro.
//!
//! Owns the hecs-backed World, turns scaled clock time into fixed logical
//! ticks, and publishes change events for the presentation layer.

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod event_bus;
pub mod scenario;
pub mod scheduler;
pub mod systems;
pub mod timeline;
pub mod world;

pub use clock::{Clock, ManualTimeSource, SystemTimeSource, TimeSource};
pub use config::{SimConfig, SpawnInterval};
pub use engine::{PassReport, SimulationLoop};
pub use event_bus::EventBus;
pub use metro_core as core;
pub use scheduler::{ManualScheduler, Scheduler, ThreadScheduler};
pub use world::World;
