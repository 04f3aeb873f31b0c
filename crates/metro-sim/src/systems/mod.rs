//! Systems that operate on the world each tick.
//!
//! Systems are free functions over `&mut World` (or `&World` for read-only).
//! They hold no state of their own; everything lives in components, and
//! every event they produce goes to the world's outbox.

pub mod apparition;
pub mod overcrowding;
pub mod passenger_spawner;
pub mod snapshot;
pub mod station_visit;
pub mod train_movement;
