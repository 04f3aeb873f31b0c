//! Magic Metro host application.
//!
//! Runs the simulation on its own thread, forwards player intents to it
//! and keeps the latest snapshot for the presentation layer.

pub mod game_loop;
pub mod state;

pub use metro_core as core;
