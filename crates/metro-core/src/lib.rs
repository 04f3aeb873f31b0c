//! Core types and definitions for the Magic Metro simulation.
//!
//! This crate defines the vocabulary shared across all other crates:
//! components, player intents, state snapshots, events, view capabilities,
//! errors and constants. It has no dependency on any runtime framework.

pub mod commands;
pub mod components;
pub mod constants;
pub mod enums;
pub mod error;
pub mod events;
pub mod state;
pub mod types;
pub mod view;

#[cfg(test)]
mod tests;
