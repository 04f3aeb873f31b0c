//! Headless runner: plays a scenario with a small demo network and logs
//! what happens.
//!
//! Environment:
//! - `METRO_LOG`: tracing filter, default `info`.
//! - `METRO_SCENARIO`: path to a JSON scenario; the built-in map otherwise.
//! - `METRO_SPEED`: clock speed multiplier, default 1.
//! - `METRO_RUN_SECS`: wall seconds to play before quitting, default 60.

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use metro_app::state::AppState;
use metro_core::commands::{IntentOutcome, PlayerIntent};
use metro_core::enums::LineShape;
use metro_core::events::{GameEvent, GameExitEvent};
use metro_core::types::StationId;
use metro_core::view::NullViewFactory;
use metro_sim::scenario::{test_map, ScenarioDefinition};
use metro_sim::{Clock, SimConfig, SimulationLoop, ThreadScheduler};

fn main() {
    init_tracing();
    if let Err(err) = run() {
        tracing::error!(error = %err, "run failed");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("METRO_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .compact()
        .init();
}

fn run() -> Result<(), Box<dyn Error>> {
    let scenario = match std::env::var("METRO_SCENARIO") {
        Ok(path) => ScenarioDefinition::from_json(&std::fs::read_to_string(path)?)?,
        Err(_) => test_map(),
    };
    let config = SimConfig {
        speed: env_or("METRO_SPEED", 1.0)?,
        ..Default::default()
    };
    let run_for = run_duration(env_or("METRO_RUN_SECS", 60.0)?)?;

    let state = AppState::new();
    state.bus.subscribe(|event: &GameEvent| match event {
        GameEvent::PassengerAdded(_)
        | GameEvent::PassengerRemoved(_)
        | GameEvent::PassengerBoarded(_)
        | GameEvent::PassengerAlighted(_) => tracing::trace!(?event, "event"),
        _ => tracing::debug!(?event, "event"),
    });

    let clock = Arc::new(Clock::new(config.speed));
    let sim = SimulationLoop::new(
        scenario,
        config,
        clock,
        state.bus.clone(),
        Box::new(NullViewFactory),
    )?;
    state.start_simulation(sim, ThreadScheduler)?;

    build_demo_network(&state)?;

    std::thread::sleep(run_for);
    state.bus.publish(GameExitEvent);
    let reason = state.join()?;

    if let Some(snapshot) = state.get_snapshot()? {
        tracing::info!(
            ?reason,
            time = ?snapshot.time,
            stations = snapshot.stations.len(),
            delivered = snapshot.passengers_delivered,
            "session over"
        );
    }
    Ok(())
}

/// Join the first three stations in a loop, tunnelling wherever the
/// straight segment crosses water, and put a train on it.
fn build_demo_network(state: &AppState) -> Result<(), Box<dyn Error>> {
    let stations = vec![StationId(0), StationId(1), StationId(2)];
    let pairs = [
        (stations[0], stations[1]),
        (stations[1], stations[2]),
        (stations[2], stations[0]),
    ];
    for (from, to) in pairs {
        // Segments on dry land are refused with TunnelNotNeeded.
        if let Ok(outcome) = state.send_intent(PlayerIntent::AddTunnel { from, to })? {
            tracing::info!(?outcome, "demo tunnel");
        }
    }

    let outcome = state.send_intent(PlayerIntent::CreateLine {
        stations,
        shape: LineShape::Loop,
    })??;
    if let IntentOutcome::LineCreated { line } = outcome {
        state.send_intent(PlayerIntent::AssignTrain { line })??;
    }
    Ok(())
}

/// Negative values mean "quit right away".
fn run_duration(secs: f64) -> Result<Duration, Box<dyn Error>> {
    Ok(Duration::try_from_secs_f64(secs.max(0.0))
        .map_err(|e| format!("METRO_RUN_SECS={secs}: {e}"))?)
}

fn env_or(name: &str, default: f64) -> Result<f64, Box<dyn Error>> {
    match std::env::var(name) {
        Ok(value) => Ok(value
            .parse()
            .map_err(|e| format!("{name}={value}: {e}"))?),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_duration_rejects_unrepresentable_spans() {
        assert_eq!(run_duration(1.5).unwrap(), Duration::from_millis(1_500));
        assert_eq!(run_duration(-4.0).unwrap(), Duration::ZERO);
        assert!(run_duration(f64::INFINITY).is_err());
        assert!(run_duration(1e30).is_err());
    }
}
