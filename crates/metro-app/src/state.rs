//! Application state shared between the host and the game loop thread.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use metro_core::commands::{IntentOutcome, PlayerIntent};
use metro_core::enums::EndReason;
use metro_core::error::MutationError;
use metro_core::state::WorldSnapshot;
use metro_sim::event_bus::EventBus;
use metro_sim::scheduler::Scheduler;
use metro_sim::SimulationLoop;

use crate::game_loop::{self, GameLoopHandle};

pub type IntentReply = Result<IntentOutcome, MutationError>;

/// Commands sent from the host to the game loop thread.
#[derive(Debug)]
pub enum GameLoopCommand {
    /// A player intent; the outcome comes back on `reply`.
    Intent {
        intent: PlayerIntent,
        reply: mpsc::Sender<IntentReply>,
    },
    /// Stop the game loop thread without ending the session.
    Shutdown,
}

/// Shared application state.
///
/// The host talks to the loop thread through `command_tx` and the event
/// bus, and reads the world only through `latest_snapshot`.
pub struct AppState {
    /// Channel sender to forward commands to the game loop thread.
    /// `None` before `start_simulation` is called.
    pub command_tx: Mutex<Option<mpsc::Sender<GameLoopCommand>>>,
    /// Latest snapshot, updated by the game loop thread after each pass.
    pub latest_snapshot: Arc<Mutex<Option<WorldSnapshot>>>,
    /// Bus the simulation publishes on and listens to for control events.
    pub bus: Arc<EventBus>,
    loop_thread: Mutex<Option<std::thread::JoinHandle<Option<EndReason>>>>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            command_tx: Mutex::new(None),
            latest_snapshot: Arc::new(Mutex::new(None)),
            bus: Arc::new(EventBus::new()),
            loop_thread: Mutex::new(None),
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.command_tx.lock().is_ok_and(|tx| tx.is_some())
    }

    /// Hand a constructed simulation to a new game loop thread. The
    /// simulation must publish on `self.bus`.
    pub fn start_simulation<S>(&self, sim: SimulationLoop, scheduler: S) -> Result<(), String>
    where
        S: Scheduler + Send + 'static,
    {
        let mut tx_lock = self.command_tx.lock().map_err(|e| e.to_string())?;
        if tx_lock.is_some() {
            return Err("Simulation already running".into());
        }

        let GameLoopHandle { commands, thread } =
            game_loop::spawn_game_loop(sim, scheduler, self.latest_snapshot.clone())
                .map_err(|e| format!("Failed to spawn game loop: {e}"))?;
        *tx_lock = Some(commands);
        *self.loop_thread.lock().map_err(|e| e.to_string())? = Some(thread);
        Ok(())
    }

    /// Send a player intent and wait for its outcome.
    pub fn send_intent(&self, intent: PlayerIntent) -> Result<IntentReply, String> {
        let (reply, outcome) = mpsc::channel();
        {
            let tx_lock = self.command_tx.lock().map_err(|e| e.to_string())?;
            let tx = tx_lock.as_ref().ok_or("Simulation not started")?;
            tx.send(GameLoopCommand::Intent { intent, reply })
                .map_err(|e| format!("Failed to send intent: {e}"))?;
        }
        outcome
            .recv()
            .map_err(|_| "Game loop stopped before replying".to_string())
    }

    /// Get the latest snapshot.
    pub fn get_snapshot(&self) -> Result<Option<WorldSnapshot>, String> {
        let lock = self.latest_snapshot.lock().map_err(|e| e.to_string())?;
        Ok(lock.clone())
    }

    /// Wait for the loop thread to finish. Returns how the session ended,
    /// or `None` if the thread was shut down first.
    pub fn join(&self) -> Result<Option<EndReason>, String> {
        let thread = self
            .loop_thread
            .lock()
            .map_err(|e| e.to_string())?
            .take()
            .ok_or("Simulation not started")?;
        let reason = thread
            .join()
            .map_err(|_| "Game loop thread panicked".to_string())?;
        if let Ok(mut tx) = self.command_tx.lock() {
            *tx = None;
        }
        Ok(reason)
    }

    /// Stop the loop thread and wait for it.
    pub fn shutdown(&self) -> Result<Option<EndReason>, String> {
        if let Some(tx) = self.command_tx.lock().map_err(|e| e.to_string())?.as_ref() {
            // A closed channel means the thread already returned.
            let _ = tx.send(GameLoopCommand::Shutdown);
        }
        self.join()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use metro_core::enums::LineShape;
    use metro_core::events::GameExitEvent;
    use metro_core::types::StationId;
    use metro_core::view::NullViewFactory;
    use metro_sim::clock::{Clock, ManualTimeSource};
    use metro_sim::scenario::test_map;
    use metro_sim::{ManualScheduler, SimConfig};

    use super::*;

    fn manual_sim(state: &AppState) -> (SimulationLoop, ManualScheduler) {
        let source = Arc::new(ManualTimeSource::new());
        let clock = Arc::new(Clock::with_source(Box::new(source.clone()), 1.0));
        let config = SimConfig {
            passenger_spawn: None,
            ..Default::default()
        };
        let sim = SimulationLoop::new(
            test_map(),
            config,
            clock,
            state.bus.clone(),
            Box::new(NullViewFactory),
        )
        .unwrap();
        (sim, ManualScheduler::new(source))
    }

    #[test]
    fn test_app_state_creation() {
        let state = AppState::new();
        assert!(state.command_tx.lock().unwrap().is_none());
        assert!(state.latest_snapshot.lock().unwrap().is_none());
        assert!(!state.is_running());
        assert!(state.send_intent(PlayerIntent::AssignTrain {
            line: metro_core::types::LineId(0)
        })
        .is_err());
    }

    #[test]
    fn test_intent_gets_a_reply() {
        let state = AppState::new();
        let (sim, scheduler) = manual_sim(&state);
        state.start_simulation(sim, scheduler).unwrap();
        assert!(state.is_running());
        let (second, scheduler) = manual_sim(&state);
        assert!(state.start_simulation(second, scheduler).is_err());

        let reply = state
            .send_intent(PlayerIntent::CreateLine {
                stations: vec![StationId(1), StationId(2)],
                shape: LineShape::Open,
            })
            .unwrap();
        assert!(matches!(reply, Ok(IntentOutcome::LineCreated { .. })));

        let reply = state
            .send_intent(PlayerIntent::CreateLine {
                stations: vec![StationId(0), StationId(1)],
                shape: LineShape::Open,
            })
            .unwrap();
        assert!(matches!(reply, Err(MutationError::CrossesWater { .. })));

        assert_eq!(state.shutdown().unwrap(), None);
        assert!(!state.is_running());
    }

    #[test]
    fn test_exit_event_ends_loop_thread() {
        let state = AppState::new();
        let (sim, scheduler) = manual_sim(&state);
        state.start_simulation(sim, scheduler).unwrap();

        // Let the thread run a few passes before quitting.
        while state
            .get_snapshot()
            .unwrap()
            .map_or(true, |s| s.time < Duration::from_secs(1))
        {
            std::thread::yield_now();
        }
        state.bus.publish(GameExitEvent);
        assert_eq!(state.join().unwrap(), Some(EndReason::Exit));

        let snapshot = state.get_snapshot().unwrap().unwrap();
        assert_eq!(snapshot.end_reason, Some(EndReason::Exit));
    }
}
