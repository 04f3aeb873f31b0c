//! Game loop thread: owns the simulation loop and drives its passes.
//!
//! Intents arrive via `mpsc` channel and are applied between passes, so the
//! thread stays the only writer of the World. Control events (pause,
//! resume, speed, exit) travel over the event bus instead. Snapshots are
//! stored in shared state for polling.

use std::io;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use metro_core::enums::{EndReason, LoopState};
use metro_core::state::WorldSnapshot;
use metro_sim::scheduler::Scheduler;
use metro_sim::SimulationLoop;

use crate::state::GameLoopCommand;

/// Sender for the loop thread plus the thread itself. The thread returns
/// how the session ended, or `None` when shut down first.
pub struct GameLoopHandle {
    pub commands: mpsc::Sender<GameLoopCommand>,
    pub thread: JoinHandle<Option<EndReason>>,
}

/// Spawns the game loop in a new thread and starts the session.
pub fn spawn_game_loop<S>(
    sim: SimulationLoop,
    scheduler: S,
    latest_snapshot: Arc<Mutex<Option<WorldSnapshot>>>,
) -> io::Result<GameLoopHandle>
where
    S: Scheduler + Send + 'static,
{
    let (cmd_tx, cmd_rx) = mpsc::channel::<GameLoopCommand>();

    let thread = std::thread::Builder::new()
        .name("metro-game-loop".into())
        .spawn(move || run_game_loop(sim, scheduler, cmd_rx, &latest_snapshot))?;

    Ok(GameLoopHandle {
        commands: cmd_tx,
        thread,
    })
}

/// The game loop. Runs until the session ends, a Shutdown command arrives
/// or the channel disconnects.
fn run_game_loop<S: Scheduler>(
    mut sim: SimulationLoop,
    mut scheduler: S,
    cmd_rx: mpsc::Receiver<GameLoopCommand>,
    latest_snapshot: &Mutex<Option<WorldSnapshot>>,
) -> Option<EndReason> {
    sim.start();
    tracing::info!("game loop started");

    loop {
        // 1. Drain all pending commands
        loop {
            match cmd_rx.try_recv() {
                Ok(GameLoopCommand::Intent { intent, reply }) => {
                    // The requester may have stopped waiting.
                    let _ = reply.send(sim.apply_intent(intent));
                }
                Ok(GameLoopCommand::Shutdown) | Err(mpsc::TryRecvError::Disconnected) => {
                    tracing::info!("game loop shut down");
                    return sim.end_reason();
                }
                Err(mpsc::TryRecvError::Empty) => break,
            }
        }

        // 2. Catch up every due tick
        let report = sim.evaluate();

        // 3. Store latest snapshot for polling
        if let Ok(mut lock) = latest_snapshot.lock() {
            *lock = Some(sim.snapshot());
        }

        if report.state == LoopState::Ended {
            tracing::info!(reason = ?sim.end_reason(), "game loop finished");
            return sim.end_reason();
        }

        // 4. Suspend until the next pass
        scheduler.wait(sim.config().refresh_delay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metro_core::commands::PlayerIntent;
    use metro_core::types::LineId;
    use metro_core::view::NullViewFactory;
    use metro_sim::clock::{Clock, ManualTimeSource};
    use metro_sim::event_bus::EventBus;
    use metro_sim::scenario::test_map;
    use metro_sim::{ManualScheduler, SimConfig};
    use std::time::{Duration, Instant};

    fn manual_sim(config: SimConfig) -> (SimulationLoop, ManualScheduler) {
        let source = Arc::new(ManualTimeSource::new());
        let clock = Arc::new(Clock::with_source(Box::new(source.clone()), 1.0));
        let sim = SimulationLoop::new(
            test_map(),
            config,
            clock,
            Arc::new(EventBus::new()),
            Box::new(NullViewFactory),
        )
        .unwrap();
        (sim, ManualScheduler::new(source))
    }

    #[test]
    fn test_command_channel_round_trip() {
        let (tx, rx) = mpsc::channel::<GameLoopCommand>();
        let (reply, _outcome) = mpsc::channel();

        tx.send(GameLoopCommand::Intent {
            intent: PlayerIntent::AssignTrain { line: LineId(0) },
            reply,
        })
        .unwrap();
        tx.send(GameLoopCommand::Shutdown).unwrap();

        let mut commands = Vec::new();
        while let Ok(cmd) = rx.try_recv() {
            commands.push(cmd);
        }

        assert_eq!(commands.len(), 2);
        assert!(matches!(
            commands[0],
            GameLoopCommand::Intent {
                intent: PlayerIntent::AssignTrain { .. },
                ..
            }
        ));
        assert!(matches!(commands[1], GameLoopCommand::Shutdown));
    }

    #[test]
    fn test_loop_runs_until_overcrowded() {
        // Nobody moves passengers, so some station fails after its grace.
        let (sim, scheduler) = manual_sim(SimConfig::default());
        let latest = Arc::new(Mutex::new(None));
        let handle = spawn_game_loop(sim, scheduler, latest.clone()).unwrap();

        let reason = handle.thread.join().unwrap();
        assert!(matches!(reason, Some(EndReason::Overcrowded { .. })));
        let snapshot = latest.lock().unwrap().clone().unwrap();
        assert_eq!(snapshot.state, LoopState::Ended);
        assert!(snapshot.time > Duration::from_secs(45));
    }

    #[test]
    fn test_dropped_sender_stops_thread() {
        let config = SimConfig {
            passenger_spawn: None,
            ..Default::default()
        };
        let (sim, scheduler) = manual_sim(config);
        let handle = spawn_game_loop(sim, scheduler, Arc::new(Mutex::new(None))).unwrap();
        drop(handle.commands);
        assert_eq!(handle.thread.join().unwrap(), None);
    }

    #[test]
    fn test_snapshot_serialization_under_3ms() {
        let (mut sim, mut scheduler) = manual_sim(SimConfig::default());
        sim.start();
        for _ in 0..2_000 {
            sim.evaluate();
            scheduler.wait(sim.config().refresh_delay);
        }

        let snapshot = sim.snapshot();
        let start = Instant::now();
        let json = serde_json::to_string(&snapshot).unwrap();
        let elapsed = start.elapsed();

        assert!(
            elapsed < Duration::from_millis(3),
            "Snapshot serialization took {:?}, should be <3ms",
            elapsed
        );
        assert!(json.contains("\"stations\""));
    }
}
