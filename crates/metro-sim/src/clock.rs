//! Scaled, pausable simulation time.
//!
//! `Clock` converts wall-clock time from a `TimeSource` into simulation
//! time. The speed multiplier only ever applies to wall time elapsed after
//! it was set: every state change first folds the time elapsed so far into
//! an accumulator at the previous multiplier.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use metro_core::constants::MAX_SPEED_MULTIPLIER;

/// Monotonic wall-clock source.
pub trait TimeSource: Send + Sync {
    /// Wall time elapsed since an arbitrary fixed origin.
    fn elapsed(&self) -> Duration;
}

impl<T: TimeSource + ?Sized> TimeSource for Arc<T> {
    fn elapsed(&self) -> Duration {
        (**self).elapsed()
    }
}

/// Real time, measured from construction.
#[derive(Debug)]
pub struct SystemTimeSource {
    origin: Instant,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemTimeSource {
    fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Wall time that only moves when told to. Shared between a test (or the
/// `ManualScheduler`) and the clock reading it.
#[derive(Debug, Default)]
pub struct ManualTimeSource {
    nanos: AtomicU64,
}

impl ManualTimeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        let by = u64::try_from(by.as_nanos()).unwrap_or(u64::MAX);
        let _ = self
            .nanos
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| Some(n.saturating_add(by)));
    }
}

impl TimeSource for ManualTimeSource {
    fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}

#[derive(Debug)]
struct ClockState {
    /// Scaled time accumulated up to `anchor`.
    accumulated: Duration,
    /// Wall time at which `accumulated` was last folded.
    anchor: Duration,
    speed: f64,
    started: bool,
    running: bool,
    ended: bool,
}

impl ClockState {
    fn scaled_since_anchor(&self, wall: Duration) -> Duration {
        if !self.running {
            return Duration::ZERO;
        }
        let elapsed = wall.saturating_sub(self.anchor);
        // Exact at normal speed; float scaling can drop a nanosecond.
        if self.speed == 1.0 {
            return elapsed;
        }
        elapsed.mul_f64(self.speed)
    }

    fn fold(&mut self, wall: Duration) {
        let wall = wall.max(self.anchor);
        self.accumulated += self.scaled_since_anchor(wall);
        self.anchor = wall;
    }
}

/// Process-scoped simulation clock. Share it as `Arc<Clock>`.
///
/// The source is only read with the state lock held.
pub struct Clock {
    source: Box<dyn TimeSource>,
    state: Mutex<ClockState>,
}

impl std::fmt::Debug for Clock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("Clock")
            .field("accumulated", &state.accumulated)
            .field("speed", &state.speed)
            .field("running", &state.running)
            .field("ended", &state.ended)
            .finish()
    }
}

impl Clock {
    /// A clock driven by real time.
    pub fn new(speed: f64) -> Self {
        Self::with_source(Box::new(SystemTimeSource::new()), speed)
    }

    pub fn with_source(source: Box<dyn TimeSource>, speed: f64) -> Self {
        Self {
            source,
            state: Mutex::new(ClockState {
                accumulated: Duration::ZERO,
                anchor: Duration::ZERO,
                speed: clamp_speed(speed),
                started: false,
                running: false,
                ended: false,
            }),
        }
    }

    /// Current scaled simulation time. Zero until `start`.
    pub fn now(&self) -> Duration {
        let state = self.lock();
        let wall = self.source.elapsed();
        state.accumulated + state.scaled_since_anchor(wall)
    }

    /// Begin counting. Later calls do nothing.
    pub fn start(&self) {
        let mut state = self.lock();
        let wall = self.source.elapsed();
        if state.started || state.ended {
            return;
        }
        state.started = true;
        state.running = true;
        state.anchor = wall;
    }

    pub fn pause(&self) {
        let mut state = self.lock();
        let wall = self.source.elapsed();
        if state.ended || !state.running {
            return;
        }
        state.fold(wall);
        state.running = false;
    }

    pub fn resume(&self) {
        let mut state = self.lock();
        let wall = self.source.elapsed();
        if state.ended || !state.started || state.running {
            return;
        }
        state.anchor = wall.max(state.anchor);
        state.running = true;
    }

    /// Change the multiplier for time elapsed from now on. Out-of-range
    /// values are clamped; 0 behaves like a pause.
    pub fn set_speed(&self, multiplier: f64) {
        let clamped = clamp_speed(multiplier);
        if clamped != multiplier {
            tracing::warn!(requested = multiplier, applied = clamped, "speed multiplier clamped");
        }
        let mut state = self.lock();
        let wall = self.source.elapsed();
        if state.ended {
            return;
        }
        state.fold(wall);
        state.speed = clamped;
    }

    pub fn speed(&self) -> f64 {
        self.lock().speed
    }

    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    /// Freeze time for good. Every later mutator is ignored.
    pub fn end(&self) {
        let mut state = self.lock();
        let wall = self.source.elapsed();
        if state.ended {
            return;
        }
        state.fold(wall);
        state.running = false;
        state.ended = true;
    }

    fn lock(&self) -> MutexGuard<'_, ClockState> {
        // State is updated atomically under the lock, so a poisoned guard
        // still holds a consistent value.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn clamp_speed(multiplier: f64) -> f64 {
    if multiplier.is_nan() {
        return 0.0;
    }
    multiplier.clamp(0.0, MAX_SPEED_MULTIPLIER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::thread;

    fn manual_clock(speed: f64) -> (Arc<ManualTimeSource>, Clock) {
        let source = Arc::new(ManualTimeSource::new());
        let clock = Clock::with_source(Box::new(source.clone()), speed);
        (source, clock)
    }

    #[test]
    fn test_zero_before_start() {
        let (source, clock) = manual_clock(1.0);
        source.advance(Duration::from_secs(5));
        assert_eq!(clock.now(), Duration::ZERO);
        clock.start();
        source.advance(Duration::from_millis(250));
        assert_eq!(clock.now(), Duration::from_millis(250));
    }

    #[test]
    fn test_pause_freezes_time() {
        let (source, clock) = manual_clock(1.0);
        clock.start();
        source.advance(Duration::from_secs(1));
        clock.pause();
        source.advance(Duration::from_secs(10));
        assert_eq!(clock.now(), Duration::from_secs(1));
        clock.resume();
        source.advance(Duration::from_secs(1));
        assert_eq!(clock.now(), Duration::from_secs(2));
    }

    #[test]
    fn test_speed_change_is_not_retroactive() {
        let (source, clock) = manual_clock(1.0);
        clock.start();
        source.advance(Duration::from_secs(2));
        clock.set_speed(3.0);
        assert_eq!(clock.now(), Duration::from_secs(2));
        source.advance(Duration::from_secs(1));
        assert_eq!(clock.now(), Duration::from_secs(5));
    }

    #[test]
    fn test_negative_speed_clamps_to_pause() {
        let (source, clock) = manual_clock(1.0);
        clock.start();
        source.advance(Duration::from_secs(1));
        clock.set_speed(-2.0);
        assert_eq!(clock.speed(), 0.0);
        source.advance(Duration::from_secs(4));
        assert_eq!(clock.now(), Duration::from_secs(1));

        clock.set_speed(f64::NAN);
        assert_eq!(clock.speed(), 0.0);
        clock.set_speed(1000.0);
        assert_eq!(clock.speed(), MAX_SPEED_MULTIPLIER);
    }

    #[test]
    fn test_end_freezes_forever() {
        let (source, clock) = manual_clock(1.0);
        clock.start();
        source.advance(Duration::from_secs(3));
        clock.end();
        clock.resume();
        clock.set_speed(2.0);
        source.advance(Duration::from_secs(3));
        assert_eq!(clock.now(), Duration::from_secs(3));
        assert!(!clock.is_running());
    }

    struct GatedSource {
        inner: ManualTimeSource,
        gate: Mutex<Option<(mpsc::Sender<()>, mpsc::Receiver<()>)>>,
    }

    impl TimeSource for GatedSource {
        fn elapsed(&self) -> Duration {
            let wall = self.inner.elapsed();
            let gate = self.gate.lock().unwrap().take();
            if let Some((parked, release)) = gate {
                parked.send(()).unwrap();
                release.recv().unwrap();
            }
            wall
        }
    }

    #[test]
    fn test_now_stays_monotonic_across_threads() {
        let source = Arc::new(GatedSource {
            inner: ManualTimeSource::new(),
            gate: Mutex::new(None),
        });
        let clock = Arc::new(Clock::with_source(Box::new(source.clone()), 1.0));
        clock.start();
        source.inner.advance(Duration::from_secs(2));

        let (parked_tx, parked_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        *source.gate.lock().unwrap() = Some((parked_tx, release_rx));

        // Park the pausing thread right after it reads wall = 2s.
        let pauser = {
            let clock = clock.clone();
            thread::spawn(move || clock.set_speed(0.0))
        };
        parked_rx.recv().unwrap();
        source.inner.advance(Duration::from_secs(1));

        let reader = {
            let clock = clock.clone();
            thread::spawn(move || clock.now())
        };
        thread::sleep(Duration::from_millis(20));
        release_tx.send(()).unwrap();
        pauser.join().unwrap();
        let observed = reader.join().unwrap();

        let later = clock.now();
        assert!(later >= observed, "now() went from {observed:?} back to {later:?}");
        assert_eq!(later, Duration::from_secs(2));
    }

    #[test]
    fn test_fold_never_moves_anchor_backwards() {
        let mut state = ClockState {
            accumulated: Duration::from_secs(3),
            anchor: Duration::from_secs(3),
            speed: 2.0,
            started: true,
            running: true,
            ended: false,
        };
        state.fold(Duration::from_secs(2));
        assert_eq!(state.anchor, Duration::from_secs(3));
        assert_eq!(state.accumulated, Duration::from_secs(3));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Advance(u64),
        Pause,
        Resume,
        Speed(f64),
        End,
    }

    fn op_strategy() -> impl proptest::strategy::Strategy<Value = Op> {
        use proptest::prelude::*;
        prop_oneof![
            4 => (0u64..5_000).prop_map(Op::Advance),
            1 => Just(Op::Pause),
            1 => Just(Op::Resume),
            2 => (-4.0f64..12.0).prop_map(Op::Speed),
            1 => Just(Op::End),
        ]
    }

    proptest::proptest! {
        #[test]
        fn prop_now_is_monotonic(ops in proptest::collection::vec(op_strategy(), 0..64)) {
            let (source, clock) = manual_clock(1.0);
            clock.start();
            let mut last = clock.now();
            for op in ops {
                match op {
                    Op::Advance(ms) => source.advance(Duration::from_millis(ms)),
                    Op::Pause => clock.pause(),
                    Op::Resume => clock.resume(),
                    Op::Speed(s) => clock.set_speed(s),
                    Op::End => clock.end(),
                }
                let now = clock.now();
                proptest::prop_assert!(now >= last);
                last = now;
            }
        }
    }
}
