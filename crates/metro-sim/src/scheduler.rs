//! How `SimulationLoop::run` waits between evaluation passes.

use std::sync::Arc;
use std::time::Duration;

use crate::clock::ManualTimeSource;

pub trait Scheduler {
    /// Block (or pretend to) for `delay` of wall time.
    fn wait(&mut self, delay: Duration);
}

/// Sleeps the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadScheduler;

impl Scheduler for ThreadScheduler {
    fn wait(&mut self, delay: Duration) {
        std::thread::sleep(delay);
    }
}

/// Advances a manual time source instead of sleeping. Pair it with a
/// `Clock` reading the same source to run a session in no wall time.
#[derive(Debug, Clone)]
pub struct ManualScheduler {
    source: Arc<ManualTimeSource>,
    waits: usize,
}

impl ManualScheduler {
    pub fn new(source: Arc<ManualTimeSource>) -> Self {
        Self { source, waits: 0 }
    }

    /// Number of `wait` calls so far.
    pub fn waits(&self) -> usize {
        self.waits
    }
}

impl Scheduler for ManualScheduler {
    fn wait(&mut self, delay: Duration) {
        self.waits += 1;
        self.source.advance(delay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::TimeSource;

    #[test]
    fn manual_scheduler_advances_source() {
        let source = Arc::new(ManualTimeSource::new());
        let mut scheduler = ManualScheduler::new(source.clone());
        scheduler.wait(Duration::from_millis(15));
        scheduler.wait(Duration::from_millis(15));
        assert_eq!(source.elapsed(), Duration::from_millis(30));
        assert_eq!(scheduler.waits(), 2);
    }
}
