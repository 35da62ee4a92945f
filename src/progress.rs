//! Progress reporting
//!
//! The pipeline emits coarse milestones as `(percent, message, detail)`
//! events. Observers must be cheap and must not block; the pipeline never
//! depends on anyone listening.

use std::sync::atomic::{AtomicU8, Ordering};

/// A progress milestone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    /// 0 to 100
    pub percent: u8,
    pub message: String,
    pub detail: String,
}

/// Receives progress milestones
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

impl<F> ProgressObserver for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn on_progress(&self, event: &ProgressEvent) {
        self(event)
    }
}

/// Logs each milestone through `tracing`
#[derive(Debug, Default)]
pub struct TracingObserver;

impl ProgressObserver for TracingObserver {
    fn on_progress(&self, event: &ProgressEvent) {
        tracing::info!(
            percent = event.percent,
            detail = %event.detail,
            "[{:>3}%] {}",
            event.percent,
            event.message
        );
    }
}

/// Discards every milestone
#[derive(Debug, Default)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {
    fn on_progress(&self, _event: &ProgressEvent) {}
}

/// Clamps percentages and keeps them from moving backwards
///
/// Stages compute their own percentages from local counts; this keeps the
/// stream seen by observers monotonic.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    last: AtomicU8,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the percent to publish for a requested value
    pub fn advance(&self, requested: u8) -> u8 {
        let requested = requested.min(100);
        let previous = self.last.fetch_max(requested, Ordering::SeqCst);
        previous.max(requested)
    }

    pub fn current(&self) -> u8 {
        self.last.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_closure_observer_receives_events() {
        let seen = Mutex::new(Vec::new());
        let observer = |event: &ProgressEvent| seen.lock().unwrap().push(event.percent);

        let event = ProgressEvent {
            percent: 42,
            message: "Collecting".to_string(),
            detail: "relays".to_string(),
        };
        observer.on_progress(&event);

        assert_eq!(*seen.lock().unwrap(), vec![42]);
    }

    #[test]
    fn test_tracker_is_monotonic_and_clamped() {
        let tracker = ProgressTracker::new();
        assert_eq!(tracker.advance(30), 30);
        assert_eq!(tracker.advance(10), 30);
        assert_eq!(tracker.advance(250), 100);
        assert_eq!(tracker.current(), 100);
    }
}
