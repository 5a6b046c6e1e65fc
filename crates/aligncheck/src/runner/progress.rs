//! Suite progress notifications.
//!
//! [`run_suite`](super::run_suite) reports each scenario as it starts and
//! finishes. Closures can be passed directly as callbacks.

use crate::model::{RunId, ScenarioStatus, SuiteStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    SuiteStarted {
        run_id: RunId,
        suite: String,
        /// Scenarios selected by the filter, skipped ones included.
        total: usize,
    },
    ScenarioStarted {
        /// 1-based position among the selected scenarios.
        index: usize,
        total: usize,
        name: String,
    },
    ScenarioFinished {
        index: usize,
        name: String,
        status: ScenarioStatus,
        duration_ms: u64,
        /// Compared files equal to their fixture.
        matched: usize,
        /// Compared files that mismatched, lacked a fixture or were never produced.
        failed: usize,
        /// Error headline or skip reason.
        message: Option<String>,
    },
    SuiteFinished {
        run_id: RunId,
        status: SuiteStatus,
        duration_ms: u64,
    },
}

/// Receives [`ProgressEvent`]s in order from the thread running the suite.
pub trait ProgressCallback: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

impl<F> ProgressCallback for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn on_progress(&self, event: &ProgressEvent) {
        self(event);
    }
}

/// Discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopProgress;

impl ProgressCallback for NoopProgress {
    fn on_progress(&self, _event: &ProgressEvent) {}
}

/// Keeps every event for later inspection.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingProgress {
    events: std::sync::Mutex<Vec<ProgressEvent>>,
}

#[cfg(test)]
impl RecordingProgress {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
impl ProgressCallback for RecordingProgress {
    fn on_progress(&self, event: &ProgressEvent) {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(event.clone());
    }
}
