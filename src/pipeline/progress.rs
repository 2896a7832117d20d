//! Progress reporting and cancellation for survey batches.
//!
//! Per-flight progress is emitted from rayon threads when the `parallel`
//! feature is on, so implementations must be `Send + Sync`.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

/// Batch phases, ordered by execution sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurveyPhase {
    /// Parsing trajectory files
    Reading,
    /// Segmenting each flight into runs
    Segmenting,
    /// Cross-flight merging, ordering and boundary
    Assembling,
}

impl SurveyPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SurveyPhase::Reading => "reading",
            SurveyPhase::Segmenting => "segmenting",
            SurveyPhase::Assembling => "assembling",
        }
    }
}

/// Receives progress updates while a batch runs.
pub trait SurveyProgress: Send + Sync {
    /// Called when entering a new phase. `total` is the number of items in it.
    fn on_phase(&self, phase: SurveyPhase, total: u32);
    /// Called after completing one item in the current phase.
    fn on_progress(&self);
    /// Polled between flights. Returning true stops the batch.
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Ignores every update and never cancels.
pub struct NoopProgress;

impl SurveyProgress for NoopProgress {
    fn on_phase(&self, _phase: SurveyPhase, _total: u32) {}
    fn on_progress(&self) {}
}

/// Atomic progress tracker that can be polled and cancelled from another thread.
pub struct AtomicProgressTracker {
    pub phase: Mutex<String>,
    pub completed: AtomicU32,
    pub total: AtomicU32,
    cancelled: AtomicBool,
}

impl Default for AtomicProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl AtomicProgressTracker {
    pub fn new() -> Self {
        Self {
            phase: Mutex::new(String::new()),
            completed: AtomicU32::new(0),
            total: AtomicU32::new(0),
            cancelled: AtomicBool::new(false),
        }
    }

    /// Request that the running batch stop before its next flight.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Name of the current phase.
    pub fn current_phase(&self) -> String {
        match self.phase.lock() {
            Ok(phase) => phase.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn completed(&self) -> u32 {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> u32 {
        self.total.load(Ordering::SeqCst)
    }
}

impl SurveyProgress for AtomicProgressTracker {
    fn on_phase(&self, phase: SurveyPhase, total: u32) {
        let mut current = match self.phase.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *current = phase.as_str().to_string();
        self.completed.store(0, Ordering::SeqCst);
        self.total.store(total, Ordering::SeqCst);
    }

    fn on_progress(&self) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
