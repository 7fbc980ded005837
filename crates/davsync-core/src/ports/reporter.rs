//! Outcome reporting port (driving side of logging/reporting)
//!
//! Every dispatched intent ends in exactly one [`SyncOutcome`], which is
//! handed to an [`IOutcomeReporter`]. The default implementation logs
//! through `tracing`; tests and embedders can collect outcomes instead.

use crate::domain::event::SyncOutcome;

/// Port trait for receiving sync outcomes
///
/// Called from concurrent dispatch units; implementations must be cheap
/// and must not block for long.
pub trait IOutcomeReporter: Send + Sync {
    /// Receives the terminal outcome of one dispatched intent
    fn report(&self, outcome: &SyncOutcome);
}
