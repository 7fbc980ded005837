//! Default outcome reporter
//!
//! Logs every [`SyncOutcome`] through `tracing`: successes at `info`, benign
//! skips at `debug` and failures at `warn`.

use davsync_core::{domain::event::SyncOutcome, ports::IOutcomeReporter};
use tracing::{debug, info, warn};

/// Reporter that writes outcomes to the tracing subscriber
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl IOutcomeReporter for TracingReporter {
    fn report(&self, outcome: &SyncOutcome) {
        let local = outcome.local_path.display();
        if !outcome.success {
            warn!(
                local = %local,
                remote = %outcome.remote_path,
                kind = %outcome.kind,
                attempts = outcome.attempts,
                error = outcome.error.as_deref().unwrap_or("unknown error"),
                "Sync failed"
            );
        } else if outcome.skipped {
            debug!(
                local = %local,
                remote = %outcome.remote_path,
                kind = %outcome.kind,
                "Nothing to sync"
            );
        } else {
            info!(
                local = %local,
                remote = %outcome.remote_path,
                kind = %outcome.kind,
                attempts = outcome.attempts,
                "Synced"
            );
        }
    }
}
