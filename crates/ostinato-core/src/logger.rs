//! Job outcome logging — shared between the execution engine and host
//! applications.

use async_trait::async_trait;
use tracing::{error, info, warn};

/// Logging collaborator awaited by the job execution step.
///
/// Implementations must be `Send + Sync` so a single logger can be shared
/// across every job's timer loop. The engine awaits each call before
/// proceeding, which keeps per-job log ordering deterministic: the start
/// message always lands before the work runs, the outcome message after.
#[async_trait]
pub trait JobLogger: Send + Sync {
    /// Informational message (job starting / finished).
    async fn log_info(&self, message: &str);

    /// Warning message (a run failed; the loop keeps going).
    async fn log_warning(&self, message: &str);

    /// Error detail for a failed run.
    async fn log_error(&self, error: &anyhow::Error);
}

/// Default logger — forwards to the `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

#[async_trait]
impl JobLogger for TracingLogger {
    async fn log_info(&self, message: &str) {
        info!("{message}");
    }

    async fn log_warning(&self, message: &str) {
        warn!("{message}");
    }

    async fn log_error(&self, error: &anyhow::Error) {
        error!(error = %error, "job run failed");
    }
}
