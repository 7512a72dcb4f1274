//! Shared timer loop driving both job shapes.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::error;

use ostinato_core::config::{LONG_DELAY_THRESHOLD, RECHECK_DELAY};
use ostinato_core::JobLogger;
use ostinato_schedule::{Schedule, ScheduleError};

use crate::error::JobError;
use crate::job::JobHandler;

/// How a job derives the delay to its next fire.
pub(crate) enum Cadence {
    /// Fixed delay between fires.
    Interval(Duration),
    /// Delay to the schedule's next occurrence.
    Calendar(Schedule),
}

/// One armed timer: either a real fire or a silent recheck.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Wait {
    /// Sleep, then run the execution step.
    Fire(Duration),
    /// Sleep, then recompute. No work, no logging.
    Recheck(Duration),
}

impl Cadence {
    /// Compute the next timer to arm, relative to `now`.
    ///
    /// Calendar delays beyond [`LONG_DELAY_THRESHOLD`] arm a
    /// [`Wait::Recheck`] of [`RECHECK_DELAY`] instead of the work timer;
    /// the delay is recomputed against a fresh now when it expires.
    pub(crate) fn next_wait(&self, now: DateTime<Utc>) -> Result<Wait, ScheduleError> {
        match self {
            Cadence::Interval(interval) => Ok(Wait::Fire(*interval)),
            Cadence::Calendar(schedule) => {
                let next = schedule.next_occurrence(now)?;
                let delay = (next - now).to_std().unwrap_or(Duration::ZERO);
                if delay > LONG_DELAY_THRESHOLD {
                    Ok(Wait::Recheck(RECHECK_DELAY))
                } else {
                    Ok(Wait::Fire(delay))
                }
            }
        }
    }
}

/// Monotonic lifecycle flags: `Idle → Running → Disposed`.
#[derive(Debug, Default)]
struct Flags {
    started: bool,
    disposed: bool,
}

/// State and loop shared by [`TimedJob`](crate::TimedJob) and
/// [`ScheduledJob`](crate::ScheduledJob).
///
/// One engine owns exactly one pending timer: the loop arms the next sleep
/// only after the current execution step, including its logging, has
/// completed, so fires of the same job never overlap.
pub(crate) struct Engine {
    name: String,
    /// `"timed"` or `"scheduled"`; log message wording only.
    kind: &'static str,
    cadence: Cadence,
    handler: Arc<dyn JobHandler>,
    logger: Arc<dyn JobLogger>,
    flags: Mutex<Flags>,
    cancel: CancellationToken,
}

impl Engine {
    pub(crate) fn new(
        kind: &'static str,
        cadence: Cadence,
        handler: Arc<dyn JobHandler>,
        logger: Arc<dyn JobLogger>,
    ) -> Self {
        Self {
            name: handler.name().to_string(),
            kind,
            cadence,
            handler,
            logger,
            flags: Mutex::new(Flags::default()),
            cancel: CancellationToken::new(),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn is_started(&self) -> bool {
        self.flags.lock().expect("job flags poisoned").started
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.flags.lock().expect("job flags poisoned").disposed
    }

    pub(crate) fn start(self: &Arc<Self>) -> Result<(), JobError> {
        {
            let mut flags = self.flags.lock().expect("job flags poisoned");
            if flags.disposed {
                return Err(JobError::Disposed {
                    name: self.name.clone(),
                });
            }
            if flags.started {
                return Err(JobError::AlreadyStarted {
                    name: self.name.clone(),
                });
            }
            flags.started = true;
        }

        let engine = Arc::clone(self);
        tokio::spawn(async move { engine.run_loop().await });
        Ok(())
    }

    pub(crate) fn dispose(&self) {
        {
            let mut flags = self.flags.lock().expect("job flags poisoned");
            if flags.disposed {
                return;
            }
            flags.disposed = true;
        }
        // Cancels the armed sleep; in-flight work is left to finish.
        self.cancel.cancel();
    }

    async fn run_loop(&self) {
        loop {
            let wait = match self.cadence.next_wait(Utc::now()) {
                Ok(wait) => wait,
                Err(e) => {
                    // Unreachable after construction-time validation.
                    error!(job = %self.name, error = %e, "schedule became invalid; stopping job loop");
                    break;
                }
            };
            let (delay, fire) = match wait {
                Wait::Fire(delay) => (delay, true),
                Wait::Recheck(delay) => (delay, false),
            };

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
            if self.is_disposed() {
                break;
            }
            if !fire {
                // Recheck tick: recompute against a fresh now, nothing else.
                continue;
            }

            self.execute_step().await;
        }
    }

    /// One full cycle: start log, run the handler, outcome log.
    async fn execute_step(&self) {
        self.logger
            .log_info(&format!("Starting to run {} job {}.", self.kind, self.name))
            .await;

        let handler = Arc::clone(&self.handler);
        // Own task, so a panicking handler cannot take the loop down with it.
        let outcome = tokio::spawn(async move { handler.run().await }).await;

        match outcome {
            Ok(Ok(())) => {
                self.logger
                    .log_info(&format!(
                        "Finished running {} job {}.",
                        self.kind, self.name
                    ))
                    .await;
            }
            Ok(Err(e)) => {
                self.logger
                    .log_warning(&format!("Failed to run {} job {}.", self.kind, self.name))
                    .await;
                self.logger.log_error(&e).await;
            }
            Err(join_error) => {
                self.logger
                    .log_warning(&format!("Failed to run {} job {}.", self.kind, self.name))
                    .await;
                self.logger.log_error(&anyhow::Error::from(join_error)).await;
            }
        }
    }
}
