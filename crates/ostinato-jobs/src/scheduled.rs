use std::sync::Arc;

use async_trait::async_trait;

use ostinato_core::JobLogger;
use ostinato_schedule::Schedule;

use crate::engine::{Cadence, Engine};
use crate::error::JobError;
use crate::job::{Job, JobHandler};

/// Recurring job that fires at each occurrence of a calendar [`Schedule`].
///
/// The schedule is owned by the job and immutable for its lifetime. When
/// the next occurrence is more than 20 days out, the loop arms a silent
/// 15-day recheck instead of the work timer and recomputes afterwards, so
/// no single timer is ever set extremely far in the future.
pub struct ScheduledJob {
    engine: Arc<Engine>,
}

impl ScheduledJob {
    /// Fails fast when the schedule's month/day-of-month combination can
    /// never occur.
    pub fn new(
        handler: Arc<dyn JobHandler>,
        schedule: Schedule,
        logger: Arc<dyn JobLogger>,
    ) -> Result<Self, JobError> {
        schedule.validate()?;
        Ok(Self {
            engine: Arc::new(Engine::new(
                "scheduled",
                Cadence::Calendar(schedule),
                handler,
                logger,
            )),
        })
    }
}

#[async_trait]
impl Job for ScheduledJob {
    fn name(&self) -> &str {
        self.engine.name()
    }

    fn is_started(&self) -> bool {
        self.engine.is_started()
    }

    fn is_disposed(&self) -> bool {
        self.engine.is_disposed()
    }

    fn start(&self) -> Result<(), JobError> {
        self.engine.start()
    }

    async fn dispose(&self) {
        self.engine.dispose();
    }
}
