use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use ostinato_core::config::MAX_INTERVAL;
use ostinato_core::JobLogger;

use crate::engine::{Cadence, Engine};
use crate::error::JobError;
use crate::job::{Job, JobHandler};

/// Recurring job that fires on a fixed interval.
///
/// The interval is validated at construction: at most [`MAX_INTERVAL`]
/// (12 hours). Zero is allowed and fires back-to-back.
pub struct TimedJob {
    engine: Arc<Engine>,
}

impl TimedJob {
    pub fn new(
        handler: Arc<dyn JobHandler>,
        interval: Duration,
        logger: Arc<dyn JobLogger>,
    ) -> Result<Self, JobError> {
        if interval > MAX_INTERVAL {
            return Err(JobError::IntervalOutOfRange {
                actual: interval,
                max: MAX_INTERVAL,
            });
        }
        Ok(Self {
            engine: Arc::new(Engine::new(
                "timed",
                Cadence::Interval(interval),
                handler,
                logger,
            )),
        })
    }
}

#[async_trait]
impl Job for TimedJob {
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
