//! Registration, bootstrap, and teardown of the host's job fleet.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::ManagerError;
use crate::job::Job;
use crate::registry::{Container, FactoryContainer, JobFactory, Scope};

/// Bookkeeping for one registered job.
struct JobRegistration {
    name: String,
    instance: Option<Arc<dyn Job>>,
    /// Resolution scope owning the instance, when the container uses scopes.
    scope: Option<Box<dyn Scope>>,
}

impl JobRegistration {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            instance: None,
            scope: None,
        }
    }
}

/// Owns the job collection: resolves jobs through the container, starts
/// them together, and tears them down together.
///
/// Call order is `register_job`* → `bootstrap` → `start_jobs` → `dispose`;
/// violations surface as [`ManagerError`]s. Disposal is idempotent and
/// infallible: individual scope or container failures are logged and
/// never block the remaining teardown.
pub struct JobManager {
    container: Box<dyn Container>,
    registrations: Vec<JobRegistration>,
    bootstrapped: bool,
    disposed: bool,
}

impl JobManager {
    /// Manager over a caller-supplied container.
    pub fn new(container: Box<dyn Container>) -> Self {
        Self {
            container,
            registrations: Vec::new(),
            bootstrapped: false,
            disposed: false,
        }
    }

    /// Manager over the built-in [`FactoryContainer`].
    pub fn with_factory_container() -> Self {
        Self::new(Box::new(FactoryContainer::new()))
    }

    pub fn is_bootstrapped(&self) -> bool {
        self.bootstrapped
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Record a job under a unique name.
    ///
    /// Duplicates are rejected before the container is touched.
    pub fn register_job(&mut self, name: &str, factory: JobFactory) -> Result<(), ManagerError> {
        if self.disposed {
            return Err(ManagerError::Disposed);
        }
        if self.bootstrapped {
            return Err(ManagerError::AlreadyBootstrapped);
        }
        if self.registrations.iter().any(|r| r.name == name) {
            return Err(ManagerError::DuplicateJob {
                name: name.to_string(),
            });
        }
        self.container.register_singleton(name, factory)?;
        self.registrations.push(JobRegistration::new(name));
        Ok(())
    }

    /// Resolve every registered job into an instance.
    ///
    /// Not idempotent: a second call fails.
    pub fn bootstrap(&mut self) -> Result<(), ManagerError> {
        if self.disposed {
            return Err(ManagerError::Disposed);
        }
        if self.bootstrapped {
            return Err(ManagerError::AlreadyBootstrapped);
        }
        if self.registrations.is_empty() {
            return Err(ManagerError::NoJobs);
        }

        self.container.bootstrap()?;
        for registration in &mut self.registrations {
            match self.container.create_scope(&registration.name) {
                Some(scope) => {
                    registration.instance = Some(scope.resolve(&registration.name)?);
                    registration.scope = Some(scope);
                }
                None => {
                    registration.instance = Some(self.container.resolve(&registration.name)?);
                }
            }
        }
        self.bootstrapped = true;
        info!(jobs = self.registrations.len(), "job manager bootstrapped");
        Ok(())
    }

    /// Start every resolved job. Only legal after [`bootstrap`](Self::bootstrap).
    pub fn start_jobs(&self) -> Result<(), ManagerError> {
        if self.disposed {
            return Err(ManagerError::Disposed);
        }
        if !self.bootstrapped {
            return Err(ManagerError::NotBootstrapped);
        }
        for registration in &self.registrations {
            if let Some(job) = &registration.instance {
                job.start()?;
                info!(job = %registration.name, "job started");
            }
        }
        Ok(())
    }

    /// Dispose every job, then its scope, then the container. Idempotent.
    pub async fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        for registration in &mut self.registrations {
            if let Some(job) = &registration.instance {
                job.dispose().await;
            }
            if let Some(scope) = registration.scope.as_mut() {
                if let Err(e) = scope.dispose().await {
                    warn!(job = %registration.name, error = %e, "job scope disposal failed");
                }
            }
        }
        if let Err(e) = self.container.dispose().await {
            warn!(error = %e, "container disposal failed");
        }
    }
}
