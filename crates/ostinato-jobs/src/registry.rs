//! Container boundary — how the manager resolves job instances.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;

use crate::job::Job;

/// Builds one job instance. Registered under a unique name.
pub type JobFactory = Box<dyn Fn() -> Arc<dyn Job> + Send + Sync>;

/// Unit-of-lifetime boundary for a single job and its dependencies.
#[async_trait]
pub trait Scope: Send + Sync {
    /// Resolve the scope's job instance.
    fn resolve(&self, name: &str) -> anyhow::Result<Arc<dyn Job>>;

    /// Release everything created within the scope.
    async fn dispose(&mut self) -> anyhow::Result<()>;
}

/// Narrow view of the dependency-injection container the manager drives.
///
/// The manager never learns how instances are constructed; errors cross
/// this boundary as opaque `anyhow` values. [`FactoryContainer`] is the
/// built-in implementation for hosts without a DI layer.
#[async_trait]
pub trait Container: Send + Sync {
    /// Record a singleton factory under `name`.
    fn register_singleton(&mut self, name: &str, factory: JobFactory) -> anyhow::Result<()>;

    /// Build registered instances. Called exactly once, before any resolve.
    fn bootstrap(&mut self) -> anyhow::Result<()>;

    /// Look up the instance registered under `name`.
    fn resolve(&self, name: &str) -> anyhow::Result<Arc<dyn Job>>;

    /// Open a per-job resolution scope, when the container supports scopes.
    fn create_scope(&self, _name: &str) -> Option<Box<dyn Scope>> {
        None
    }

    /// Release every container-managed resource.
    async fn dispose(&mut self) -> anyhow::Result<()>;
}

/// Singleton-only container backed by an explicit name → factory map.
///
/// Jobs are singletons here (the manager disposes the instances
/// themselves), so [`Container::create_scope`] keeps its no-scope default.
#[derive(Default)]
pub struct FactoryContainer {
    factories: HashMap<String, JobFactory>,
    instances: HashMap<String, Arc<dyn Job>>,
    bootstrapped: bool,
}

impl FactoryContainer {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Container for FactoryContainer {
    fn register_singleton(&mut self, name: &str, factory: JobFactory) -> anyhow::Result<()> {
        if self.bootstrapped {
            return Err(anyhow!("container already bootstrapped"));
        }
        if self.factories.contains_key(name) {
            return Err(anyhow!("already registered: {name}"));
        }
        self.factories.insert(name.to_string(), factory);
        Ok(())
    }

    fn bootstrap(&mut self) -> anyhow::Result<()> {
        if self.bootstrapped {
            return Err(anyhow!("container already bootstrapped"));
        }
        for (name, factory) in &self.factories {
            self.instances.insert(name.clone(), factory());
        }
        self.bootstrapped = true;
        Ok(())
    }

    fn resolve(&self, name: &str) -> anyhow::Result<Arc<dyn Job>> {
        if !self.bootstrapped {
            return Err(anyhow!("container not bootstrapped"));
        }
        self.instances
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow!("not registered: {name}"))
    }

    async fn dispose(&mut self) -> anyhow::Result<()> {
        self.instances.clear();
        self.factories.clear();
        Ok(())
    }
}
