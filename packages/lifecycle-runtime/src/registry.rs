use std::any::{Any, TypeId};
use std::sync::Arc;

use dashmap::DashMap;
use lifecycle_core::{
    resume_service, suspend_service, LifecycleOperation, ServiceState, ServiceStatus,
    StatefulService,
};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::RegistryConfig;
use crate::error::RegistryError;

// ---------------------------------------------------------------------------
// ServiceReport
// ---------------------------------------------------------------------------

/// Point-in-time lifecycle snapshot of one registered service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceReport {
    pub name: String,
    pub state: ServiceState,
    pub status: ServiceStatus,
}

// ---------------------------------------------------------------------------
// ServiceRegistry
// ---------------------------------------------------------------------------

/// Registry of lifecycle-managed services, controlled individually or as a
/// group.
///
/// Provides two lookup mechanisms:
/// - **By name** (`get_by_name`): uses the service's `name()` string
/// - **By type** (`get::<T>`): uses `TypeId` of the concrete service type
///
/// Group operations start and resume in registration order, and stop, suspend,
/// and shut down in reverse registration order.
pub struct ServiceRegistry {
    config: RegistryConfig,
    /// Name-based lookup: service name -> `Arc<dyn StatefulService>`.
    by_name: DashMap<String, Arc<dyn StatefulService>>,
    /// Type-based lookup: `TypeId` -> `Arc<dyn Any + Send + Sync>`.
    by_type: DashMap<TypeId, Arc<dyn Any + Send + Sync>>,
    /// Registration order for deterministic group sequencing.
    order: RwLock<Vec<String>>,
}

impl ServiceRegistry {
    /// Creates an empty registry with the default policy.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    #[must_use]
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            config,
            by_name: DashMap::new(),
            by_type: DashMap::new(),
            order: RwLock::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Registers a service under its `name()`.
    ///
    /// The service becomes reachable through `get::<T>()` and `get_by_name()`.
    /// Registering a second service of the same concrete type replaces the
    /// type lookup entry; name lookup keeps both.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateService`] if the name is taken.
    pub fn register<T: StatefulService + Any>(&self, service: T) -> Result<Arc<T>, RegistryError> {
        let name = service.name().to_string();
        let mut order = self.order.write();
        if self.by_name.contains_key(&name) {
            return Err(RegistryError::DuplicateService { name });
        }
        let arc = Arc::new(service);
        self.by_name.insert(name.clone(), arc.clone());
        self.by_type.insert(TypeId::of::<T>(), arc.clone());
        order.push(name);
        Ok(arc)
    }

    /// Retrieve a service by its concrete type.
    #[must_use]
    pub fn get<T: StatefulService + Any>(&self) -> Option<Arc<T>> {
        self.by_type
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.value().clone().downcast::<T>().ok())
    }

    /// Retrieve a service by its name.
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<Arc<dyn StatefulService>> {
        self.by_name.get(name).map(|entry| entry.value().clone())
    }

    /// Names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.order.read().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.read().is_empty()
    }

    /// Starts one service.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownService`] for an unregistered name, or
    /// [`RegistryError::Lifecycle`] if the hook fails.
    pub fn start(&self, name: &str) -> Result<(), RegistryError> {
        self.run_one(name, LifecycleOperation::Start, |s| s.start())
    }

    /// Stops one service.
    ///
    /// # Errors
    ///
    /// See [`ServiceRegistry::start`].
    pub fn stop(&self, name: &str) -> Result<(), RegistryError> {
        self.run_one(name, LifecycleOperation::Stop, |s| s.stop())
    }

    /// Suspends one service.
    ///
    /// # Errors
    ///
    /// See [`ServiceRegistry::start`].
    pub fn suspend(&self, name: &str) -> Result<(), RegistryError> {
        self.run_one(name, LifecycleOperation::Suspend, |s| s.suspend())
    }

    /// Resumes one service.
    ///
    /// # Errors
    ///
    /// See [`ServiceRegistry::start`].
    pub fn resume(&self, name: &str) -> Result<(), RegistryError> {
        self.run_one(name, LifecycleOperation::Resume, |s| s.resume())
    }

    /// Shuts down one service.
    ///
    /// # Errors
    ///
    /// See [`ServiceRegistry::start`].
    pub fn shutdown(&self, name: &str) -> Result<(), RegistryError> {
        self.run_one(name, LifecycleOperation::Shutdown, |s| s.shutdown())
    }

    /// Starts all services in registration order, stopping at the first
    /// failure.
    ///
    /// With `rollback_on_start_failure`, the services this call started before
    /// the failure are stopped again in reverse order. Services that were
    /// already running are left alone.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Lifecycle`] for the service that failed.
    pub fn start_all(&self) -> Result<(), RegistryError> {
        let services = self.in_order();
        let mut started = Vec::with_capacity(services.len());
        for service in &services {
            let was_running = service.state().is_starting_or_started();
            if let Err(source) = service.start() {
                let err = RegistryError::lifecycle(service.name(), LifecycleOperation::Start, source);
                if self.config.rollback_on_start_failure {
                    Self::rollback(&started);
                }
                return Err(err);
            }
            if !was_running {
                started.push(Arc::clone(service));
            }
        }
        info!(services = services.len(), "all services started");
        Ok(())
    }

    /// Stops all services in reverse registration order.
    ///
    /// # Errors
    ///
    /// Returns the first [`RegistryError::Lifecycle`]. With
    /// `continue_on_failure` the remaining services are still stopped.
    pub fn stop_all(&self) -> Result<(), RegistryError> {
        self.run_all_reverse(LifecycleOperation::Stop, |s| s.stop())
    }

    /// Shuts down all services in reverse registration order.
    ///
    /// # Errors
    ///
    /// Same policy as [`ServiceRegistry::stop_all`].
    pub fn shutdown_all(&self) -> Result<(), RegistryError> {
        self.run_all_reverse(LifecycleOperation::Shutdown, |s| s.shutdown())
    }

    /// Suspends all services in reverse registration order. Services that
    /// cannot suspend are stopped instead.
    ///
    /// # Errors
    ///
    /// Same policy as [`ServiceRegistry::stop_all`].
    pub fn suspend_all(&self) -> Result<(), RegistryError> {
        self.run_all_reverse(LifecycleOperation::Suspend, |s| {
            suspend_service(s).map(|_| ())
        })
    }

    /// Resumes all services in registration order, starting those that were
    /// stopped in place of a suspend. Stops at the first failure.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Lifecycle`] for the service that failed.
    pub fn resume_all(&self) -> Result<(), RegistryError> {
        for service in self.in_order() {
            resume_service(&*service).map_err(|source| {
                RegistryError::lifecycle(service.name(), LifecycleOperation::Resume, source)
            })?;
        }
        Ok(())
    }

    /// Snapshot of every service in registration order.
    #[must_use]
    pub fn report(&self) -> Vec<ServiceReport> {
        self.in_order()
            .iter()
            .map(|service| {
                let state = service.state();
                ServiceReport {
                    name: service.name().to_string(),
                    state,
                    status: state.status(),
                }
            })
            .collect()
    }

    fn in_order(&self) -> Vec<Arc<dyn StatefulService>> {
        self.order
            .read()
            .iter()
            .filter_map(|name| self.get_by_name(name))
            .collect()
    }

    fn run_one(
        &self,
        name: &str,
        operation: LifecycleOperation,
        op: impl FnOnce(&dyn StatefulService) -> anyhow::Result<()>,
    ) -> Result<(), RegistryError> {
        let service = self
            .get_by_name(name)
            .ok_or_else(|| RegistryError::UnknownService {
                name: name.to_string(),
            })?;
        op(&*service).map_err(|source| RegistryError::lifecycle(name, operation, source))
    }

    fn run_all_reverse(
        &self,
        operation: LifecycleOperation,
        op: impl Fn(&dyn StatefulService) -> anyhow::Result<()>,
    ) -> Result<(), RegistryError> {
        let mut first_error = None;
        for service in self.in_order().iter().rev() {
            let Err(source) = op(&**service) else {
                continue;
            };
            let err = RegistryError::lifecycle(service.name(), operation, source);
            if !self.config.continue_on_failure {
                return Err(err);
            }
            if first_error.is_none() {
                first_error = Some(err);
            } else {
                warn!(service = service.name(), %operation, error = ?err, "ignoring additional failure");
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn rollback(started: &[Arc<dyn StatefulService>]) {
        for service in started.iter().rev() {
            if let Err(err) = service.stop() {
                warn!(service = service.name(), error = %err, "failed to stop service during start rollback");
            }
        }
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
