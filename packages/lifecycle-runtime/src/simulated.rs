//! Simulated services for the demo binary and for tests.
//!
//! [`SimulatedHooks`] journals every hook call and can be told to fail a given
//! operation. [`CompositeHooks`] owns child services and drives them with the
//! group helpers from `lifecycle_core`.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use lifecycle_core::{
    resume_service, start_services, stop_and_shutdown_services, stop_services, suspend_service,
    LifecycleOperation, ServiceHooks, ServiceSupport, StatefulService,
};
use parking_lot::Mutex;
use tracing::info;

/// Shared, ordered record of hook calls as `"<operation>:<service>"`.
pub type Journal = Arc<Mutex<Vec<String>>>;

pub type SimulatedService = ServiceSupport<SimulatedHooks>;
pub type CompositeService = ServiceSupport<CompositeHooks>;

// ---------------------------------------------------------------------------
// SimulatedHooks
// ---------------------------------------------------------------------------

/// Hooks that pretend to do work: they journal, optionally sleep, and fail on
/// request.
#[derive(Debug)]
pub struct SimulatedHooks {
    name: String,
    journal: Journal,
    failures: Mutex<HashSet<LifecycleOperation>>,
    delay: Duration,
    suspendable: bool,
}

impl SimulatedHooks {
    #[must_use]
    pub fn new(name: impl Into<String>, journal: Journal) -> Self {
        Self {
            name: name.into(),
            journal,
            failures: Mutex::new(HashSet::new()),
            delay: Duration::ZERO,
            suspendable: false,
        }
    }

    /// Blocks every hook for `delay`, standing in for connection setup and
    /// teardown.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    #[must_use]
    pub fn suspendable(mut self) -> Self {
        self.suspendable = true;
        self
    }

    /// Makes the hook behind `operation` fail until [`Self::clear_failure`].
    /// `Resume` covers `do_resume`; `Shutdown` covers `do_shutdown` only.
    pub fn fail_on(&self, operation: LifecycleOperation) {
        self.failures.lock().insert(operation);
    }

    pub fn clear_failure(&self, operation: LifecycleOperation) {
        self.failures.lock().remove(&operation);
    }

    /// Wraps the hooks in a lifecycle state machine under the same name.
    #[must_use]
    pub fn into_service(self) -> SimulatedService {
        let name = self.name.clone();
        ServiceSupport::new(name, self)
    }

    fn run(&self, operation: LifecycleOperation) -> anyhow::Result<()> {
        self.journal.lock().push(format!("{operation}:{}", self.name));
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        if self.failures.lock().contains(&operation) {
            anyhow::bail!("simulated {operation} failure in {}", self.name);
        }
        info!(service = %self.name, %operation, "simulated hook completed");
        Ok(())
    }
}

impl ServiceHooks for SimulatedHooks {
    fn do_start(&self) -> anyhow::Result<()> {
        self.run(LifecycleOperation::Start)
    }

    fn do_stop(&self) -> anyhow::Result<()> {
        self.run(LifecycleOperation::Stop)
    }

    fn do_suspend(&self) -> anyhow::Result<()> {
        self.run(LifecycleOperation::Suspend)
    }

    fn do_resume(&self) -> anyhow::Result<()> {
        self.run(LifecycleOperation::Resume)
    }

    fn do_shutdown(&self) -> anyhow::Result<()> {
        self.run(LifecycleOperation::Shutdown)
    }

    fn is_suspendable(&self) -> bool {
        self.suspendable
    }
}

// ---------------------------------------------------------------------------
// CompositeHooks
// ---------------------------------------------------------------------------

/// Hooks for a service made of child services, such as a route owning its
/// consumer and processors.
///
/// Children start in order and stop, suspend, and shut down in reverse order.
pub struct CompositeHooks {
    children: Vec<Arc<dyn StatefulService>>,
}

impl CompositeHooks {
    #[must_use]
    pub fn new(children: Vec<Arc<dyn StatefulService>>) -> Self {
        Self { children }
    }

    #[must_use]
    pub fn children(&self) -> &[Arc<dyn StatefulService>] {
        &self.children
    }

    fn in_order(&self) -> Vec<&dyn StatefulService> {
        self.children.iter().map(|child| &**child).collect()
    }

    fn in_reverse(&self) -> Vec<&dyn StatefulService> {
        self.children.iter().rev().map(|child| &**child).collect()
    }
}

impl ServiceHooks for CompositeHooks {
    fn do_start(&self) -> anyhow::Result<()> {
        start_services(&self.in_order())
    }

    fn do_stop(&self) -> anyhow::Result<()> {
        stop_services(&self.in_reverse())
    }

    fn do_suspend(&self) -> anyhow::Result<()> {
        for child in self.in_reverse() {
            suspend_service(child)?;
        }
        Ok(())
    }

    fn do_resume(&self) -> anyhow::Result<()> {
        for child in self.in_order() {
            resume_service(child)?;
        }
        Ok(())
    }

    fn do_shutdown(&self) -> anyhow::Result<()> {
        stop_and_shutdown_services(&self.in_reverse())
    }

    fn is_suspendable(&self) -> bool {
        true
    }
}
