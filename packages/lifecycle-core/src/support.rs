//! Thread-safe lifecycle state machine shared by every long-lived service.
//!
//! [`ServiceSupport`] wraps a [`ServiceHooks`] implementation and turns the five
//! public operations into atomic critical sections: each takes the instance
//! lock, checks whether the call is a no-op for the current state, and
//! otherwise moves through `<phase>ing -> <phase>ed`, or to `Failed` when the
//! hook errors.

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::state::{AtomicServiceState, LifecycleOperation, ServiceState, ServiceStatus};
use crate::traits::{ServiceHooks, StatefulService};

// ---------------------------------------------------------------------------
// ServiceSupport
// ---------------------------------------------------------------------------

/// Lifecycle state machine around a set of hooks.
///
/// State and lock belong to this instance alone. Queries read the state
/// without locking; transitions are serialized by the lock, so the sequence
/// of states a reader can observe follows some total order of the calls made.
///
/// # Deadlocks
///
/// The lock is not reentrant. A hook that calls `start`, `stop`, `suspend`,
/// `resume`, or `shutdown` on its own `ServiceSupport` blocks forever.
/// `shutdown` runs the stop protocol internally without re-locking.
#[derive(Debug)]
pub struct ServiceSupport<H> {
    name: String,
    state: AtomicServiceState,
    lock: Mutex<()>,
    hooks: H,
}

impl<H: ServiceHooks> ServiceSupport<H> {
    /// Creates a service in the `New` state.
    #[must_use]
    pub fn new(name: impl Into<String>, hooks: H) -> Self {
        Self {
            name: name.into(),
            state: AtomicServiceState::new(ServiceState::New),
            lock: Mutex::new(()),
            hooks,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The wrapped hooks, for access to the service's own API.
    #[must_use]
    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    /// Starts the service. A no-op while starting or started.
    ///
    /// # Errors
    ///
    /// Returns the `do_start` error unchanged; the service is then `Failed`.
    pub fn start(&self) -> anyhow::Result<()> {
        let _guard = self.lock.lock();
        let current = self.state.load();
        if current.is_starting_or_started() {
            self.skip(LifecycleOperation::Start, current);
            return Ok(());
        }
        self.transition(
            LifecycleOperation::Start,
            ServiceState::Starting,
            ServiceState::Started,
            || self.hooks.do_start(),
        )
    }

    /// Stops the service. A no-op while stopping, stopped, or shut down.
    ///
    /// A `New` or `Failed` service still runs `do_stop`.
    ///
    /// # Errors
    ///
    /// Returns the `do_stop` error unchanged; the service is then `Failed`.
    pub fn stop(&self) -> anyhow::Result<()> {
        let _guard = self.lock.lock();
        self.stop_locked()
    }

    /// Suspends a started service. A no-op in every other state.
    ///
    /// `Suspending` and `Suspended` are only ever entered from `Started`, so a
    /// `New`, `Stopped`, or `Failed` service is left as it is rather than
    /// moved to `Suspending`.
    ///
    /// # Errors
    ///
    /// Returns the `do_suspend` error unchanged; the service is then `Failed`.
    pub fn suspend(&self) -> anyhow::Result<()> {
        let _guard = self.lock.lock();
        let current = self.state.load();
        if current != ServiceState::Started {
            self.skip(LifecycleOperation::Suspend, current);
            return Ok(());
        }
        self.transition(
            LifecycleOperation::Suspend,
            ServiceState::Suspending,
            ServiceState::Suspended,
            || self.hooks.do_suspend(),
        )
    }

    /// Resumes a suspended service, passing through `Starting`.
    /// A no-op unless the state is exactly `Suspended`.
    ///
    /// # Errors
    ///
    /// Returns the `do_resume` error unchanged; the service is then `Failed`.
    pub fn resume(&self) -> anyhow::Result<()> {
        let _guard = self.lock.lock();
        let current = self.state.load();
        if current != ServiceState::Suspended {
            self.skip(LifecycleOperation::Resume, current);
            return Ok(());
        }
        self.transition(
            LifecycleOperation::Resume,
            ServiceState::Starting,
            ServiceState::Started,
            || self.hooks.do_resume(),
        )
    }

    /// Stops the service, then runs `do_shutdown`. A no-op once shutting down
    /// or shut down.
    ///
    /// A failed stop skips `do_shutdown`.
    ///
    /// # Errors
    ///
    /// Returns the `do_stop` or `do_shutdown` error unchanged; the service is
    /// then `Failed`.
    pub fn shutdown(&self) -> anyhow::Result<()> {
        let _guard = self.lock.lock();
        let current = self.state.load();
        if matches!(current, ServiceState::ShuttingDown | ServiceState::Shutdown) {
            self.skip(LifecycleOperation::Shutdown, current);
            return Ok(());
        }
        self.stop_locked()?;
        self.transition(
            LifecycleOperation::Shutdown,
            ServiceState::ShuttingDown,
            ServiceState::Shutdown,
            || self.hooks.do_shutdown(),
        )
    }

    #[must_use]
    pub fn state(&self) -> ServiceState {
        self.state.load()
    }

    #[must_use]
    pub fn status(&self) -> ServiceStatus {
        self.state.load().status()
    }

    #[must_use]
    pub fn is_started(&self) -> bool {
        self.state.load().is_started()
    }

    #[must_use]
    pub fn is_starting(&self) -> bool {
        self.state.load().is_starting()
    }

    #[must_use]
    pub fn is_stopping(&self) -> bool {
        self.state.load().is_stopping()
    }

    /// True when stopped, shutting down, shut down, or failed.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.state.load().is_stopped()
    }

    #[must_use]
    pub fn is_suspending(&self) -> bool {
        self.state.load().is_suspending()
    }

    #[must_use]
    pub fn is_suspended(&self) -> bool {
        self.state.load().is_suspended()
    }

    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.state.load().is_shutdown()
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.state.load().is_failed()
    }

    #[must_use]
    pub fn is_run_allowed(&self) -> bool {
        self.state.load().is_run_allowed()
    }

    #[must_use]
    pub fn is_stopping_or_stopped(&self) -> bool {
        self.state.load().is_stopping_or_stopped()
    }

    #[must_use]
    pub fn is_suspending_or_suspended(&self) -> bool {
        self.state.load().is_suspending_or_suspended()
    }

    #[must_use]
    pub fn is_starting_or_started(&self) -> bool {
        self.state.load().is_starting_or_started()
    }

    /// Stop protocol; the caller must hold `self.lock`.
    fn stop_locked(&self) -> anyhow::Result<()> {
        let current = self.state.load();
        if matches!(
            current,
            ServiceState::Stopping
                | ServiceState::Stopped
                | ServiceState::ShuttingDown
                | ServiceState::Shutdown
        ) {
            self.skip(LifecycleOperation::Stop, current);
            return Ok(());
        }
        self.transition(
            LifecycleOperation::Stop,
            ServiceState::Stopping,
            ServiceState::Stopped,
            || self.hooks.do_stop(),
        )
    }

    /// Enters `during`, runs the hook, then lands on `after` or `Failed`.
    /// The caller must hold `self.lock`.
    fn transition(
        &self,
        operation: LifecycleOperation,
        during: ServiceState,
        after: ServiceState,
        hook: impl FnOnce() -> anyhow::Result<()>,
    ) -> anyhow::Result<()> {
        let from = self.state.load();
        self.state.store(during);
        debug!(service = %self.name, %operation, %from, to = %during, "lifecycle transition");

        match hook() {
            Ok(()) => {
                self.state.store(after);
                debug!(service = %self.name, %operation, from = %during, to = %after, "lifecycle transition");
                Ok(())
            }
            Err(err) => {
                self.state.store(ServiceState::Failed);
                warn!(service = %self.name, %operation, error = %err, "lifecycle hook failed");
                Err(err)
            }
        }
    }

    fn skip(&self, operation: LifecycleOperation, state: ServiceState) {
        trace!(service = %self.name, %operation, %state, "lifecycle operation is a no-op");
    }
}

impl<H: ServiceHooks> StatefulService for ServiceSupport<H> {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&self) -> anyhow::Result<()> {
        ServiceSupport::start(self)
    }

    fn stop(&self) -> anyhow::Result<()> {
        ServiceSupport::stop(self)
    }

    fn suspend(&self) -> anyhow::Result<()> {
        ServiceSupport::suspend(self)
    }

    fn resume(&self) -> anyhow::Result<()> {
        ServiceSupport::resume(self)
    }

    fn shutdown(&self) -> anyhow::Result<()> {
        ServiceSupport::shutdown(self)
    }

    fn state(&self) -> ServiceState {
        self.state.load()
    }

    fn is_suspendable(&self) -> bool {
        self.hooks.is_suspendable()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
