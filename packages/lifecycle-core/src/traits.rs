//! Trait seams between the lifecycle state machine and the services it drives.

use crate::state::{ServiceState, ServiceStatus};

// ---------------------------------------------------------------------------
// ServiceHooks trait
// ---------------------------------------------------------------------------

/// The work a service performs in each lifecycle phase.
///
/// A [`ServiceSupport`](crate::ServiceSupport) calls these hooks while holding
/// its lifecycle lock and records the resulting state. Any error a hook returns
/// moves the service to `Failed` and is handed back to the caller as-is.
///
/// Hooks take `&self`; state the hook needs to change lives behind the
/// implementor's own interior mutability. Hooks must not call lifecycle
/// operations on the service that owns them: the lock is not reentrant.
pub trait ServiceHooks: Send + Sync {
    /// Acquire resources and begin work.
    ///
    /// # Errors
    ///
    /// Any error leaves the service `Failed`.
    fn do_start(&self) -> anyhow::Result<()>;

    /// Release resources.
    ///
    /// Also runs on services that were never started, since `shutdown()` always
    /// stops first. Implementations must tolerate that.
    ///
    /// # Errors
    ///
    /// Any error leaves the service `Failed`.
    fn do_stop(&self) -> anyhow::Result<()>;

    /// Pause without releasing resources. Default is a no-op.
    ///
    /// # Errors
    ///
    /// Any error leaves the service `Failed`.
    fn do_suspend(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Continue after `do_suspend`. Default is a no-op.
    ///
    /// # Errors
    ///
    /// Any error leaves the service `Failed`.
    fn do_resume(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Final cleanup after `do_stop`. Default is a no-op.
    ///
    /// # Errors
    ///
    /// Any error leaves the service `Failed`.
    fn do_shutdown(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Whether `do_suspend` really pauses the service. Group helpers stop
    /// services that return `false` instead of suspending them.
    fn is_suspendable(&self) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// StatefulService trait
// ---------------------------------------------------------------------------

/// Object-safe view of a lifecycle-managed service.
///
/// Lets heterogeneous services be held as `&dyn StatefulService` or
/// `Arc<dyn StatefulService>` and driven together.
pub trait StatefulService: Send + Sync {
    /// Name used in logs and reports.
    fn name(&self) -> &str;

    /// # Errors
    ///
    /// Returns the error of the failing hook.
    fn start(&self) -> anyhow::Result<()>;

    /// # Errors
    ///
    /// Returns the error of the failing hook.
    fn stop(&self) -> anyhow::Result<()>;

    /// # Errors
    ///
    /// Returns the error of the failing hook.
    fn suspend(&self) -> anyhow::Result<()>;

    /// # Errors
    ///
    /// Returns the error of the failing hook.
    fn resume(&self) -> anyhow::Result<()>;

    /// # Errors
    ///
    /// Returns the error of the failing hook.
    fn shutdown(&self) -> anyhow::Result<()>;

    fn state(&self) -> ServiceState;

    fn status(&self) -> ServiceStatus {
        self.state().status()
    }

    fn is_suspendable(&self) -> bool;
}
