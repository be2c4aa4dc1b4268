//! Lifecycle Core — service states, lifecycle hooks, and the thread-safe
//! start/stop/suspend/resume/shutdown state machine.

pub mod helper;
pub mod state;
pub mod support;
pub mod traits;

pub use helper::{
    resume_service, start_services, stop_and_shutdown_services, stop_services, suspend_service,
};
pub use state::{
    AtomicServiceState, InvalidServiceState, LifecycleOperation, ServiceState, ServiceStatus,
};
pub use support::ServiceSupport;
pub use traits::{ServiceHooks, StatefulService};

#[cfg(test)]
mod tests {
    #[test]
    fn crate_loads() {
        // Empty body: if this test runs, the crate compiles and loads.
    }
}
