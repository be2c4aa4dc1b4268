//! Helpers for driving several services at once.
//!
//! Composite services that own children call these from their own hooks, for
//! example starting children in `do_start` and shutting them down in
//! `do_shutdown`.

use tracing::warn;

use crate::state::{LifecycleOperation, ServiceState};
use crate::traits::StatefulService;

/// Starts each service in slice order, stopping at the first failure.
///
/// # Errors
///
/// Returns the error of the first service that fails to start. Services after
/// it are left untouched.
pub fn start_services(services: &[&dyn StatefulService]) -> anyhow::Result<()> {
    for service in services {
        service.start()?;
    }
    Ok(())
}

/// Stops every service in slice order, even when some fail.
///
/// # Errors
///
/// Returns the first failure after all services have been visited. Later
/// failures are logged.
pub fn stop_services(services: &[&dyn StatefulService]) -> anyhow::Result<()> {
    visit_all(services, LifecycleOperation::Stop, |s| s.stop())
}

/// Stops and shuts down every service in slice order, even when some fail.
///
/// # Errors
///
/// Returns the first failure after all services have been visited. Later
/// failures are logged.
pub fn stop_and_shutdown_services(services: &[&dyn StatefulService]) -> anyhow::Result<()> {
    visit_all(services, LifecycleOperation::Shutdown, |s| s.shutdown())
}

/// Suspends the service if it supports suspension, otherwise stops it.
///
/// Returns `true` only when this call moved the service to `Suspended`. An
/// already suspended service, or one that was not started, yields `false`, as
/// does a service that was stopped instead.
///
/// # Errors
///
/// Returns the `suspend` or `stop` error.
pub fn suspend_service(service: &dyn StatefulService) -> anyhow::Result<bool> {
    if service.is_suspendable() {
        let was_suspended = service.state().is_suspended();
        service.suspend()?;
        Ok(!was_suspended && service.state().is_suspended())
    } else {
        service.stop()?;
        Ok(false)
    }
}

/// Counterpart of [`suspend_service`].
///
/// A suspendable service is resumed if it is currently suspended, returning
/// `true`; otherwise nothing happens and `false` is returned. A service that
/// cannot suspend is started instead, returning `false`.
///
/// # Errors
///
/// Returns the `resume` or `start` error.
pub fn resume_service(service: &dyn StatefulService) -> anyhow::Result<bool> {
    if service.is_suspendable() {
        if service.state() == ServiceState::Suspended {
            service.resume()?;
            return Ok(true);
        }
        Ok(false)
    } else {
        service.start()?;
        Ok(false)
    }
}

fn visit_all(
    services: &[&dyn StatefulService],
    operation: LifecycleOperation,
    op: impl Fn(&dyn StatefulService) -> anyhow::Result<()>,
) -> anyhow::Result<()> {
    let mut first_error = None;
    for service in services {
        if let Err(err) = op(*service) {
            if first_error.is_none() {
                first_error = Some(err);
            } else {
                warn!(service = service.name(), %operation, error = %err, "ignoring additional failure");
            }
        }
    }
    first_error.map_or(Ok(()), Err)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;
    use crate::state::ServiceStatus;
    use crate::traits::ServiceHooks;
    use crate::ServiceSupport;

    /// Hooks that append `<phase>:<name>` to a shared log.
    struct LoggingHooks {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        fail_start: bool,
        fail_stop: bool,
        suspendable: bool,
    }

    impl LoggingHooks {
        fn push(&self, phase: &str) {
            self.log.lock().push(format!("{phase}:{}", self.name));
        }
    }

    impl ServiceHooks for LoggingHooks {
        fn do_start(&self) -> anyhow::Result<()> {
            self.push("start");
            if self.fail_start {
                anyhow::bail!("{} refused to start", self.name);
            }
            Ok(())
        }

        fn do_stop(&self) -> anyhow::Result<()> {
            self.push("stop");
            if self.fail_stop {
                anyhow::bail!("{} refused to stop", self.name);
            }
            Ok(())
        }

        fn do_suspend(&self) -> anyhow::Result<()> {
            self.push("suspend");
            Ok(())
        }

        fn do_resume(&self) -> anyhow::Result<()> {
            self.push("resume");
            Ok(())
        }

        fn do_shutdown(&self) -> anyhow::Result<()> {
            self.push("shutdown");
            Ok(())
        }

        fn is_suspendable(&self) -> bool {
            self.suspendable
        }
    }

    fn hooks(name: &'static str, log: &Arc<Mutex<Vec<String>>>) -> LoggingHooks {
        LoggingHooks {
            name,
            log: Arc::clone(log),
            fail_start: false,
            fail_stop: false,
            suspendable: false,
        }
    }

    fn make(name: &'static str, log: &Arc<Mutex<Vec<String>>>) -> ServiceSupport<LoggingHooks> {
        ServiceSupport::new(name, hooks(name, log))
    }

    #[test]
    fn start_services_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let a = make("a", &log);
        let b = make("b", &log);

        start_services(&[&a, &b]).unwrap();
        assert_eq!(*log.lock(), vec!["start:a", "start:b"]);
        assert!(a.is_started() && b.is_started());
    }

    #[test]
    fn start_services_stops_at_first_failure() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let a = make("a", &log);
        let b = ServiceSupport::new(
            "b",
            LoggingHooks {
                fail_start: true,
                ..hooks("b", &log)
            },
        );
        let c = make("c", &log);

        let err = start_services(&[&a, &b, &c]).unwrap_err();
        assert_eq!(err.to_string(), "b refused to start");
        assert_eq!(*log.lock(), vec!["start:a", "start:b"]);
        assert!(a.is_started());
        assert!(b.is_failed());
        assert_eq!(c.state(), ServiceState::New);
    }

    #[test]
    fn stop_services_visits_all_and_returns_first_error() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let failing = |name: &'static str| {
            ServiceSupport::new(
                name,
                LoggingHooks {
                    fail_stop: true,
                    ..hooks(name, &log)
                },
            )
        };
        let a = failing("a");
        let b = make("b", &log);
        let c = failing("c");

        let err = stop_services(&[&a, &b, &c]).unwrap_err();
        assert_eq!(err.to_string(), "a refused to stop");
        assert_eq!(*log.lock(), vec!["stop:a", "stop:b", "stop:c"]);
        assert!(a.is_failed());
        assert_eq!(b.state(), ServiceState::Stopped);
        assert!(c.is_failed());
    }

    #[test]
    fn stop_and_shutdown_services_runs_both_hooks() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let a = make("a", &log);
        let b = make("b", &log);
        start_services(&[&a, &b]).unwrap();
        log.lock().clear();

        stop_and_shutdown_services(&[&b, &a]).unwrap();
        assert_eq!(
            *log.lock(),
            vec!["stop:b", "shutdown:b", "stop:a", "shutdown:a"]
        );
        assert!(a.is_shutdown() && b.is_shutdown());
    }

    #[test]
    fn suspend_service_falls_back_to_stop() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let plain = make("plain", &log);
        plain.start().unwrap();

        assert!(!suspend_service(&plain).unwrap());
        assert_eq!(plain.status(), ServiceStatus::Stopped);

        assert!(!resume_service(&plain).unwrap());
        assert_eq!(plain.status(), ServiceStatus::Started);
        assert_eq!(*log.lock(), vec!["start:plain", "stop:plain", "start:plain"]);
    }

    #[test]
    fn suspendable_service_is_suspended_and_resumed() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let svc = ServiceSupport::new(
            "pausable",
            LoggingHooks {
                suspendable: true,
                ..hooks("pausable", &log)
            },
        );
        svc.start().unwrap();

        assert!(suspend_service(&svc).unwrap());
        assert_eq!(svc.status(), ServiceStatus::Suspended);

        assert!(resume_service(&svc).unwrap());
        assert_eq!(svc.status(), ServiceStatus::Started);

        // Not suspended anymore: nothing to resume.
        assert!(!resume_service(&svc).unwrap());
        assert_eq!(
            *log.lock(),
            vec!["start:pausable", "suspend:pausable", "resume:pausable"]
        );
    }

    #[test]
    fn suspend_service_reports_false_when_nothing_was_suspended() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pausable = |name: &'static str| {
            ServiceSupport::new(
                name,
                LoggingHooks {
                    suspendable: true,
                    ..hooks(name, &log)
                },
            )
        };

        let running = pausable("running");
        running.start().unwrap();
        assert!(suspend_service(&running).unwrap());
        assert!(!suspend_service(&running).unwrap());
        assert_eq!(running.state(), ServiceState::Suspended);

        let fresh = pausable("fresh");
        assert!(!suspend_service(&fresh).unwrap());
        assert_eq!(fresh.state(), ServiceState::New);

        let stopped = pausable("stopped");
        stopped.start().unwrap();
        stopped.stop().unwrap();
        assert!(!suspend_service(&stopped).unwrap());
        assert_eq!(stopped.state(), ServiceState::Stopped);

        assert_eq!(
            *log.lock(),
            vec![
                "start:running",
                "suspend:running",
                "start:stopped",
                "stop:stopped",
            ]
        );
    }

    #[test]
    fn stop_and_shutdown_services_visits_all_and_returns_first_error() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let failing = |name: &'static str| {
            ServiceSupport::new(
                name,
                LoggingHooks {
                    fail_stop: true,
                    ..hooks(name, &log)
                },
            )
        };
        let a = failing("a");
        let b = make("b", &log);
        let c = failing("c");
        start_services(&[&a, &b, &c]).unwrap();
        log.lock().clear();

        let err = stop_and_shutdown_services(&[&a, &b, &c]).unwrap_err();
        assert_eq!(err.to_string(), "a refused to stop");
        // A failed stop skips `do_shutdown` for that service only.
        assert_eq!(
            *log.lock(),
            vec!["stop:a", "stop:b", "shutdown:b", "stop:c"]
        );
        assert!(a.is_failed());
        assert!(b.is_shutdown());
        assert!(c.is_failed());
    }
}
