//! Lifecycle states, externally visible statuses, and the atomic state cell.
//!
//! A service holds exactly one [`ServiceState`] at a time. The state lives in an
//! [`AtomicServiceState`] so that queries never take the service lock; writes
//! happen only while the owning service holds its lock, so readers observe
//! whole values with last-writer-wins semantics.
//!
//! ```text
//! New ──start──> Starting ──> Started ──suspend──> Suspending ──> Suspended
//!                   ^            │                                   │
//!                   └────────────┼───────────────resume──────────────┘
//!                                └──stop──> Stopping ──> Stopped
//!                                  shutdown: stop, then ShuttingDown ──> Shutdown
//!                                  any hook error ──> Failed
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ServiceState
// ---------------------------------------------------------------------------

/// Internal lifecycle state of a service instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ServiceState {
    /// Constructed, never started. Only ever the initial state.
    #[default]
    New = 0,
    /// `do_start` (or `do_resume`) is running.
    Starting = 1,
    /// Running.
    Started = 2,
    /// `do_suspend` is running.
    Suspending = 3,
    /// Paused without a full stop.
    Suspended = 4,
    /// `do_stop` is running.
    Stopping = 5,
    /// Stopped; may be started again.
    Stopped = 6,
    /// `do_shutdown` is running.
    ShuttingDown = 7,
    /// Shut down for good.
    Shutdown = 8,
    /// A hook failed. A later `start()` may still recover the service.
    Failed = 9,
}

impl ServiceState {
    #[must_use]
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Stable lowercase name, identical to the serde representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Starting => "starting",
            Self::Started => "started",
            Self::Suspending => "suspending",
            Self::Suspended => "suspended",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
            Self::ShuttingDown => "shutting_down",
            Self::Shutdown => "shutdown",
            Self::Failed => "failed",
        }
    }

    /// Collapses the ten internal states into the six external statuses.
    #[must_use]
    pub fn status(self) -> ServiceStatus {
        match self {
            Self::Starting => ServiceStatus::Starting,
            Self::Started => ServiceStatus::Started,
            Self::Suspending => ServiceStatus::Suspending,
            Self::Suspended => ServiceStatus::Suspended,
            Self::Stopping => ServiceStatus::Stopping,
            Self::New | Self::Stopped | Self::ShuttingDown | Self::Shutdown | Self::Failed => {
                ServiceStatus::Stopped
            }
        }
    }

    #[must_use]
    pub fn is_new(self) -> bool {
        self == Self::New
    }

    #[must_use]
    pub fn is_starting(self) -> bool {
        self == Self::Starting
    }

    #[must_use]
    pub fn is_started(self) -> bool {
        self == Self::Started
    }

    #[must_use]
    pub fn is_suspending(self) -> bool {
        self == Self::Suspending
    }

    #[must_use]
    pub fn is_suspended(self) -> bool {
        self == Self::Suspended
    }

    #[must_use]
    pub fn is_stopping(self) -> bool {
        self == Self::Stopping
    }

    /// True for `Stopped`, `ShuttingDown`, `Shutdown`, and also `Failed`.
    #[must_use]
    pub fn is_stopped(self) -> bool {
        matches!(
            self,
            Self::Stopped | Self::ShuttingDown | Self::Shutdown | Self::Failed
        )
    }

    #[must_use]
    pub fn is_shutdown(self) -> bool {
        self == Self::Shutdown
    }

    #[must_use]
    pub fn is_failed(self) -> bool {
        self == Self::Failed
    }

    /// True while the service is starting, started, suspending, or suspended.
    #[must_use]
    pub fn is_run_allowed(self) -> bool {
        self.is_starting_or_started() || self.is_suspending_or_suspended()
    }

    #[must_use]
    pub fn is_stopping_or_stopped(self) -> bool {
        self.is_stopping() || self.is_stopped()
    }

    #[must_use]
    pub fn is_suspending_or_suspended(self) -> bool {
        self.is_suspending() || self.is_suspended()
    }

    #[must_use]
    pub fn is_starting_or_started(self) -> bool {
        self.is_starting() || self.is_started()
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A byte that no [`ServiceState`] encodes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unexpected service state value: {0}")]
pub struct InvalidServiceState(pub u8);

impl TryFrom<u8> for ServiceState {
    type Error = InvalidServiceState;

    /// Decodes a discriminant written by [`ServiceState::as_u8`].
    fn try_from(val: u8) -> Result<Self, Self::Error> {
        Ok(match val {
            0 => Self::New,
            1 => Self::Starting,
            2 => Self::Started,
            3 => Self::Suspending,
            4 => Self::Suspended,
            5 => Self::Stopping,
            6 => Self::Stopped,
            7 => Self::ShuttingDown,
            8 => Self::Shutdown,
            9 => Self::Failed,
            _ => return Err(InvalidServiceState(val)),
        })
    }
}

// ---------------------------------------------------------------------------
// ServiceStatus
// ---------------------------------------------------------------------------

/// Externally reported status of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceStatus {
    Starting,
    Started,
    Suspending,
    Suspended,
    Stopping,
    Stopped,
}

impl ServiceStatus {
    #[must_use]
    pub fn is_starting(self) -> bool {
        self == Self::Starting
    }

    #[must_use]
    pub fn is_started(self) -> bool {
        self == Self::Started
    }

    #[must_use]
    pub fn is_suspending(self) -> bool {
        self == Self::Suspending
    }

    #[must_use]
    pub fn is_suspended(self) -> bool {
        self == Self::Suspended
    }

    #[must_use]
    pub fn is_stopping(self) -> bool {
        self == Self::Stopping
    }

    #[must_use]
    pub fn is_stopped(self) -> bool {
        self == Self::Stopped
    }

    /// A stopped or suspended service can be (re)started.
    #[must_use]
    pub fn is_startable(self) -> bool {
        matches!(self, Self::Stopped | Self::Suspended)
    }

    /// A started or suspended service can be stopped.
    #[must_use]
    pub fn is_stoppable(self) -> bool {
        matches!(self, Self::Started | Self::Suspended)
    }

    /// Only a started service can be suspended.
    #[must_use]
    pub fn is_suspendable(self) -> bool {
        self == Self::Started
    }
}

impl From<ServiceState> for ServiceStatus {
    fn from(state: ServiceState) -> Self {
        state.status()
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Starting => "Starting",
            Self::Started => "Started",
            Self::Suspending => "Suspending",
            Self::Suspended => "Suspended",
            Self::Stopping => "Stopping",
            Self::Stopped => "Stopped",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// LifecycleOperation
// ---------------------------------------------------------------------------

/// The public lifecycle operations, used for log fields and error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleOperation {
    Start,
    Stop,
    Suspend,
    Resume,
    Shutdown,
}

impl LifecycleOperation {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Suspend => "suspend",
            Self::Resume => "resume",
            Self::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for LifecycleOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// AtomicServiceState
// ---------------------------------------------------------------------------

/// Single-word atomic cell holding a [`ServiceState`].
///
/// Loads are lock-free. Stores are expected to come from the owner while it
/// holds its lifecycle lock, so there is no compare-and-swap here.
#[derive(Debug)]
pub struct AtomicServiceState {
    atomic: AtomicU8,
}

impl AtomicServiceState {
    #[must_use]
    pub fn new(state: ServiceState) -> Self {
        Self {
            atomic: AtomicU8::new(state.as_u8()),
        }
    }

    /// # Panics
    ///
    /// Never in practice: the cell only ever holds bytes written by `new` or
    /// `store`, which are valid encodings.
    #[must_use]
    pub fn load(&self) -> ServiceState {
        let raw = self.atomic.load(Ordering::Acquire);
        match ServiceState::try_from(raw) {
            Ok(state) => state,
            Err(err) => panic!("{err}"),
        }
    }

    pub fn store(&self, state: ServiceState) {
        self.atomic.store(state.as_u8(), Ordering::Release);
    }
}

impl Default for AtomicServiceState {
    fn default() -> Self {
        Self::new(ServiceState::New)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
