//! Lifecycle states and phase outcomes.

use std::fmt;

/// Where a lifecycle currently is.
///
/// The variants are declared in lifecycle order, so comparisons such as
/// `state < LifecycleState::Running` read as "not yet accepting work".
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LifecycleState {
    /// Constructed, never started.
    Created,

    /// Setup is in progress.
    Starting,

    /// Setup succeeded and the service is executing.
    Running,

    /// Execution ended and teardown is in progress.
    Stopping,

    /// All phases have finished.
    Stopped,

    /// Disposed. Terminal.
    Disposed,
}

impl LifecycleState {
    /// Returns `true` once setup has succeeded and until execution ends.
    #[must_use]
    pub const fn is_accepting_work(self) -> bool {
        matches!(self, Self::Running)
    }

    /// Returns `true` if no further transitions can happen except disposal.
    #[must_use]
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Stopped | Self::Disposed)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
            Self::Disposed => "disposed",
        };
        f.write_str(s)
    }
}

/// How the setup phase ended. Resolved exactly once per lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SetupOutcome {
    /// Setup reported success and execution began.
    Successful,

    /// The lifecycle was stopped or disposed before it was started.
    NotStarted,

    /// Setup returned `false`.
    Unsuccessful,

    /// Setup observed cancellation, or cancellation was already requested.
    Canceled,

    /// Setup returned an error.
    Faulted,
}

impl SetupOutcome {
    /// Returns `true` for [`SetupOutcome::Successful`].
    #[must_use]
    pub const fn is_successful(self) -> bool {
        matches!(self, Self::Successful)
    }
}

impl fmt::Display for SetupOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Successful => "successful",
            Self::NotStarted => "not started",
            Self::Unsuccessful => "unsuccessful",
            Self::Canceled => "canceled",
            Self::Faulted => "faulted",
        };
        f.write_str(s)
    }
}

/// What a call to `request_stop` did.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StopRequest {
    /// The lifecycle had not been started; it went straight to stopped.
    NotStarted,

    /// The stop signal was raised for a starting or running lifecycle.
    Signaled,

    /// A stop had already been signaled, or teardown is under way.
    AlreadyStopping,

    /// The lifecycle is already stopped or disposed.
    NothingToStop,
}
