use std::convert::Infallible;
use std::error::Error as StdError;
use std::fmt::{self, Debug};
use std::sync::Arc;

use thiserror::Error;

/// Marker trait for errors returned by service hooks.
///
/// The two classification methods tell the lifecycle how to treat a failure:
/// a cancellation error raised while the run's token is cancelled is an
/// orderly exit, and a critical error bypasses all lifecycle bookkeeping.
pub trait ServiceError: Debug + StdError + Send + Sync + 'static {
    /// Whether this error reports that the hook gave up because its
    /// cancellation token fired.
    fn is_cancellation(&self) -> bool {
        false
    }

    /// Whether this error means the process can no longer be trusted.
    fn is_critical(&self) -> bool {
        false
    }
}

impl ServiceError for Infallible {}

/// Errors surfaced by a lifecycle.
#[derive(Debug, Error)]
pub enum Error<E: ServiceError> {
    /// The lifecycle was already started, stopped or run.
    #[error("lifecycle has already been started")]
    AlreadyStarted,

    /// The lifecycle has been disposed.
    #[error("lifecycle has been disposed")]
    Disposed,

    /// The setup hook failed.
    #[error("setup failed: {0}")]
    Setup(#[source] Arc<E>),

    /// The execute hook failed.
    #[error("execute failed: {0}")]
    Execute(#[source] Arc<E>),

    /// The teardown hook failed.
    #[error("teardown failed: {0}")]
    Teardown(#[source] Arc<E>),

    /// Both execute and teardown failed.
    #[error(transparent)]
    Aggregate(AggregateError<E>),

    /// A hook raised a critical error. No lifecycle bookkeeping happened.
    #[error("critical failure: {0}")]
    Critical(#[source] Arc<E>),
}

impl<E: ServiceError> Clone for Error<E> {
    fn clone(&self) -> Self {
        match self {
            Self::AlreadyStarted => Self::AlreadyStarted,
            Self::Disposed => Self::Disposed,
            Self::Setup(e) => Self::Setup(e.clone()),
            Self::Execute(e) => Self::Execute(e.clone()),
            Self::Teardown(e) => Self::Teardown(e.clone()),
            Self::Aggregate(e) => Self::Aggregate(e.clone()),
            Self::Critical(e) => Self::Critical(e.clone()),
        }
    }
}

impl<E: ServiceError> Error<E> {
    /// Returns the hook error behind this error, if there is exactly one.
    #[must_use]
    pub fn service_error(&self) -> Option<&E> {
        match self {
            Self::Setup(e) | Self::Execute(e) | Self::Teardown(e) | Self::Critical(e) => Some(e),
            Self::AlreadyStarted | Self::Disposed | Self::Aggregate(_) => None,
        }
    }

    /// Whether this error reports a misuse of the lifecycle API.
    #[must_use]
    pub const fn is_usage_error(&self) -> bool {
        matches!(self, Self::AlreadyStarted | Self::Disposed)
    }
}

/// Several hook errors, in the order they were raised.
pub struct AggregateError<E> {
    errors: Vec<Arc<E>>,
}

impl<E> AggregateError<E> {
    pub(crate) fn new(errors: Vec<Arc<E>>) -> Self {
        Self { errors }
    }

    /// The collected errors, oldest first.
    #[must_use]
    pub fn errors(&self) -> &[Arc<E>] {
        &self.errors
    }

    /// Number of collected errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Whether no errors were collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl<E> Clone for AggregateError<E> {
    fn clone(&self) -> Self {
        Self {
            errors: self.errors.clone(),
        }
    }
}

impl<E: Debug> Debug for AggregateError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.errors.iter()).finish()
    }
}

impl<E: fmt::Display> fmt::Display for AggregateError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} errors occurred", self.errors.len())?;
        for (i, e) in self.errors.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{e}")?;
        }
        Ok(())
    }
}

impl<E: StdError + 'static> StdError for AggregateError<E> {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.errors.first().map(|e| &**e as &(dyn StdError + 'static))
    }
}
