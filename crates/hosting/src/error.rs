use std::time::Duration;

use steward_bootable::BootableError;
use steward_lifecycle::{ServiceError, SetupOutcome};
use thiserror::Error;

/// Errors that can occur in this crate.
#[derive(Debug, Error)]
pub enum Error<E: ServiceError> {
    /// The lifecycle itself failed, or was misused.
    #[error(transparent)]
    Lifecycle(#[from] steward_lifecycle::Error<E>),

    /// The service did not stop before the shutdown deadline.
    #[error("service did not stop within {0:?}")]
    ShutdownTimeout(Duration),

    /// Setup finished without success.
    #[error("service failed to start: setup was {0}")]
    Startup(SetupOutcome),
}

impl<E: ServiceError> BootableError for Error<E> {}
