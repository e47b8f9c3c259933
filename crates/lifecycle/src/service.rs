use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::ServiceError;

/// A long-running service driven by a [`Lifecycle`](crate::Lifecycle).
///
/// The lifecycle calls `setup`, then `execute`, then `teardown`, and
/// `release_resources` once when it is disposed. Only `execute` is required.
#[async_trait]
pub trait AsyncService
where
    Self: Send + Sync + 'static,
{
    /// Error returned by the hooks.
    type Error: ServiceError;

    /// Name used in log events.
    fn name(&self) -> &str;

    /// Prepares the service. Returning `Ok(false)` aborts the run without
    /// executing or tearing down.
    ///
    /// `token` fires when the caller's token is cancelled or a stop is requested.
    async fn setup(&self, _token: CancellationToken) -> Result<bool, Self::Error> {
        Ok(true)
    }

    /// Does the work. Should return promptly once `token` is cancelled.
    async fn execute(&self, token: CancellationToken) -> Result<(), Self::Error>;

    /// Cleans up after `execute`. Runs whenever setup succeeded, even if
    /// execute failed or was cancelled.
    async fn teardown(&self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Releases resources held by the service. Called once on disposal.
    async fn release_resources(&self) {}
}
